//! Checkpoint configuration.

use serde::{Deserialize, Serialize};
use spoke_core::CheckpointOptions;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{CheckpointingMode, ExternalizedCheckpointRetention};

/// Interval value meaning "checkpointing disabled".
pub const DISABLED_INTERVAL: i64 = -1;
/// Default time a checkpoint may take before it is discarded (10 minutes).
pub const DEFAULT_TIMEOUT_MS: u64 = 600_000;
/// Default minimal pause between two checkpoints.
pub const DEFAULT_MIN_PAUSE_MS: u64 = 0;
/// Default number of checkpoints that may be in flight at once.
pub const DEFAULT_MAX_CONCURRENT_CHECKPOINTS: u32 = 1;
/// Checkpoint id value meaning "restore in-flight data as usual".
pub const NO_IGNORED_IN_FLIGHT_DATA: i64 = -1;

/// Configuration for checkpoint behavior of one job.
///
/// Every mutator validates against the settings already held, so the
/// following always hold:
/// - checkpointing is enabled iff the interval is positive
/// - unaligned checkpoints are only enabled in exactly-once mode
/// - at least one checkpoint may be in flight
/// - approximate local recovery and unaligned checkpoints are never both on
///
/// A rejected call returns [`Error::InvalidConfiguration`] and leaves the
/// configuration unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCheckpointConfig", into = "RawCheckpointConfig")]
pub struct CheckpointConfig {
    interval_ms: i64,
    mode: CheckpointingMode,
    timeout_ms: u64,
    min_pause_ms: u64,
    max_concurrent: u32,
    fail_on_checkpointing_errors: bool,
    tolerable_failure_number: u32,
    externalized_retention: ExternalizedCheckpointRetention,
    unaligned: bool,
    force_unaligned: bool,
    alignment_timeout: Duration,
    approximate_local_recovery: bool,
    checkpoint_id_of_ignored_in_flight_data: i64,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            interval_ms: DISABLED_INTERVAL,
            mode: CheckpointingMode::ExactlyOnce,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            min_pause_ms: DEFAULT_MIN_PAUSE_MS,
            max_concurrent: DEFAULT_MAX_CONCURRENT_CHECKPOINTS,
            fail_on_checkpointing_errors: true,
            tolerable_failure_number: 0,
            externalized_retention: ExternalizedCheckpointRetention::NoExternalizedCheckpoints,
            unaligned: false,
            force_unaligned: false,
            alignment_timeout: Duration::ZERO,
            approximate_local_recovery: false,
            checkpoint_id_of_ignored_in_flight_data: NO_IGNORED_IN_FLIGHT_DATA,
        }
    }
}

impl CheckpointConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Interval
    // ------------------------------------------------------------------

    /// Whether periodic checkpoints are triggered at all.
    pub fn is_checkpointing_enabled(&self) -> bool {
        self.interval_ms > 0
    }

    /// Interval between checkpoints in milliseconds, or `-1` when disabled.
    pub fn checkpoint_interval(&self) -> i64 {
        self.interval_ms
    }

    /// Set the checkpoint interval. This enables checkpointing.
    pub fn set_checkpoint_interval(&mut self, interval_ms: i64) -> Result<&mut Self> {
        if interval_ms <= 0 {
            return Err(Error::invalid(
                "interval",
                format!("checkpoint interval must be positive, got {interval_ms} ms"),
            ));
        }
        self.interval_ms = interval_ms;
        debug!(interval_ms, "Checkpointing enabled");
        self.warn_if_pause_exceeds_interval();
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Mode
    // ------------------------------------------------------------------

    pub fn checkpointing_mode(&self) -> CheckpointingMode {
        self.mode
    }

    /// Set the processing guarantee.
    ///
    /// Switching to at-least-once is rejected while unaligned checkpoints
    /// are enabled; disable them first.
    pub fn set_checkpointing_mode(&mut self, mode: CheckpointingMode) -> Result<&mut Self> {
        if mode != CheckpointingMode::ExactlyOnce && self.unaligned {
            return Err(Error::invalid(
                "mode",
                format!("unaligned checkpoints are enabled and require EXACTLY_ONCE, got {mode}"),
            ));
        }
        self.mode = mode;
        debug!(%mode, "Checkpointing mode set");
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Timeout / pause / concurrency
    // ------------------------------------------------------------------

    /// Maximum time a checkpoint may take before it is discarded, in milliseconds.
    pub fn checkpoint_timeout(&self) -> u64 {
        self.timeout_ms
    }

    pub fn set_checkpoint_timeout(&mut self, timeout_ms: u64) -> Result<&mut Self> {
        if timeout_ms == 0 {
            return Err(Error::invalid("timeout", "checkpoint timeout must be positive"));
        }
        self.timeout_ms = timeout_ms;
        Ok(self)
    }

    /// Minimal pause between the end of one checkpoint and the start of the next, in milliseconds.
    pub fn min_pause_between_checkpoints(&self) -> u64 {
        self.min_pause_ms
    }

    /// Set the minimal pause. A pause longer than the interval is accepted;
    /// the effective interval then stretches to the pause.
    pub fn set_min_pause_between_checkpoints(&mut self, min_pause_ms: u64) -> &mut Self {
        self.min_pause_ms = min_pause_ms;
        self.warn_if_pause_exceeds_interval();
        self
    }

    pub fn max_concurrent_checkpoints(&self) -> u32 {
        self.max_concurrent
    }

    pub fn set_max_concurrent_checkpoints(&mut self, max_concurrent: u32) -> Result<&mut Self> {
        if max_concurrent < 1 {
            return Err(Error::invalid(
                "max-concurrent-checkpoints",
                format!("at least one concurrent checkpoint is required, got {max_concurrent}"),
            ));
        }
        self.max_concurrent = max_concurrent;
        if max_concurrent > 1 && self.min_pause_ms > 0 {
            debug!(
                max_concurrent,
                min_pause_ms = self.min_pause_ms,
                "Min pause prevents checkpoints from overlapping"
            );
        }
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Failure tolerance
    // ------------------------------------------------------------------

    pub fn is_fail_on_checkpointing_errors(&self) -> bool {
        self.fail_on_checkpointing_errors
    }

    pub fn set_fail_on_checkpointing_errors(&mut self, fail: bool) -> &mut Self {
        self.fail_on_checkpointing_errors = fail;
        self
    }

    /// Stored number of consecutive checkpoint failures tolerated.
    ///
    /// See [`effective_tolerable_failure_number`](Self::effective_tolerable_failure_number)
    /// for the value the execution engine acts on.
    pub fn tolerable_checkpoint_failure_number(&self) -> u32 {
        self.tolerable_failure_number
    }

    pub fn set_tolerable_checkpoint_failure_number(&mut self, number: u32) -> &mut Self {
        self.tolerable_failure_number = number;
        if number > 0 && self.fail_on_checkpointing_errors {
            debug!(
                number,
                "Tolerable failure number has no effect while fail-on-checkpointing-errors is set"
            );
        }
        self
    }

    /// Number of tolerated failures the execution engine must honour.
    ///
    /// Failing on checkpointing errors is equivalent to tolerating none,
    /// whatever number is stored.
    pub fn effective_tolerable_failure_number(&self) -> u32 {
        if self.fail_on_checkpointing_errors {
            0
        } else {
            self.tolerable_failure_number
        }
    }

    // ------------------------------------------------------------------
    // Externalized checkpoints
    // ------------------------------------------------------------------

    pub fn is_externalized_checkpoints_enabled(&self) -> bool {
        self.externalized_retention.is_externalized()
    }

    pub fn externalized_checkpoint_retention(&self) -> ExternalizedCheckpointRetention {
        self.externalized_retention
    }

    pub fn set_externalized_checkpoint_retention(
        &mut self,
        retention: ExternalizedCheckpointRetention,
    ) -> &mut Self {
        self.externalized_retention = retention;
        debug!(%retention, "Externalized checkpoint retention set");
        self
    }

    // ------------------------------------------------------------------
    // Unaligned checkpoints
    // ------------------------------------------------------------------

    pub fn is_unaligned_checkpoints_enabled(&self) -> bool {
        self.unaligned
    }

    pub fn enable_unaligned_checkpoints(&mut self) -> Result<&mut Self> {
        self.set_unaligned_checkpoints(true)
    }

    pub fn disable_unaligned_checkpoints(&mut self) -> &mut Self {
        self.unaligned = false;
        self
    }

    /// Enable or disable unaligned checkpoints.
    ///
    /// Enabling is rejected in at-least-once mode and while approximate
    /// local recovery is on.
    pub fn set_unaligned_checkpoints(&mut self, enabled: bool) -> Result<&mut Self> {
        if !enabled {
            return Ok(self.disable_unaligned_checkpoints());
        }
        if self.mode != CheckpointingMode::ExactlyOnce {
            return Err(Error::invalid(
                "unaligned",
                format!(
                    "unaligned checkpoints require EXACTLY_ONCE mode, current mode is {}",
                    self.mode
                ),
            ));
        }
        if self.approximate_local_recovery {
            return Err(Error::invalid(
                "unaligned",
                "unaligned checkpoints cannot be combined with approximate local recovery",
            ));
        }
        self.unaligned = true;
        debug!("Unaligned checkpoints enabled");
        Ok(self)
    }

    pub fn is_force_unaligned_checkpoints(&self) -> bool {
        self.force_unaligned
    }

    /// Force unaligned checkpoints on connections where the engine would
    /// otherwise pick aligned ones. Does not enable unaligned checkpoints.
    pub fn set_force_unaligned_checkpoints(&mut self, force: bool) -> &mut Self {
        self.force_unaligned = force;
        self
    }

    /// Time to wait for aligned barriers before switching to unaligned.
    pub fn alignment_timeout(&self) -> Duration {
        self.alignment_timeout
    }

    /// Stored unconditionally; only acted on while unaligned checkpoints are enabled.
    pub fn set_alignment_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.alignment_timeout = timeout;
        self
    }

    // ------------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------------

    pub fn is_approximate_local_recovery_enabled(&self) -> bool {
        self.approximate_local_recovery
    }

    pub fn set_approximate_local_recovery(&mut self, enabled: bool) -> Result<&mut Self> {
        if enabled && self.unaligned {
            return Err(Error::invalid(
                "approximate-local-recovery",
                "approximate local recovery cannot be combined with unaligned checkpoints",
            ));
        }
        self.approximate_local_recovery = enabled;
        Ok(self)
    }

    /// Checkpoint whose in-flight data is skipped on recovery, or `-1`.
    pub fn checkpoint_id_of_ignored_in_flight_data(&self) -> i64 {
        self.checkpoint_id_of_ignored_in_flight_data
    }

    pub fn set_checkpoint_id_of_ignored_in_flight_data(
        &mut self,
        checkpoint_id: i64,
    ) -> Result<&mut Self> {
        if checkpoint_id < NO_IGNORED_IN_FLIGHT_DATA {
            return Err(Error::invalid(
                "recover-without-channel-state.checkpoint-id",
                format!("checkpoint id must be -1 or non-negative, got {checkpoint_id}"),
            ));
        }
        self.checkpoint_id_of_ignored_in_flight_data = checkpoint_id;
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Execution-facing views
    // ------------------------------------------------------------------

    /// Options attached to the barrier of the next checkpoint.
    ///
    /// Savepoints are always aligned.
    pub fn barrier_options(&self, is_savepoint: bool) -> CheckpointOptions {
        let is_unaligned = self.unaligned && !is_savepoint;
        CheckpointOptions {
            is_savepoint,
            is_unaligned,
            alignment_timeout_ms: is_unaligned
                .then(|| u64::try_from(self.alignment_timeout.as_millis()).unwrap_or(u64::MAX)),
        }
    }

    fn warn_if_pause_exceeds_interval(&self) {
        if self.is_checkpointing_enabled()
            && i128::from(self.min_pause_ms) > i128::from(self.interval_ms)
        {
            warn!(
                min_pause_ms = self.min_pause_ms,
                interval_ms = self.interval_ms,
                "Min pause between checkpoints exceeds the checkpoint interval"
            );
        }
    }
}

// ============================================================================
// Serialized form
// ============================================================================

/// Field-for-field mirror of [`CheckpointConfig`] used on the wire.
///
/// Deserialization goes back through the validating setters, so a snapshot
/// that breaks an invariant is rejected instead of loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct RawCheckpointConfig {
    interval_ms: i64,
    mode: CheckpointingMode,
    timeout_ms: u64,
    min_pause_ms: u64,
    max_concurrent_checkpoints: u32,
    fail_on_checkpointing_errors: bool,
    tolerable_failure_number: u32,
    externalized_checkpoint_retention: ExternalizedCheckpointRetention,
    unaligned_checkpoints: bool,
    force_unaligned_checkpoints: bool,
    alignment_timeout: Duration,
    approximate_local_recovery: bool,
    checkpoint_id_of_ignored_in_flight_data: i64,
}

impl Default for RawCheckpointConfig {
    fn default() -> Self {
        CheckpointConfig::default().into()
    }
}

impl From<CheckpointConfig> for RawCheckpointConfig {
    fn from(c: CheckpointConfig) -> Self {
        Self {
            interval_ms: c.interval_ms,
            mode: c.mode,
            timeout_ms: c.timeout_ms,
            min_pause_ms: c.min_pause_ms,
            max_concurrent_checkpoints: c.max_concurrent,
            fail_on_checkpointing_errors: c.fail_on_checkpointing_errors,
            tolerable_failure_number: c.tolerable_failure_number,
            externalized_checkpoint_retention: c.externalized_retention,
            unaligned_checkpoints: c.unaligned,
            force_unaligned_checkpoints: c.force_unaligned,
            alignment_timeout: c.alignment_timeout,
            approximate_local_recovery: c.approximate_local_recovery,
            checkpoint_id_of_ignored_in_flight_data: c.checkpoint_id_of_ignored_in_flight_data,
        }
    }
}

impl TryFrom<RawCheckpointConfig> for CheckpointConfig {
    type Error = Error;

    fn try_from(raw: RawCheckpointConfig) -> Result<Self> {
        let mut config = CheckpointConfig::default();
        if raw.interval_ms != DISABLED_INTERVAL {
            config.set_checkpoint_interval(raw.interval_ms)?;
        }
        config
            .set_checkpointing_mode(raw.mode)?
            .set_checkpoint_timeout(raw.timeout_ms)?
            .set_max_concurrent_checkpoints(raw.max_concurrent_checkpoints)?
            .set_approximate_local_recovery(raw.approximate_local_recovery)?
            .set_unaligned_checkpoints(raw.unaligned_checkpoints)?
            .set_checkpoint_id_of_ignored_in_flight_data(raw.checkpoint_id_of_ignored_in_flight_data)?;
        config
            .set_min_pause_between_checkpoints(raw.min_pause_ms)
            .set_fail_on_checkpointing_errors(raw.fail_on_checkpointing_errors)
            .set_tolerable_checkpoint_failure_number(raw.tolerable_failure_number)
            .set_externalized_checkpoint_retention(raw.externalized_checkpoint_retention)
            .set_force_unaligned_checkpoints(raw.force_unaligned_checkpoints)
            .set_alignment_timeout(raw.alignment_timeout);
        Ok(config)
    }
}
