//! Key/value checkpoint options.
//!
//! Jobs may carry their checkpoint settings as flat string properties
//! (for example from a YAML file or the command line) under the
//! `execution.checkpointing.` prefix:
//!
//! ```text
//! execution.checkpointing.interval: 10 s
//! execution.checkpointing.mode: EXACTLY_ONCE
//! execution.checkpointing.unaligned: true
//! execution.checkpointing.aligned-checkpoint-timeout: 30 s
//! ```
//!
//! Durations are plain milliseconds or human-readable strings (`10 s`, `1min`).

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::CheckpointConfig;
use crate::error::{Error, Result};

pub const PREFIX: &str = "execution.checkpointing.";

pub const INTERVAL: &str = "interval";
pub const MODE: &str = "mode";
pub const TIMEOUT: &str = "timeout";
pub const MIN_PAUSE: &str = "min-pause";
pub const MAX_CONCURRENT_CHECKPOINTS: &str = "max-concurrent-checkpoints";
pub const FAIL_ON_ERRORS: &str = "fail-on-checkpointing-errors";
pub const TOLERABLE_FAILED_CHECKPOINTS: &str = "tolerable-failed-checkpoints";
pub const EXTERNALIZED_RETENTION: &str = "externalized-checkpoint-retention";
pub const APPROXIMATE_LOCAL_RECOVERY: &str = "approximate-local-recovery";
pub const UNALIGNED: &str = "unaligned";
pub const UNALIGNED_FORCED: &str = "unaligned.forced";
pub const ALIGNED_CHECKPOINT_TIMEOUT: &str = "aligned-checkpoint-timeout";
pub const IGNORED_IN_FLIGHT_DATA: &str = "recover-without-channel-state.checkpoint-id";

/// Options in the order they are applied. `mode` and
/// `approximate-local-recovery` come before `unaligned`.
const APPLY_ORDER: &[&str] = &[
    INTERVAL,
    MODE,
    TIMEOUT,
    MIN_PAUSE,
    MAX_CONCURRENT_CHECKPOINTS,
    FAIL_ON_ERRORS,
    TOLERABLE_FAILED_CHECKPOINTS,
    EXTERNALIZED_RETENTION,
    APPROXIMATE_LOCAL_RECOVERY,
    UNALIGNED,
    UNALIGNED_FORCED,
    ALIGNED_CHECKPOINT_TIMEOUT,
    IGNORED_IN_FLIGHT_DATA,
];

impl CheckpointConfig {
    /// Build a configuration from defaults plus the given options.
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();
        config.configure(options)?;
        Ok(config)
    }

    /// Apply `execution.checkpointing.*` options.
    ///
    /// Options are applied to a copy first; if any of them is rejected the
    /// configuration is left as it was.
    pub fn configure(&mut self, options: &HashMap<String, String>) -> Result<()> {
        for key in options.keys() {
            if let Some(name) = key.strip_prefix(PREFIX) {
                if !APPLY_ORDER.contains(&name) {
                    warn!(option = %key, "Ignoring unknown checkpoint option");
                }
            }
        }

        let mut next = self.clone();

        // Switch unaligned off before `mode` so that one batch can move from
        // unaligned exactly-once to at-least-once.
        if let Some(value) = options.get(&format!("{PREFIX}{UNALIGNED}")) {
            if !parse_bool(UNALIGNED, value.trim())? {
                apply(&mut next, UNALIGNED, "false")?;
            }
        }

        for name in APPLY_ORDER {
            let key = format!("{PREFIX}{name}");
            if let Some(value) = options.get(&key) {
                apply(&mut next, name, value.trim())?;
                debug!(option = %key, value = %value, "Applied checkpoint option");
            }
        }
        *self = next;
        Ok(())
    }

    /// Render the configuration as fully-qualified options.
    ///
    /// Feeding the result back into [`configure`](Self::configure) on a
    /// default configuration reproduces this one, except that a disabled
    /// interval is omitted.
    pub fn to_options(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        let mut put = |name: &str, value: String| {
            out.insert(format!("{PREFIX}{name}"), value);
        };
        if self.is_checkpointing_enabled() {
            put(INTERVAL, self.checkpoint_interval().to_string());
        }
        put(MODE, self.checkpointing_mode().to_string());
        put(TIMEOUT, self.checkpoint_timeout().to_string());
        put(MIN_PAUSE, self.min_pause_between_checkpoints().to_string());
        put(
            MAX_CONCURRENT_CHECKPOINTS,
            self.max_concurrent_checkpoints().to_string(),
        );
        put(FAIL_ON_ERRORS, self.is_fail_on_checkpointing_errors().to_string());
        put(
            TOLERABLE_FAILED_CHECKPOINTS,
            self.tolerable_checkpoint_failure_number().to_string(),
        );
        put(
            EXTERNALIZED_RETENTION,
            self.externalized_checkpoint_retention().to_string(),
        );
        put(
            APPROXIMATE_LOCAL_RECOVERY,
            self.is_approximate_local_recovery_enabled().to_string(),
        );
        put(UNALIGNED, self.is_unaligned_checkpoints_enabled().to_string());
        put(UNALIGNED_FORCED, self.is_force_unaligned_checkpoints().to_string());
        put(
            ALIGNED_CHECKPOINT_TIMEOUT,
            humantime::format_duration(self.alignment_timeout()).to_string(),
        );
        put(
            IGNORED_IN_FLIGHT_DATA,
            self.checkpoint_id_of_ignored_in_flight_data().to_string(),
        );
        out
    }
}

fn apply(config: &mut CheckpointConfig, name: &str, value: &str) -> Result<()> {
    match name {
        INTERVAL => {
            let ms = i64::try_from(parse_millis(name, value)?)
                .map_err(|_| Error::invalid(name, "interval is too large"))?;
            config.set_checkpoint_interval(ms)?;
        }
        MODE => {
            config.set_checkpointing_mode(value.parse()?)?;
        }
        TIMEOUT => {
            config.set_checkpoint_timeout(parse_millis(name, value)?)?;
        }
        MIN_PAUSE => {
            config.set_min_pause_between_checkpoints(parse_millis(name, value)?);
        }
        MAX_CONCURRENT_CHECKPOINTS => {
            config.set_max_concurrent_checkpoints(parse_number(name, value)?)?;
        }
        FAIL_ON_ERRORS => {
            config.set_fail_on_checkpointing_errors(parse_bool(name, value)?);
        }
        TOLERABLE_FAILED_CHECKPOINTS => {
            config.set_tolerable_checkpoint_failure_number(parse_number(name, value)?);
        }
        EXTERNALIZED_RETENTION => {
            config.set_externalized_checkpoint_retention(value.parse()?);
        }
        APPROXIMATE_LOCAL_RECOVERY => {
            config.set_approximate_local_recovery(parse_bool(name, value)?)?;
        }
        UNALIGNED => {
            config.set_unaligned_checkpoints(parse_bool(name, value)?)?;
        }
        UNALIGNED_FORCED => {
            config.set_force_unaligned_checkpoints(parse_bool(name, value)?);
        }
        ALIGNED_CHECKPOINT_TIMEOUT => {
            config.set_alignment_timeout(parse_duration(name, value)?);
        }
        IGNORED_IN_FLIGHT_DATA => {
            config.set_checkpoint_id_of_ignored_in_flight_data(parse_number(name, value)?)?;
        }
        _ => unreachable!("option `{name}` missing from apply"),
    }
    Ok(())
}

/// Plain integers are milliseconds; anything else goes through humantime.
fn parse_duration(name: &str, value: &str) -> Result<Duration> {
    if let Ok(ms) = value.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }
    humantime::parse_duration(value)
        .map_err(|e| Error::invalid(name, format!("invalid duration `{value}`: {e}")))
}

/// Millisecond settings reject durations with a sub-millisecond part.
fn parse_millis(name: &str, value: &str) -> Result<u64> {
    let duration = parse_duration(name, value)?;
    if duration.subsec_nanos() % 1_000_000 != 0 {
        return Err(Error::invalid(
            name,
            format!("`{value}` is not a whole number of milliseconds"),
        ));
    }
    u64::try_from(duration.as_millis())
        .map_err(|_| Error::invalid(name, "duration is too large"))
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::invalid(name, format!("invalid number `{value}`: {e}")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::invalid(name, format!("expected true or false, got `{value}`"))),
    }
}
