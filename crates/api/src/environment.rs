//! Stream environment: the job-building context.
//!
//! A [`StreamEnvironment`] is created by the caller for each job, owns the
//! job's [`CheckpointConfig`] and hands out access to it while the job is
//! being defined. [`StreamEnvironment::build`] freezes everything into a
//! [`JobDefinition`] that the execution engine reads but cannot change.

use serde::{Deserialize, Serialize};
use spoke_checkpoint::{CheckpointConfig, CheckpointingMode, Result};
use spoke_core::CheckpointOptions;
use std::collections::HashMap;
use tracing::info;

/// Job-building context for one streaming job.
#[derive(Debug, Clone)]
pub struct StreamEnvironment {
    name: String,
    checkpoint_config: CheckpointConfig,
}

impl StreamEnvironment {
    /// Create an environment with default settings; checkpointing is disabled.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checkpoint_config: CheckpointConfig::default(),
        }
    }

    pub fn builder(name: impl Into<String>) -> StreamEnvBuilder {
        StreamEnvBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn checkpoint_config(&self) -> &CheckpointConfig {
        &self.checkpoint_config
    }

    pub fn checkpoint_config_mut(&mut self) -> &mut CheckpointConfig {
        &mut self.checkpoint_config
    }

    /// Enable periodic checkpoints every `interval_ms` milliseconds.
    pub fn enable_checkpointing(&mut self, interval_ms: i64) -> Result<&mut Self> {
        self.checkpoint_config.set_checkpoint_interval(interval_ms)?;
        Ok(self)
    }

    /// Enable periodic checkpoints with the given guarantee.
    ///
    /// Interval and mode are applied together; if either is rejected neither
    /// takes effect.
    pub fn enable_checkpointing_with_mode(
        &mut self,
        interval_ms: i64,
        mode: CheckpointingMode,
    ) -> Result<&mut Self> {
        let mut next = self.checkpoint_config.clone();
        next.set_checkpointing_mode(mode)?
            .set_checkpoint_interval(interval_ms)?;
        self.checkpoint_config = next;
        Ok(self)
    }

    /// Apply `execution.checkpointing.*` options.
    pub fn configure(&mut self, options: &HashMap<String, String>) -> Result<&mut Self> {
        self.checkpoint_config.configure(options)?;
        Ok(self)
    }

    /// Freeze the job definition for submission.
    pub fn build(self) -> JobDefinition {
        let config = &self.checkpoint_config;
        info!(
            job = %self.name,
            checkpointing = config.is_checkpointing_enabled(),
            interval_ms = config.checkpoint_interval(),
            mode = %config.checkpointing_mode(),
            unaligned = config.is_unaligned_checkpoints_enabled(),
            "Built job definition"
        );
        JobDefinition {
            name: self.name,
            checkpoint_config: self.checkpoint_config,
        }
    }
}

/// Builder for a [`StreamEnvironment`].
///
/// ```
/// use spoke_api::prelude::*;
///
/// let env = StreamEnvironment::builder("wordcount")
///     .checkpoint_interval(10_000)
///     .checkpointing_mode(CheckpointingMode::AtLeastOnce)
///     .option("execution.checkpointing.timeout", "2 min")
///     .build()
///     .unwrap();
///
/// assert_eq!(env.checkpoint_config().checkpoint_timeout(), 120_000);
/// ```
#[derive(Debug, Clone)]
pub struct StreamEnvBuilder {
    name: String,
    interval_ms: Option<i64>,
    mode: Option<CheckpointingMode>,
    options: HashMap<String, String>,
}

impl StreamEnvBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interval_ms: None,
            mode: None,
            options: HashMap::new(),
        }
    }

    pub fn checkpoint_interval(mut self, interval_ms: i64) -> Self {
        self.interval_ms = Some(interval_ms);
        self
    }

    pub fn checkpointing_mode(mut self, mode: CheckpointingMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set a single configuration option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn options(mut self, options: HashMap<String, String>) -> Self {
        self.options.extend(options);
        self
    }

    /// Build the environment. Options are applied first, then the explicit
    /// mode and interval.
    pub fn build(self) -> Result<StreamEnvironment> {
        let mut env = StreamEnvironment::new(self.name);
        env.configure(&self.options)?;
        if let Some(mode) = self.mode {
            env.checkpoint_config_mut().set_checkpointing_mode(mode)?;
        }
        if let Some(interval_ms) = self.interval_ms {
            env.enable_checkpointing(interval_ms)?;
        }
        Ok(env)
    }
}

/// A job frozen for submission.
///
/// Only read access to the checkpoint configuration is offered; the
/// execution engine takes its snapshot from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    name: String,
    checkpoint_config: CheckpointConfig,
}

impl JobDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn checkpoint_config(&self) -> &CheckpointConfig {
        &self.checkpoint_config
    }

    /// Options for the next periodic checkpoint, or `None` when checkpointing is disabled.
    pub fn next_checkpoint_options(&self) -> Option<CheckpointOptions> {
        self.checkpoint_config
            .is_checkpointing_enabled()
            .then(|| self.checkpoint_config.barrier_options(false))
    }

    /// Options for a user-triggered savepoint.
    pub fn savepoint_options(&self) -> CheckpointOptions {
        self.checkpoint_config.barrier_options(true)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Decode a submitted job; checkpoint settings are validated again.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use spoke_checkpoint::ExternalizedCheckpointRetention;
    use std::time::Duration;

    #[test]
    fn test_is_checkpointing_enabled() {
        let mut env = StreamEnvironment::new("test");
        assert!(!env.checkpoint_config().is_checkpointing_enabled());

        env.enable_checkpointing(1000).unwrap();
        assert!(env.checkpoint_config().is_checkpointing_enabled());
        assert_eq!(env.checkpoint_config().checkpoint_interval(), 1000);
    }

    #[test]
    fn test_environments_are_independent() {
        let mut first = StreamEnvironment::new("first");
        let second = StreamEnvironment::new("second");

        first.enable_checkpointing(1000).unwrap();
        assert!(!second.checkpoint_config().is_checkpointing_enabled());
    }

    #[test]
    fn test_enable_with_mode_is_atomic() {
        let mut env = StreamEnvironment::new("test");
        env.checkpoint_config_mut()
            .enable_unaligned_checkpoints()
            .unwrap();

        assert!(env
            .enable_checkpointing_with_mode(1000, CheckpointingMode::AtLeastOnce)
            .is_err());
        assert!(!env.checkpoint_config().is_checkpointing_enabled());

        assert!(env
            .enable_checkpointing_with_mode(0, CheckpointingMode::ExactlyOnce)
            .is_err());

        env.enable_checkpointing_with_mode(500, CheckpointingMode::ExactlyOnce)
            .unwrap();
        assert_eq!(env.checkpoint_config().checkpoint_interval(), 500);
    }

    #[test]
    fn test_unaligned_checkpointing_flow() {
        let mut env = StreamEnvironment::new("test");
        let config = env.checkpoint_config_mut();
        assert!(!config.is_unaligned_checkpoints_enabled());
        assert!(!config.is_force_unaligned_checkpoints());
        assert_eq!(config.alignment_timeout(), Duration::from_millis(0));

        config.set_checkpoint_interval(10_000).unwrap();
        config.enable_unaligned_checkpoints().unwrap();
        assert!(config.is_unaligned_checkpoints_enabled());

        config.disable_unaligned_checkpoints();
        assert!(!config.is_unaligned_checkpoints_enabled());

        config.set_unaligned_checkpoints(true).unwrap();
        assert!(config.is_unaligned_checkpoints_enabled());

        config.set_force_unaligned_checkpoints(true);
        assert!(config.is_force_unaligned_checkpoints());

        config.set_alignment_timeout(Duration::from_secs(60));
        assert_eq!(config.alignment_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_builder() {
        let env = StreamEnvironment::builder("job")
            .option("execution.checkpointing.max-concurrent-checkpoints", "3")
            .checkpointing_mode(CheckpointingMode::AtLeastOnce)
            .checkpoint_interval(2000)
            .build()
            .unwrap();

        assert_eq!(env.name(), "job");
        let config = env.checkpoint_config();
        assert_eq!(config.checkpoint_interval(), 2000);
        assert_eq!(config.checkpointing_mode(), CheckpointingMode::AtLeastOnce);
        assert_eq!(config.max_concurrent_checkpoints(), 3);
    }

    #[test]
    fn test_builder_rejects_conflicts() {
        let result = StreamEnvironment::builder("job")
            .option("execution.checkpointing.unaligned", "true")
            .checkpointing_mode(CheckpointingMode::AtLeastOnce)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_job_definition_options() {
        let env = StreamEnvironment::new("disabled");
        let job = env.build();
        assert!(job.next_checkpoint_options().is_none());
        assert!(job.savepoint_options().is_savepoint);

        let mut env = StreamEnvironment::new("unaligned");
        env.enable_checkpointing(1000).unwrap();
        env.checkpoint_config_mut()
            .enable_unaligned_checkpoints()
            .unwrap()
            .set_alignment_timeout(Duration::from_secs(5));
        let job = env.build();

        let options = job.next_checkpoint_options().unwrap();
        assert!(options.is_unaligned);
        assert_eq!(options.alignment_timeout_ms, Some(5000));
        assert!(!job.savepoint_options().is_unaligned);
    }

    #[test]
    fn test_job_definition_json_round_trip() {
        let mut env = StreamEnvironment::new("wordcount");
        env.enable_checkpointing(1000).unwrap();
        env.checkpoint_config_mut()
            .set_externalized_checkpoint_retention(
                ExternalizedCheckpointRetention::RetainOnCancellation,
            )
            .set_alignment_timeout(Duration::from_secs(60));
        let job = env.build();

        let json = job.to_json().unwrap();
        let back = JobDefinition::from_json(&json).unwrap();
        assert_eq!(back, job);
        assert_eq!(back.name(), "wordcount");
    }

    #[test]
    fn test_job_definition_rejects_invalid_config() {
        let json = r#"{
            "name": "bad",
            "checkpoint_config": { "mode": "AT_LEAST_ONCE", "unaligned_checkpoints": true }
        }"#;
        assert!(JobDefinition::from_json(json).is_err());
    }

    proptest! {
        #[test]
        fn prop_enable_checkpointing(interval in 1i64..=i64::MAX) {
            let mut env = StreamEnvironment::new("prop");
            env.enable_checkpointing(interval).unwrap();
            prop_assert!(env.checkpoint_config().is_checkpointing_enabled());
            prop_assert_eq!(env.checkpoint_config().checkpoint_interval(), interval);
        }
    }
}
