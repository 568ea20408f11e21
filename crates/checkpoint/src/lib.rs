//! Checkpoint configuration for streaming jobs.
//!
//! This crate holds the settings that govern how a job takes consistent
//! distributed snapshots:
//! - Checkpoint interval, timeout and minimal pause
//! - Processing guarantee (exactly-once / at-least-once)
//! - Concurrency and failure tolerance
//! - Externalized checkpoint retention
//! - Unaligned checkpoints and alignment timeout
//!
//! Settings are validated as they are changed, so a [`CheckpointConfig`]
//! handed to the execution engine is always coherent.
//!
//! # Example
//!
//! ```
//! use spoke_checkpoint::{CheckpointConfig, CheckpointingMode};
//!
//! let mut config = CheckpointConfig::new();
//! config.set_checkpoint_interval(10_000)?;
//! config.enable_unaligned_checkpoints()?;
//!
//! assert!(config.is_checkpointing_enabled());
//! assert!(config.set_checkpointing_mode(CheckpointingMode::AtLeastOnce).is_err());
//! # Ok::<(), spoke_checkpoint::Error>(())
//! ```

mod config;
mod error;
pub mod options;
mod types;

pub use config::{
    CheckpointConfig, DEFAULT_MAX_CONCURRENT_CHECKPOINTS, DEFAULT_MIN_PAUSE_MS,
    DEFAULT_TIMEOUT_MS, DISABLED_INTERVAL, NO_IGNORED_IN_FLIGHT_DATA,
};
pub use error::{Error, Result};
pub use types::{CheckpointingMode, ExternalizedCheckpointRetention};
