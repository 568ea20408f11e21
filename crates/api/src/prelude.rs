//! Prelude module - common imports for Spoke jobs.
//!
//! ```ignore
//! use spoke_api::prelude::*;
//! ```

// Environment
pub use crate::environment::{JobDefinition, StreamEnvBuilder, StreamEnvironment};

// Checkpoint configuration
pub use spoke_checkpoint::{CheckpointConfig, CheckpointingMode, ExternalizedCheckpointRetention};
pub use spoke_core::CheckpointOptions;

// Error and Result
pub use crate::{Error, Result};

pub use std::collections::HashMap;
pub use std::time::Duration;
