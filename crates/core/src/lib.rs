//! Core types shared between the job API and the execution engine.

use serde::{Deserialize, Serialize};

/// Options attached to a single checkpoint barrier.
///
/// Derived from the job's frozen checkpoint configuration when the execution
/// engine triggers a checkpoint; tasks read these to decide how to align.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointOptions {
    /// Savepoints are user-triggered and never subject to retention cleanup.
    pub is_savepoint: bool,
    /// Whether tasks may snapshot in-flight data instead of aligning.
    pub is_unaligned: bool,
    /// Time to wait for aligned barriers before switching to unaligned.
    pub alignment_timeout_ms: Option<u64>,
}

impl CheckpointOptions {
    /// Options for a regular aligned checkpoint.
    pub fn aligned() -> Self {
        Self::default()
    }
}
