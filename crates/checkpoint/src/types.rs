//! Enumerations used by the checkpoint configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Processing guarantee provided by checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckpointingMode {
    /// Barriers are aligned on all inputs; each record affects state once.
    ExactlyOnce,
    /// Barriers are not aligned; records may be replayed after recovery.
    AtLeastOnce,
}

impl Default for CheckpointingMode {
    fn default() -> Self {
        Self::ExactlyOnce
    }
}

impl CheckpointingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactlyOnce => "EXACTLY_ONCE",
            Self::AtLeastOnce => "AT_LEAST_ONCE",
        }
    }
}

impl fmt::Display for CheckpointingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckpointingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "EXACTLY_ONCE" => Ok(Self::ExactlyOnce),
            "AT_LEAST_ONCE" => Ok(Self::AtLeastOnce),
            _ => Err(Error::invalid(
                "mode",
                format!("unknown checkpointing mode `{s}`, expected EXACTLY_ONCE or AT_LEAST_ONCE"),
            )),
        }
    }
}

/// What happens to the last checkpoint when the job stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExternalizedCheckpointRetention {
    /// Checkpoints are not externalized and are removed with the job.
    NoExternalizedCheckpoints,
    /// Keep the externalized checkpoint when the job is cancelled.
    RetainOnCancellation,
    /// Delete the externalized checkpoint when the job is cancelled.
    /// It is still kept if the job fails.
    DeleteOnCancellation,
}

impl Default for ExternalizedCheckpointRetention {
    fn default() -> Self {
        Self::NoExternalizedCheckpoints
    }
}

impl ExternalizedCheckpointRetention {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoExternalizedCheckpoints => "NO_EXTERNALIZED_CHECKPOINTS",
            Self::RetainOnCancellation => "RETAIN_ON_CANCELLATION",
            Self::DeleteOnCancellation => "DELETE_ON_CANCELLATION",
        }
    }

    /// Whether completed checkpoints outlive the job in durable storage.
    pub fn is_externalized(&self) -> bool {
        !matches!(self, Self::NoExternalizedCheckpoints)
    }
}

impl fmt::Display for ExternalizedCheckpointRetention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExternalizedCheckpointRetention {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "NO_EXTERNALIZED_CHECKPOINTS" => Ok(Self::NoExternalizedCheckpoints),
            "RETAIN_ON_CANCELLATION" => Ok(Self::RetainOnCancellation),
            "DELETE_ON_CANCELLATION" => Ok(Self::DeleteOnCancellation),
            _ => Err(Error::invalid(
                "externalized-checkpoint-retention",
                format!("unknown retention `{s}`"),
            )),
        }
    }
}

// Accept `exactly_once`, `exactly-once` and `EXACTLY_ONCE` alike.
fn normalize(s: &str) -> String {
    s.trim().replace('-', "_").to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!(
            "EXACTLY_ONCE".parse::<CheckpointingMode>().unwrap(),
            CheckpointingMode::ExactlyOnce
        );
        assert_eq!(
            "at-least-once".parse::<CheckpointingMode>().unwrap(),
            CheckpointingMode::AtLeastOnce
        );
        let err = "twice".parse::<CheckpointingMode>().unwrap_err();
        assert_eq!(err.option(), "mode");
    }

    #[test]
    fn test_mode_display_matches_parse() {
        for mode in [CheckpointingMode::ExactlyOnce, CheckpointingMode::AtLeastOnce] {
            assert_eq!(mode.to_string().parse::<CheckpointingMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_retention_flags() {
        use ExternalizedCheckpointRetention::*;
        assert!(!NoExternalizedCheckpoints.is_externalized());
        assert!(RetainOnCancellation.is_externalized());
        assert!(DeleteOnCancellation.is_externalized());
    }

    #[test]
    fn test_retention_serde_names() {
        let json = serde_json::to_string(&ExternalizedCheckpointRetention::RetainOnCancellation)
            .unwrap();
        assert_eq!(json, "\"RETAIN_ON_CANCELLATION\"");
        let mode: CheckpointingMode = serde_json::from_str("\"AT_LEAST_ONCE\"").unwrap();
        assert_eq!(mode, CheckpointingMode::AtLeastOnce);
    }
}
