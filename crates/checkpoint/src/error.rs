//! Errors raised by checkpoint configuration.

/// Error returned when a checkpoint setting is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A value violates a documented constraint, or conflicts with the
    /// settings already held by the configuration.
    #[error("invalid checkpoint configuration for `{option}`: {reason}")]
    InvalidConfiguration { option: String, reason: String },
}

impl Error {
    pub(crate) fn invalid(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending setting.
    pub fn option(&self) -> &str {
        match self {
            Self::InvalidConfiguration { option, .. } => option,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
