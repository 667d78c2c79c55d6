//! Core Error Types

use thiserror::Error;

use crate::types::ChallengeStatus;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core errors
#[derive(Debug, Error)]
pub enum CoreError {
    /// Amount could not be represented or parsed
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Unknown challenge status string
    #[error("Invalid challenge status: {0}")]
    InvalidStatus(String),

    /// Status change that would move the lifecycle backwards
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ChallengeStatus,
        to: ChallengeStatus,
    },

    /// Row failed an entity invariant
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// Challenge spec document is not valid YAML for the schema
    #[error("Spec parse error: {0}")]
    SpecParse(String),

    /// Challenge spec parsed but violates the schema
    #[error("Spec validation failed: {}", violations.join("; "))]
    SpecInvalid { violations: Vec<String> },
}

impl CoreError {
    /// Create an invalid amount error
    pub fn amount(message: impl Into<String>) -> Self {
        Self::InvalidAmount(message.into())
    }

    /// Create an invariant error
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }
}

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SpecParse(err.to_string())
    }
}
