//! Chain Error Types

use thiserror::Error;

/// Chain adapter result type
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors raised while reading or decoding chain data
#[derive(Debug, Error)]
pub enum ChainError {
    /// JSON-RPC transport failure
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Contract view call failed
    #[error("Contract read {method} on {contract} failed: {reason}")]
    ContractRead {
        contract: String,
        method: String,
        reason: String,
    },

    /// Block not returned by the node
    #[error("Block not found: {0}")]
    BlockNotFound(u64),

    /// Log matched a known event but its payload did not decode
    #[error("Failed to decode {event} at {key}: {reason}")]
    Decode {
        event: String,
        key: String,
        reason: String,
    },

    /// Decoded event lacks an argument or it has the wrong type
    #[error("Event {event} has no valid argument {field}")]
    InvalidArgument { event: String, field: String },

    /// Event signature failed to parse
    #[error("Invalid ABI: {0}")]
    InvalidAbi(String),

    /// Bad endpoint or address configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ChainError {
    /// Create an RPC error
    pub fn rpc(message: impl Into<String>) -> Self {
        Self::Rpc(message.into())
    }

    /// Create a contract read error
    pub fn contract_read(
        contract: impl Into<String>,
        method: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::ContractRead {
            contract: contract.into(),
            method: method.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(event: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidArgument {
            event: event.into(),
            field: field.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ChainError::Rpc(_) | ChainError::ContractRead { .. } | ChainError::BlockNotFound(_)
        )
    }
}
