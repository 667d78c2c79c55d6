//! Indexer Error Types
//!
//! Errors are classified at the pass boundary:
//!
//! - retryable: transport and connection failures, retried next pass
//! - event-permanent: the event itself is bad (spec document, arguments,
//!   amounts); only these count toward quarantine
//! - ledger conflict: an event was marked twice, which the retry model
//!   should make impossible

use hermes_chain::ChainError;
use hermes_core::CoreError;
use hermes_store::StoreError;
use thiserror::Error;

/// Indexer result type
pub type IndexerResult<T> = Result<T, IndexerError>;

/// Indexer errors
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Event source failure
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    /// Store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Content could not be fetched
    #[error("Fetch of {uri} failed: {reason}")]
    SpecFetch {
        uri: String,
        reason: String,
        /// HTTP status, when the gateway answered
        status: Option<u16>,
    },

    /// Content URI no fetcher can serve
    #[error("Unsupported content URI {uri}: {reason}")]
    SpecUri { uri: String, reason: String },

    /// Spec document is malformed or violates the schema
    #[error("Invalid challenge spec at {uri}: {source}")]
    SpecInvalid {
        uri: String,
        #[source]
        source: CoreError,
    },

    /// Domain conversion failed (amounts, row invariants)
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Attempt to mark an already indexed event
    #[error("Ledger conflict: event {key} is already indexed")]
    LedgerConflict { key: String },

    /// Stored or configured address does not parse
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging setup failed
    #[error("Logging error: {0}")]
    Logging(String),
}

impl IndexerError {
    /// Create a fetch error
    pub fn fetch(uri: impl Into<String>, reason: impl Into<String>, status: Option<u16>) -> Self {
        Self::SpecFetch {
            uri: uri.into(),
            reason: reason.into(),
            status,
        }
    }

    /// Create an unsupported URI error
    pub fn spec_uri(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpecUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Transient infrastructure failure
    pub fn is_retryable(&self) -> bool {
        match self {
            IndexerError::Chain(e) => e.is_retryable(),
            IndexerError::Store(e) => e.is_retryable(),
            IndexerError::SpecFetch { status, .. } => match status {
                None => true,
                Some(code) => *code >= 500 || *code == 429,
            },
            _ => false,
        }
    }

    /// Failure caused by the event's own content
    pub fn is_event_permanent(&self) -> bool {
        matches!(
            self,
            IndexerError::SpecUri { .. }
                | IndexerError::SpecInvalid { .. }
                | IndexerError::Core(_)
                | IndexerError::Chain(ChainError::InvalidArgument { .. })
        )
    }

    pub fn is_ledger_conflict(&self) -> bool {
        matches!(self, IndexerError::LedgerConflict { .. })
    }

    /// Process exit code for the binary
    pub fn exit_code(&self) -> i32 {
        match self {
            IndexerError::Config(_) | IndexerError::InvalidAddress(_) => 1,
            IndexerError::Logging(_) => 2,
            IndexerError::Chain(_) | IndexerError::SpecFetch { .. } => 3,
            IndexerError::Store(_) => 4,
            IndexerError::LedgerConflict { .. } => 5,
            _ => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(IndexerError::Chain(ChainError::rpc("down")).is_retryable());
        assert!(IndexerError::fetch("ipfs://Qm", "timeout", None).is_retryable());
        assert!(IndexerError::fetch("ipfs://Qm", "bad gateway", Some(502)).is_retryable());
        assert!(!IndexerError::fetch("ipfs://Qm", "not found", Some(404)).is_retryable());

        let invalid = IndexerError::SpecInvalid {
            uri: "ipfs://Qm".to_string(),
            source: CoreError::SpecParse("bad yaml".to_string()),
        };
        assert!(invalid.is_event_permanent());
        assert!(!invalid.is_retryable());

        assert!(IndexerError::Chain(ChainError::invalid_argument("Scored", "score"))
            .is_event_permanent());
        assert!(!IndexerError::fetch("ipfs://Qm", "timeout", None).is_event_permanent());

        let uri = IndexerError::spec_uri("ar://tx", "unsupported URI scheme");
        assert!(uri.is_event_permanent());
        assert!(!uri.is_retryable());

        let conflict = IndexerError::LedgerConflict {
            key: "0xaa:0".to_string(),
        };
        assert!(conflict.is_ledger_conflict());
        assert!(!conflict.is_retryable());
    }
}
