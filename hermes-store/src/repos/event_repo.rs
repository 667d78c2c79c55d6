//! Indexed Event Repository

use async_trait::async_trait;
use hermes_core::{EventKey, IndexedEventRecord};

use crate::error::StoreResult;

/// Ledger of applied `(tx_hash, log_index)` pairs
#[async_trait]
pub trait IndexedEventRepository: Send + Sync {
    /// Whether the event has a ledger row
    async fn is_event_indexed(&self, key: &EventKey) -> StoreResult<bool>;

    /// Insert a ledger row. A primary key conflict is `StoreError::Duplicate`,
    /// never an overwrite.
    async fn mark_event_indexed(&self, record: IndexedEventRecord) -> StoreResult<()>;

    /// Highest block with a ledger row
    async fn latest_indexed_block(&self) -> StoreResult<Option<u64>>;

    /// Get a ledger row
    async fn get_indexed_event(&self, key: &EventKey) -> StoreResult<Option<IndexedEventRecord>>;
}
