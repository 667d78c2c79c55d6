//! Indexer State Repository

use async_trait::async_trait;

use crate::error::StoreResult;

/// Per-chain poll watermark
#[async_trait]
pub trait IndexerStateRepository: Send + Sync {
    /// Next block to index, if a pass has ever completed on `chain_id`
    async fn get_next_block(&self, chain_id: u64) -> StoreResult<Option<u64>>;

    /// Record the watermark of a completed pass
    async fn set_next_block(&self, chain_id: u64, next_block: u64) -> StoreResult<()>;
}
