//! Indexer lag health check

use chrono::{DateTime, Utc};
use hermes_chain::EventSource;
use hermes_store::IndexedEventRepository;
use serde::{Deserialize, Serialize};

use crate::error::IndexerResult;

/// Lag classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LagStatus {
    /// Nothing indexed yet
    Empty,
    Ok,
    Warning,
    Critical,
}

/// Block-lag thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LagThresholds {
    pub warn_blocks: u64,
    pub critical_blocks: u64,
}

impl Default for LagThresholds {
    fn default() -> Self {
        Self {
            warn_blocks: 20,
            critical_blocks: 120,
        }
    }
}

impl LagThresholds {
    pub fn classify(&self, lag_blocks: u64) -> LagStatus {
        if lag_blocks >= self.critical_blocks {
            LagStatus::Critical
        } else if lag_blocks >= self.warn_blocks {
            LagStatus::Warning
        } else {
            LagStatus::Ok
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LagReport {
    pub status: LagStatus,
    pub head_block: u64,
    pub indexed_block: Option<u64>,
    pub lag_blocks: Option<u64>,
    pub checked_at: DateTime<Utc>,
}

/// Compare the chain head with the highest indexed block
pub async fn check_lag<S, R>(
    source: &S,
    ledger: &R,
    thresholds: &LagThresholds,
) -> IndexerResult<LagReport>
where
    S: EventSource + ?Sized,
    R: IndexedEventRepository + ?Sized,
{
    let head_block = source.latest_block().await?;
    let indexed_block = ledger.latest_indexed_block().await?;
    let lag_blocks = indexed_block.map(|block| head_block.saturating_sub(block));

    Ok(LagReport {
        status: lag_blocks.map_or(LagStatus::Empty, |lag| thresholds.classify(lag)),
        head_block,
        indexed_block,
        lag_blocks,
        checked_at: Utc::now(),
    })
}
