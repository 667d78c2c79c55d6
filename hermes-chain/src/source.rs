//! Event Source Adapter
//!
//! The indexer's only view of the chain. Implementations must be stateless
//! with respect to indexing: every call reflects the node's current state.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ChainResult;

/// A log as returned by `eth_getLogs`, minus pending entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub tx_hash: B256,
    pub log_index: u64,
}

impl RawLog {
    /// Encode a typed event into a raw log
    pub fn from_event<E: SolEvent>(
        address: Address,
        event: &E,
        block_number: u64,
        tx_hash: B256,
        log_index: u64,
    ) -> Self {
        let data = event.encode_log_data();
        Self {
            address,
            topics: data.topics().to_vec(),
            data: data.data,
            block_number,
            tx_hash,
            log_index,
        }
    }
}

/// Result of `getSubmission(subId)` on a challenge contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnChainSubmission {
    pub solver: Address,
    pub result_hash: B256,
    pub proof_bundle_hash: B256,
    /// WAD-encoded score, zero until scored
    pub score: U256,
    /// Unix seconds
    pub submitted_at: u64,
    pub scored: bool,
}

/// Read access to the chain
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Current head block number
    async fn latest_block(&self) -> ChainResult<u64>;

    /// Logs emitted by `address` in `[from_block, to_block]`
    async fn logs(&self, address: Address, from_block: u64, to_block: u64)
        -> ChainResult<Vec<RawLog>>;

    /// `specCid()` of a challenge contract
    async fn spec_cid(&self, challenge: Address) -> ChainResult<String>;

    /// `getSubmission(subId)` of a challenge contract
    async fn submission(&self, challenge: Address, submission_id: u64)
        -> ChainResult<OnChainSubmission>;

    /// `winningSubmissionId()` of a challenge contract
    async fn winning_submission_id(&self, challenge: Address) -> ChainResult<u64>;

    /// Timestamp of a block
    async fn block_timestamp(&self, block_number: u64) -> ChainResult<DateTime<Utc>>;
}
