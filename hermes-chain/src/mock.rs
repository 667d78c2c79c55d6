//! In-memory event source for tests and local runs

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use alloy::primitives::Address;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hermes_core::address_key;

use crate::error::{ChainError, ChainResult};
use crate::source::{EventSource, OnChainSubmission, RawLog};

/// Base timestamp for blocks without an explicit one
const GENESIS_TIMESTAMP: i64 = 1_700_000_000;

#[derive(Default)]
struct MockChainState {
    head: u64,
    logs: HashMap<Address, Vec<RawLog>>,
    spec_cids: HashMap<Address, String>,
    submissions: HashMap<(Address, u64), OnChainSubmission>,
    winners: HashMap<Address, u64>,
    timestamps: HashMap<u64, DateTime<Utc>>,
    log_queries: Vec<(Address, u64, u64)>,
}

/// Mock event source
///
/// Blocks without an explicit timestamp are two seconds apart.
pub struct MockEventSource {
    state: RwLock<MockChainState>,
    /// Simulate RPC failure
    fail_mode: AtomicBool,
}

impl MockEventSource {
    /// Create an empty chain at block 0
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MockChainState::default()),
            fail_mode: AtomicBool::new(false),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MockChainState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MockChainState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enable failure mode for testing
    pub fn set_fail_mode(&self, fail: bool) {
        self.fail_mode.store(fail, Ordering::SeqCst);
    }

    pub fn set_head(&self, block: u64) {
        self.write().head = block;
    }

    /// Append a log; the head moves forward to cover it
    pub fn push_log(&self, log: RawLog) {
        let mut state = self.write();
        state.head = state.head.max(log.block_number);
        state.logs.entry(log.address).or_default().push(log);
    }

    pub fn set_spec_cid(&self, challenge: Address, cid: impl Into<String>) {
        self.write().spec_cids.insert(challenge, cid.into());
    }

    pub fn set_submission(&self, challenge: Address, submission_id: u64, record: OnChainSubmission) {
        self.write()
            .submissions
            .insert((challenge, submission_id), record);
    }

    pub fn set_winner(&self, challenge: Address, submission_id: u64) {
        self.write().winners.insert(challenge, submission_id);
    }

    pub fn set_block_timestamp(&self, block: u64, timestamp: DateTime<Utc>) {
        self.write().timestamps.insert(block, timestamp);
    }

    /// Every `logs` call made so far, as `(address, from, to)`
    pub fn log_queries(&self) -> Vec<(Address, u64, u64)> {
        self.read().log_queries.clone()
    }

    fn check_available(&self) -> ChainResult<()> {
        if self.fail_mode.load(Ordering::SeqCst) {
            return Err(ChainError::rpc("mock failure mode"));
        }
        Ok(())
    }
}

impl Default for MockEventSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    async fn latest_block(&self) -> ChainResult<u64> {
        self.check_available()?;
        Ok(self.read().head)
    }

    async fn logs(
        &self,
        address: Address,
        from_block: u64,
        to_block: u64,
    ) -> ChainResult<Vec<RawLog>> {
        self.check_available()?;
        let mut state = self.write();
        state.log_queries.push((address, from_block, to_block));

        Ok(state
            .logs
            .get(&address)
            .map(|logs| {
                logs.iter()
                    .filter(|log| (from_block..=to_block).contains(&log.block_number))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn spec_cid(&self, challenge: Address) -> ChainResult<String> {
        self.check_available()?;
        self.read()
            .spec_cids
            .get(&challenge)
            .cloned()
            .ok_or_else(|| ChainError::contract_read(address_key(&challenge), "specCid", "no spec"))
    }

    async fn submission(
        &self,
        challenge: Address,
        submission_id: u64,
    ) -> ChainResult<OnChainSubmission> {
        self.check_available()?;
        self.read()
            .submissions
            .get(&(challenge, submission_id))
            .cloned()
            .ok_or_else(|| {
                ChainError::contract_read(
                    address_key(&challenge),
                    "getSubmission",
                    format!("no submission {submission_id}"),
                )
            })
    }

    async fn winning_submission_id(&self, challenge: Address) -> ChainResult<u64> {
        self.check_available()?;
        self.read().winners.get(&challenge).copied().ok_or_else(|| {
            ChainError::contract_read(address_key(&challenge), "winningSubmissionId", "no winner")
        })
    }

    async fn block_timestamp(&self, block_number: u64) -> ChainResult<DateTime<Utc>> {
        self.check_available()?;
        if let Some(timestamp) = self.read().timestamps.get(&block_number) {
            return Ok(*timestamp);
        }
        let offset = i64::try_from(block_number)
            .map_err(|_| ChainError::BlockNotFound(block_number))?
            .saturating_mul(2);
        DateTime::<Utc>::from_timestamp(GENESIS_TIMESTAMP.saturating_add(offset), 0)
            .ok_or(ChainError::BlockNotFound(block_number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::IHermesChallenge;
    use alloy::primitives::{address, B256, U256};

    const CHALLENGE: Address = address!("cc00000000000000000000000000000000000001");

    #[tokio::test]
    async fn test_logs_filtered_by_range() {
        let source = MockEventSource::new();
        for block in [5, 10, 15] {
            source.push_log(RawLog::from_event(
                CHALLENGE,
                &IHermesChallenge::Cancelled {},
                block,
                B256::repeat_byte(block as u8),
                0,
            ));
        }

        assert_eq!(source.latest_block().await.unwrap(), 15);
        let logs = source.logs(CHALLENGE, 6, 15).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(source.log_queries(), vec![(CHALLENGE, 6, 15)]);
    }

    #[tokio::test]
    async fn test_fail_mode() {
        let source = MockEventSource::new();
        source.set_fail_mode(true);
        assert!(source.latest_block().await.unwrap_err().is_retryable());

        source.set_fail_mode(false);
        assert!(source.latest_block().await.is_ok());
    }

    #[tokio::test]
    async fn test_submission_read() {
        let source = MockEventSource::new();
        let record = OnChainSubmission {
            solver: address!("bb00000000000000000000000000000000000001"),
            result_hash: B256::repeat_byte(0x11),
            proof_bundle_hash: B256::ZERO,
            score: U256::ZERO,
            submitted_at: 1_700_000_100,
            scored: false,
        };
        source.set_submission(CHALLENGE, 3, record.clone());

        assert_eq!(source.submission(CHALLENGE, 3).await.unwrap(), record);
        assert!(source.submission(CHALLENGE, 4).await.is_err());
    }
}
