//! JSON-RPC Event Source
//!
//! [`EventSource`] over an alloy HTTP provider.

use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{BlockNumberOrTag, Filter, Log};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hermes_core::address_key;
use tracing::{debug, trace};

use crate::abi::IHermesChallenge;
use crate::error::{ChainError, ChainResult};
use crate::source::{EventSource, OnChainSubmission, RawLog};

/// Event source backed by a JSON-RPC node
#[derive(Clone)]
pub struct RpcEventSource {
    provider: DynProvider,
}

impl RpcEventSource {
    /// Connect over HTTP
    pub fn connect(rpc_url: &str) -> ChainResult<Self> {
        let url = rpc_url
            .parse()
            .map_err(|e| ChainError::InvalidConfig(format!("RPC URL {rpc_url}: {e}")))?;
        let provider = ProviderBuilder::new().connect_http(url).erased();

        debug!(rpc_url, "connected event source");

        Ok(Self { provider })
    }

    fn challenge(&self, address: Address) -> IHermesChallenge::IHermesChallengeInstance<DynProvider> {
        IHermesChallenge::new(address, self.provider.clone())
    }
}

/// Drop pending logs, which have no position yet
fn to_raw_log(log: Log) -> Option<RawLog> {
    let (Some(block_number), Some(tx_hash), Some(log_index)) =
        (log.block_number, log.transaction_hash, log.log_index)
    else {
        trace!(address = %log.address(), "skipping pending log");
        return None;
    };

    Some(RawLog {
        address: log.address(),
        topics: log.topics().to_vec(),
        data: log.data().data.clone(),
        block_number,
        tx_hash,
        log_index,
    })
}

#[async_trait]
impl EventSource for RpcEventSource {
    async fn latest_block(&self) -> ChainResult<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::rpc(format!("eth_blockNumber: {e}")))
    }

    async fn logs(
        &self,
        address: Address,
        from_block: u64,
        to_block: u64,
    ) -> ChainResult<Vec<RawLog>> {
        let filter = Filter::new()
            .address(address)
            .from_block(BlockNumberOrTag::Number(from_block))
            .to_block(BlockNumberOrTag::Number(to_block));

        let logs = self.provider.get_logs(&filter).await.map_err(|e| {
            ChainError::rpc(format!(
                "eth_getLogs {} [{from_block}, {to_block}]: {e}",
                address_key(&address)
            ))
        })?;

        Ok(logs.into_iter().filter_map(to_raw_log).collect())
    }

    async fn spec_cid(&self, challenge: Address) -> ChainResult<String> {
        self.challenge(challenge)
            .specCid()
            .call()
            .await
            .map_err(|e| ChainError::contract_read(address_key(&challenge), "specCid", e))
    }

    async fn submission(
        &self,
        challenge: Address,
        submission_id: u64,
    ) -> ChainResult<OnChainSubmission> {
        let record = self
            .challenge(challenge)
            .getSubmission(U256::from(submission_id))
            .call()
            .await
            .map_err(|e| ChainError::contract_read(address_key(&challenge), "getSubmission", e))?;

        Ok(OnChainSubmission {
            solver: record.solver,
            result_hash: record.resultHash,
            proof_bundle_hash: record.proofBundleHash,
            score: record.score,
            submitted_at: record.submittedAt,
            scored: record.scored,
        })
    }

    async fn winning_submission_id(&self, challenge: Address) -> ChainResult<u64> {
        let winner = self
            .challenge(challenge)
            .winningSubmissionId()
            .call()
            .await
            .map_err(|e| {
                ChainError::contract_read(address_key(&challenge), "winningSubmissionId", e)
            })?;

        u64::try_from(winner).map_err(|_| {
            ChainError::contract_read(
                address_key(&challenge),
                "winningSubmissionId",
                format!("{winner} does not fit u64"),
            )
        })
    }

    async fn block_timestamp(&self, block_number: u64) -> ChainResult<DateTime<Utc>> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(block_number))
            .await
            .map_err(|e| ChainError::rpc(format!("eth_getBlockByNumber {block_number}: {e}")))?
            .ok_or(ChainError::BlockNotFound(block_number))?;

        let timestamp = i64::try_from(block.header.timestamp)
            .map_err(|_| ChainError::rpc(format!("block {block_number} timestamp out of range")))?;

        DateTime::<Utc>::from_timestamp(timestamp, 0)
            .ok_or_else(|| ChainError::rpc(format!("block {block_number} timestamp out of range")))
    }
}
