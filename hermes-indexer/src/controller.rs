//! Poll Loop Controller
//!
//! One pass:
//!
//! 1. read the head and derive the safe head (`head - confirmations`)
//! 2. fetch and decode factory logs for `[from_block, safe_head]`, project
//!    them in `(block, log_index)` order
//! 3. list known challenges (including any created in step 2) and do the
//!    same for each challenge contract
//! 4. persist `safe_head + 1` as the chain's watermark and advance
//!    `from_block` to it
//!
//! Any error aborts the pass before step 4, so the next pass re-reads the
//! identical range, also across a restart. Events already in the ledger are
//! skipped on replay.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use hermes_chain::{decode_logs, Address, ContractAbi, DecodedEvent, EventSource, RawLog};
use hermes_core::{ChallengeRef, EventKey};
use hermes_store::{ChallengeRepository, IndexerStateRepository, IndexerStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{IndexerError, IndexerResult};
use crate::fetch::ContentFetcher;
use crate::ledger::DedupLedger;
use crate::projector::{Projection, Projector};

/// Poll loop settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Sleep between passes
    pub poll_interval_secs: u64,
    /// First block when no watermark is stored
    pub start_block: u64,
    /// Max blocks per `getLogs` call
    pub max_block_range: u64,
    /// Blocks behind head left for the next pass
    pub confirmations: u64,
    /// Permanent failures before an event is quarantined, 0 disables
    pub max_event_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            start_block: 0,
            max_block_range: 9_999,
            confirmations: 0,
            max_event_attempts: 5,
        }
    }
}

impl PollConfig {
    pub fn with_start_block(mut self, block: u64) -> Self {
        self.start_block = block;
        self
    }

    pub fn with_max_block_range(mut self, range: u64) -> Self {
        self.max_block_range = range;
        self
    }

    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations;
        self
    }

    pub fn with_max_event_attempts(mut self, attempts: u32) -> Self {
        self.max_event_attempts = attempts;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Summary of one pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub from_block: u64,
    /// Last block covered, `None` when the pass had nothing to do
    pub to_block: Option<u64>,
    pub head_block: u64,
    pub challenges: usize,
    /// Events decoded from factory and challenge logs
    pub decoded: usize,
    pub applied: usize,
    /// Already in the ledger
    pub skipped: usize,
    pub quarantined: usize,
}

impl PassReport {
    fn idle(from_block: u64, head_block: u64) -> Self {
        Self {
            from_block,
            head_block,
            ..Self::default()
        }
    }

    /// Nothing to index yet
    pub fn is_idle(&self) -> bool {
        self.to_block.is_none()
    }
}

/// The indexer's poll loop
pub struct PollLoop<S, F, D>
where
    S: EventSource,
    F: ContentFetcher,
    D: IndexerStore,
{
    config: PollConfig,
    factory: Address,
    source: Arc<S>,
    store: Arc<D>,
    projector: Projector<S, F, D>,
    ledger: DedupLedger<D>,
    factory_abi: ContractAbi,
    challenge_abi: ContractAbi,
    from_block: u64,
    /// Permanent failure counts of events not yet applied
    attempts: HashMap<EventKey, u32>,
}

impl<S, F, D> PollLoop<S, F, D>
where
    S: EventSource,
    F: ContentFetcher,
    D: IndexerStore,
{
    pub fn new(
        config: PollConfig,
        chain_id: u64,
        factory: Address,
        source: Arc<S>,
        fetcher: Arc<F>,
        store: Arc<D>,
    ) -> IndexerResult<Self> {
        Ok(Self {
            from_block: config.start_block,
            config,
            factory,
            projector: Projector::new(chain_id, source.clone(), fetcher, store.clone()),
            ledger: DedupLedger::new(store.clone()),
            source,
            store,
            factory_abi: ContractAbi::factory()?,
            challenge_abi: ContractAbi::challenge()?,
            attempts: HashMap::new(),
        })
    }

    /// Next block to index
    pub fn from_block(&self) -> u64 {
        self.from_block
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Load the stored watermark, or fall back to `start_block` when no pass
    /// has completed on this chain yet.
    pub async fn resume(&mut self) -> IndexerResult<u64> {
        let chain_id = self.projector.chain_id();
        self.from_block = match self.store.get_next_block(chain_id).await? {
            Some(block) => block,
            None => self.config.start_block,
        };
        info!(from_block = self.from_block, "resuming indexer");
        Ok(self.from_block)
    }

    /// Run one pass
    pub async fn run_pass(&mut self) -> IndexerResult<PassReport> {
        let head = self.source.latest_block().await?;
        let safe_head = head.saturating_sub(self.config.confirmations);
        let from = self.from_block;

        if safe_head < from {
            debug!(from_block = from, head, safe_head, "no new blocks");
            return Ok(PassReport::idle(from, head));
        }

        let mut report = PassReport {
            from_block: from,
            to_block: Some(safe_head),
            head_block: head,
            ..PassReport::default()
        };

        let factory_logs = self.fetch_logs(self.factory, from, safe_head).await?;
        let factory_events = sorted(decode_logs(&self.factory_abi, &factory_logs)?);
        report.decoded += factory_events.len();
        for event in &factory_events {
            self.process(event, None, &mut report).await?;
        }

        let challenges = self.store.list_challenges(self.projector.chain_id()).await?;
        report.challenges = challenges.len();
        for challenge in &challenges {
            let address = Address::from_str(&challenge.contract_address).map_err(|e| {
                IndexerError::InvalidAddress(format!("{}: {e}", challenge.contract_address))
            })?;
            let logs = self.fetch_logs(address, from, safe_head).await?;
            let events = sorted(decode_logs(&self.challenge_abi, &logs)?);
            report.decoded += events.len();
            for event in &events {
                self.process(event, Some(challenge), &mut report).await?;
            }
        }

        let next_block = safe_head.saturating_add(1);
        self.store
            .set_next_block(self.projector.chain_id(), next_block)
            .await?;
        self.from_block = next_block;
        // keys left here belong to logs that are gone from the range
        self.attempts.clear();
        Ok(report)
    }

    /// Run passes forever, sleeping `poll_interval` between them.
    ///
    /// Pass failures are logged and retried from the same watermark.
    pub async fn run(&mut self) {
        info!(
            from_block = self.from_block,
            interval_secs = self.config.poll_interval_secs,
            "indexer started"
        );

        loop {
            match self.run_pass().await {
                Ok(report) if report.is_idle() => {}
                Ok(report) => info!(
                    from_block = report.from_block,
                    to_block = ?report.to_block,
                    challenges = report.challenges,
                    applied = report.applied,
                    skipped = report.skipped,
                    quarantined = report.quarantined,
                    "pass complete"
                ),
                Err(e) if e.is_ledger_conflict() => {
                    error!(error = %e, from_block = self.from_block, "ledger conflict, pass aborted")
                }
                Err(e) if e.is_retryable() => {
                    warn!(error = %e, from_block = self.from_block, "pass failed, will retry")
                }
                Err(e) => error!(error = %e, from_block = self.from_block, "pass failed"),
            }

            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    async fn fetch_logs(&self, address: Address, from: u64, to: u64) -> IndexerResult<Vec<RawLog>> {
        let span = self.config.max_block_range.max(1);
        let mut logs = Vec::new();
        let mut start = from;

        loop {
            let end = to.min(start.saturating_add(span - 1));
            logs.extend(self.source.logs(address, start, end).await?);
            if end >= to {
                break;
            }
            start = end + 1;
        }

        Ok(logs)
    }

    async fn process(
        &mut self,
        event: &DecodedEvent,
        challenge: Option<&ChallengeRef>,
        report: &mut PassReport,
    ) -> IndexerResult<()> {
        let key = event.key();
        if self.ledger.is_indexed(&key).await? {
            debug!(key = %key, event = %event.name, "already indexed");
            report.skipped += 1;
            return Ok(());
        }

        let result = match challenge {
            None => self.projector.apply_factory_event(event).await,
            Some(challenge) => self.projector.apply_challenge_event(challenge, event).await,
        };

        match result {
            Ok(projection) => {
                if let Projection::Ignored = projection {
                    debug!(key = %key, event = %event.name, "event has no projection");
                }
                self.ledger
                    .mark_indexed(&key, &event.name, event.block_number)
                    .await?;
                self.attempts.remove(&key);
                report.applied += 1;
                Ok(())
            }
            Err(e) if e.is_event_permanent() && self.config.max_event_attempts > 0 => {
                let attempts = self.attempts.entry(key.clone()).or_insert(0);
                *attempts += 1;
                let attempts = *attempts;

                if attempts < self.config.max_event_attempts {
                    warn!(
                        key = %key,
                        event = %event.name,
                        attempts,
                        max_attempts = self.config.max_event_attempts,
                        error = %e,
                        "event failed"
                    );
                    return Err(e);
                }

                error!(
                    key = %key,
                    event = %event.name,
                    block_number = event.block_number,
                    attempts,
                    error = %e,
                    "quarantining event"
                );
                self.ledger
                    .mark_quarantined(&key, &event.name, event.block_number)
                    .await?;
                self.attempts.remove(&key);
                report.quarantined += 1;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn sorted(mut events: Vec<DecodedEvent>) -> Vec<DecodedEvent> {
    events.sort_by_key(DecodedEvent::position);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockContentFetcher;
    use chrono::Utc;
    use hermes_chain::{IHermesFactory, MockEventSource, B256, U256};
    use hermes_core::{hash_key, IndexedEventRecord};
    use hermes_store::{InMemoryStore, IndexedEventRepository};

    #[test]
    fn test_poll_config_builders() {
        let config = PollConfig::default()
            .with_start_block(100)
            .with_max_block_range(10)
            .with_confirmations(3)
            .with_max_event_attempts(0);

        assert_eq!(config.start_block, 100);
        assert_eq!(config.max_block_range, 10);
        assert_eq!(config.confirmations, 3);
        assert_eq!(config.max_event_attempts, 0);
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_attempts_cleared_after_successful_pass() {
        let source = Arc::new(MockEventSource::new());
        let fetcher = Arc::new(MockContentFetcher::new());
        let store = Arc::new(InMemoryStore::new());
        let factory = Address::repeat_byte(0xfa);
        let challenge = Address::repeat_byte(0xcc);
        source.set_spec_cid(challenge, "ipfs://QmBroken");
        fetcher.insert("ipfs://QmBroken", "title: [unterminated");

        let log = RawLog::from_event(
            factory,
            &IHermesFactory::ChallengeCreated {
                id: U256::from(1u64),
                challenge,
                poster: Address::repeat_byte(0xaa),
                rewardAmount: U256::from(1_000_000u64),
            },
            5,
            B256::repeat_byte(0x01),
            0,
        );
        source.push_log(log.clone());

        let mut poll =
            PollLoop::new(PollConfig::default(), 84532, factory, source, fetcher, store.clone())
                .unwrap();
        assert!(poll.run_pass().await.unwrap_err().is_event_permanent());
        assert_eq!(poll.attempts.len(), 1);

        // settled by another writer, so the failing log is skipped from now on
        store
            .mark_event_indexed(IndexedEventRecord {
                tx_hash: hash_key(&log.tx_hash),
                log_index: log.log_index,
                event_name: "ChallengeCreated".to_string(),
                block_number: 5,
                indexed_at: Utc::now(),
            })
            .await
            .unwrap();

        let report = poll.run_pass().await.unwrap();
        assert_eq!(report.skipped, 1);
        assert!(poll.attempts.is_empty());
    }

    #[test]
    fn test_idle_report() {
        let report = PassReport::idle(10, 9);
        assert!(report.is_idle());
        assert_eq!(report.from_block, 10);
    }
}
