//! Shared fixtures for indexer integration tests

#![allow(dead_code)]

use std::sync::Arc;

use hermes_chain::{
    decode_logs, Address, ContractAbi, DecodedEvent, IHermesChallenge, IHermesFactory,
    MockEventSource, OnChainSubmission, RawLog, B256, U256,
};
use hermes_indexer::{MockContentFetcher, PollConfig, PollLoop, Projector};
use hermes_store::InMemoryStore;

pub const CHAIN_ID: u64 = 84532;

pub const SPEC_YAML: &str = r#"
id: ligand-affinity-01
title: Predict ligand affinity
domain: drug_discovery
type: prediction
description: Rank compounds by predicted binding affinity.
dataset:
  train: ipfs://QmTrain
  test: ipfs://QmTest
scoring:
  container: ghcr.io/hermes/scorer:1
  metric: spearman
reward:
  total: 1234.5
  distribution: winner_take_all
deadline: "2026-12-31T00:00:00Z"
minimum_score: 0.5
dispute_window_hours: 72
tags: [chemistry]
"#;

pub const INVALID_SPEC_YAML: &str = r#"
title: ""
domain: astrology
type: prediction
description: Missing most fields.
"#;

pub type TestLoop = PollLoop<MockEventSource, MockContentFetcher, InMemoryStore>;
pub type TestProjector = Projector<MockEventSource, MockContentFetcher, InMemoryStore>;

pub fn factory() -> Address {
    Address::from([0xfa; 20])
}

pub fn challenge_address(n: u8) -> Address {
    Address::from([0xcc - n; 20])
}

pub fn poster(n: u8) -> Address {
    Address::from([0xaa - n; 20])
}

pub fn solver(n: u8) -> Address {
    Address::from([0xbb - n; 20])
}

/// Distinct transaction hash per event
pub fn tx(n: u64) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&n.to_be_bytes());
    B256::from(bytes)
}

pub struct Harness {
    pub source: Arc<MockEventSource>,
    pub fetcher: Arc<MockContentFetcher>,
    pub store: Arc<InMemoryStore>,
    next_tx: std::sync::atomic::AtomicU64,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            source: Arc::new(MockEventSource::new()),
            fetcher: Arc::new(MockContentFetcher::new()),
            store: Arc::new(InMemoryStore::new()),
            next_tx: std::sync::atomic::AtomicU64::new(1),
        }
    }

    fn tx(&self) -> B256 {
        tx(self
            .next_tx
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst))
    }

    pub fn poll_loop(&self, config: PollConfig) -> TestLoop {
        PollLoop::new(
            config,
            CHAIN_ID,
            factory(),
            self.source.clone(),
            self.fetcher.clone(),
            self.store.clone(),
        )
        .unwrap()
    }

    pub fn projector(&self) -> TestProjector {
        Projector::new(
            CHAIN_ID,
            self.source.clone(),
            self.fetcher.clone(),
            self.store.clone(),
        )
    }

    /// Publish a spec document and point the challenge contract at it
    pub fn publish_spec(&self, challenge: Address, cid: &str, yaml: &str) {
        self.source.set_spec_cid(challenge, cid);
        self.fetcher.insert(cid, yaml);
    }

    /// Emit `ChallengeCreated` from the factory
    pub fn challenge_created(
        &self,
        id: u64,
        challenge: Address,
        poster: Address,
        reward: u64,
        block: u64,
    ) -> RawLog {
        let log = RawLog::from_event(
            factory(),
            &IHermesFactory::ChallengeCreated {
                id: U256::from(id),
                challenge,
                poster,
                rewardAmount: U256::from(reward),
            },
            block,
            self.tx(),
            0,
        );
        self.source.push_log(log.clone());
        log
    }

    /// Record an unscored submission on chain and emit `Submitted`
    pub fn submitted(&self, challenge: Address, sub_id: u64, solver: Address, block: u64) -> RawLog {
        self.source
            .set_submission(challenge, sub_id, unscored(solver, sub_id));
        self.submitted_log(challenge, sub_id, solver, block)
    }

    /// Emit `Submitted` while `getSubmission` still has no record for it
    pub fn submitted_log(
        &self,
        challenge: Address,
        sub_id: u64,
        solver: Address,
        block: u64,
    ) -> RawLog {
        let log = RawLog::from_event(
            challenge,
            &IHermesChallenge::Submitted {
                subId: U256::from(sub_id),
                solver,
                resultHash: B256::repeat_byte(0x11),
            },
            block,
            self.tx(),
            1,
        );
        self.source.push_log(log.clone());
        log
    }

    /// Mark the on-chain submission scored and emit `Scored`
    pub fn scored(
        &self,
        challenge: Address,
        sub_id: u64,
        solver: Address,
        score: U256,
        block: u64,
    ) -> RawLog {
        self.source.set_submission(
            challenge,
            sub_id,
            OnChainSubmission {
                solver,
                result_hash: B256::repeat_byte(0x11),
                proof_bundle_hash: B256::repeat_byte(0xdd),
                score,
                submitted_at: 1_700_000_100 + sub_id,
                scored: true,
            },
        );
        let log = RawLog::from_event(
            challenge,
            &IHermesChallenge::Scored {
                subId: U256::from(sub_id),
                score,
                proofBundleHash: B256::repeat_byte(0xdd),
            },
            block,
            self.tx(),
            2,
        );
        self.source.push_log(log.clone());
        log
    }

    pub fn disputed(&self, challenge: Address, block: u64) -> RawLog {
        let log = RawLog::from_event(
            challenge,
            &IHermesChallenge::Disputed {
                disputer: poster(1),
                reason: "scorer mismatch".to_string(),
            },
            block,
            self.tx(),
            0,
        );
        self.source.push_log(log.clone());
        log
    }

    pub fn finalized(&self, challenge: Address, winner: u64, block: u64) -> RawLog {
        self.source.set_winner(challenge, winner);
        let log = RawLog::from_event(
            challenge,
            &IHermesChallenge::Finalized {
                winnerSubId: U256::from(winner),
            },
            block,
            self.tx(),
            0,
        );
        self.source.push_log(log.clone());
        log
    }

    pub fn dispute_resolved(&self, challenge: Address, winner: u64, block: u64) -> RawLog {
        let log = RawLog::from_event(
            challenge,
            &IHermesChallenge::DisputeResolved {
                winnerSubId: U256::from(winner),
            },
            block,
            self.tx(),
            0,
        );
        self.source.push_log(log.clone());
        log
    }

    pub fn cancelled(&self, challenge: Address, block: u64) -> RawLog {
        let log = RawLog::from_event(
            challenge,
            &IHermesChallenge::Cancelled {},
            block,
            self.tx(),
            0,
        );
        self.source.push_log(log.clone());
        log
    }
}

/// On-chain view of a submission that has not been scored
pub fn unscored(solver: Address, sub_id: u64) -> OnChainSubmission {
    OnChainSubmission {
        solver,
        result_hash: B256::repeat_byte(0x11),
        proof_bundle_hash: B256::ZERO,
        score: U256::ZERO,
        submitted_at: 1_700_000_100 + sub_id,
        scored: false,
    }
}

pub fn decode_factory(log: &RawLog) -> DecodedEvent {
    let abi = ContractAbi::factory().unwrap();
    decode_logs(&abi, std::slice::from_ref(log))
        .unwrap()
        .remove(0)
}

pub fn decode_challenge(log: &RawLog) -> DecodedEvent {
    let abi = ContractAbi::challenge().unwrap();
    decode_logs(&abi, std::slice::from_ref(log))
        .unwrap()
        .remove(0)
}
