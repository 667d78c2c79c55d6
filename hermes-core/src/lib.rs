//! Hermes Core
//!
//! Domain model shared by the Hermes indexer crates.
//!
//! # Rows
//!
//! - [`ChallengeRecord`]: one on-chain bounty, unique per `(chain_id, factory_challenge_id)`
//! - [`SubmissionRecord`]: one solver result, unique per `(challenge_id, on_chain_sub_id)`
//! - [`IndexedEventRecord`]: dedup ledger entry, unique per `(tx_hash, log_index)`
//!
//! # Amounts
//!
//! Rewards arrive as 6-decimal USDC integers and scores as 18-decimal WAD
//! integers. See [`types::amount`].
//!
//! # Challenge specs
//!
//! [`ChallengeSpec`] is the YAML document referenced by a challenge's
//! `specCid`, with schema validation.

pub mod error;
pub mod spec;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use spec::{
    ChallengeSpec, ChallengeType, DatasetSpec, Domain, RewardDistribution, RewardSpec,
    ScoringMetric, ScoringSpec,
};
pub use types::{
    address_key, hash_key, usdc_from_units, ChallengeRecord, ChallengeRef, ChallengeStatus,
    EventKey, IndexedEventRecord, NewChallenge, ScoreUpdate, Settlement, SubmissionRecord,
    SubmissionUpsert, Wad, DEFAULT_CHAIN_ID, QUARANTINE_SUFFIX,
};
