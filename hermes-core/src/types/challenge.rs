//! Challenge rows and lifecycle status

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Default chain id (Base Sepolia)
pub const DEFAULT_CHAIN_ID: u64 = 84532;

/// Challenge lifecycle status
///
/// ```text
/// active ──► disputed ──► finalized
///    │           │
///    ├───────────┴──────► cancelled
///    └──────────────────► finalized
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    /// Accepting submissions
    Active,
    /// A dispute was raised after scoring
    Disputed,
    /// Winner settled
    Finalized,
    /// Poster cancelled the challenge
    Cancelled,
}

impl ChallengeStatus {
    /// Status as stored in the `challenges.status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeStatus::Active => "active",
            ChallengeStatus::Disputed => "disputed",
            ChallengeStatus::Finalized => "finalized",
            ChallengeStatus::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChallengeStatus::Finalized | ChallengeStatus::Cancelled)
    }

    /// Whether `next` is a forward move from this status
    pub fn can_transition_to(&self, next: ChallengeStatus) -> bool {
        use ChallengeStatus::*;
        matches!(
            (self, next),
            (Active, Disputed)
                | (Active, Finalized)
                | (Active, Cancelled)
                | (Disputed, Finalized)
                | (Disputed, Cancelled)
        )
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChallengeStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ChallengeStatus::Active),
            "disputed" => Ok(ChallengeStatus::Disputed),
            "finalized" => Ok(ChallengeStatus::Finalized),
            "cancelled" => Ok(ChallengeStatus::Cancelled),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

/// Challenge row as written by the `ChallengeCreated` handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChallenge {
    pub chain_id: u64,
    /// Lowercase 0x-prefixed challenge contract address
    pub contract_address: String,
    /// Factory-assigned sequential id
    pub factory_challenge_id: u64,
    pub poster_address: String,
    pub title: String,
    pub description: String,
    pub domain: String,
    pub challenge_type: String,
    /// Content-addressed URI of the YAML spec
    pub spec_cid: String,
    pub dataset_train_cid: Option<String>,
    pub dataset_test_cid: Option<String>,
    pub scoring_container: String,
    pub scoring_metric: String,
    pub minimum_score: Option<Decimal>,
    /// Reward in USDC (on-chain units / 10^6)
    pub reward_amount: Decimal,
    pub distribution_type: String,
    pub deadline: DateTime<Utc>,
    pub dispute_window_hours: u32,
    pub max_submissions_per_wallet: u32,
    pub tx_hash: String,
}

/// Stored challenge row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeRecord {
    pub id: Uuid,
    pub chain_id: u64,
    pub contract_address: String,
    pub factory_challenge_id: u64,
    pub poster_address: String,
    pub title: String,
    pub description: String,
    pub domain: String,
    pub challenge_type: String,
    pub spec_cid: String,
    pub dataset_train_cid: Option<String>,
    pub dataset_test_cid: Option<String>,
    pub scoring_container: String,
    pub scoring_metric: String,
    pub minimum_score: Option<Decimal>,
    pub reward_amount: Decimal,
    pub distribution_type: String,
    pub deadline: DateTime<Utc>,
    pub dispute_window_hours: u32,
    pub max_submissions_per_wallet: u32,
    pub status: ChallengeStatus,
    pub tx_hash: String,
    pub finalized_at: Option<DateTime<Utc>>,
    pub winner_on_chain_sub_id: Option<u64>,
    pub winner_submission_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChallengeRecord {
    /// Build a fresh `active` row
    pub fn create(new: NewChallenge, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            chain_id: new.chain_id,
            contract_address: new.contract_address,
            factory_challenge_id: new.factory_challenge_id,
            poster_address: new.poster_address,
            title: new.title,
            description: new.description,
            domain: new.domain,
            challenge_type: new.challenge_type,
            spec_cid: new.spec_cid,
            dataset_train_cid: new.dataset_train_cid,
            dataset_test_cid: new.dataset_test_cid,
            scoring_container: new.scoring_container,
            scoring_metric: new.scoring_metric,
            minimum_score: new.minimum_score,
            reward_amount: new.reward_amount,
            distribution_type: new.distribution_type,
            deadline: new.deadline,
            dispute_window_hours: new.dispute_window_hours,
            max_submissions_per_wallet: new.max_submissions_per_wallet,
            status: ChallengeStatus::Active,
            tx_hash: new.tx_hash,
            finalized_at: None,
            winner_on_chain_sub_id: None,
            winner_submission_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a conflicting upsert on `(chain_id, factory_challenge_id)`.
    ///
    /// `id`, `contract_address`, `spec_cid` and `status` are immutable here;
    /// everything else reflects the latest write.
    pub fn apply_upsert(&mut self, new: NewChallenge, now: DateTime<Utc>) {
        self.poster_address = new.poster_address;
        self.title = new.title;
        self.description = new.description;
        self.domain = new.domain;
        self.challenge_type = new.challenge_type;
        self.dataset_train_cid = new.dataset_train_cid;
        self.dataset_test_cid = new.dataset_test_cid;
        self.scoring_container = new.scoring_container;
        self.scoring_metric = new.scoring_metric;
        self.minimum_score = new.minimum_score;
        self.reward_amount = new.reward_amount;
        self.distribution_type = new.distribution_type;
        self.deadline = new.deadline;
        self.dispute_window_hours = new.dispute_window_hours;
        self.max_submissions_per_wallet = new.max_submissions_per_wallet;
        self.tx_hash = new.tx_hash;
        self.updated_at = now;
    }

    /// Move to `next`.
    ///
    /// Returns `Ok(false)` when already in `next`.
    pub fn transition(&mut self, next: ChallengeStatus, now: DateTime<Utc>) -> CoreResult<bool> {
        if self.status == next {
            return Ok(false);
        }
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(true)
    }

    /// Settle the challenge with its winner
    pub fn finalize(&mut self, settlement: &Settlement, now: DateTime<Utc>) -> CoreResult<bool> {
        let changed = self.transition(ChallengeStatus::Finalized, now)?;
        if changed {
            self.finalized_at = Some(settlement.finalized_at);
            self.winner_on_chain_sub_id = settlement.winner_on_chain_sub_id;
            self.winner_submission_id = settlement.winner_submission_id;
        }
        Ok(changed)
    }

    /// Listing projection
    pub fn to_ref(&self) -> ChallengeRef {
        ChallengeRef {
            id: self.id,
            contract_address: self.contract_address.clone(),
        }
    }
}

/// Finalization outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub finalized_at: DateTime<Utc>,
    pub winner_on_chain_sub_id: Option<u64>,
    /// Store id of the winning submission row, if indexed
    pub winner_submission_id: Option<Uuid>,
}

/// Minimal challenge identity used to drive per-challenge log fetches
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChallengeRef {
    pub id: Uuid,
    pub contract_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_new_challenge() -> NewChallenge {
        NewChallenge {
            chain_id: DEFAULT_CHAIN_ID,
            contract_address: "0xcc00000000000000000000000000000000000001".to_string(),
            factory_challenge_id: 7,
            poster_address: "0xaa00000000000000000000000000000000000001".to_string(),
            title: "Predict aging clocks".to_string(),
            description: "Reproduce the epigenetic clock".to_string(),
            domain: "longevity".to_string(),
            challenge_type: "prediction".to_string(),
            spec_cid: "ipfs://Qm1".to_string(),
            dataset_train_cid: Some("ipfs://QmTrain".to_string()),
            dataset_test_cid: Some("ipfs://QmTest".to_string()),
            scoring_container: "ghcr.io/hermes/scorer:1".to_string(),
            scoring_metric: "rmse".to_string(),
            minimum_score: None,
            reward_amount: Decimal::from(10),
            distribution_type: "winner_take_all".to_string(),
            deadline: Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap(),
            dispute_window_hours: 48,
            max_submissions_per_wallet: 3,
            tx_hash: "0x01".to_string(),
        }
    }

    #[test]
    fn test_forward_transitions() {
        use ChallengeStatus::*;
        assert!(Active.can_transition_to(Disputed));
        assert!(Active.can_transition_to(Finalized));
        assert!(Disputed.can_transition_to(Finalized));
        assert!(!Finalized.can_transition_to(Active));
        assert!(!Cancelled.can_transition_to(Finalized));
        assert!(!Disputed.can_transition_to(Active));
        assert!(Finalized.is_terminal());
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            ChallengeStatus::Active,
            ChallengeStatus::Disputed,
            ChallengeStatus::Finalized,
            ChallengeStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<ChallengeStatus>().unwrap(), status);
        }
        assert!("scoring".parse::<ChallengeStatus>().is_err());
    }

    #[test]
    fn test_upsert_keeps_immutable_fields() {
        let now = Utc::now();
        let mut record = ChallengeRecord::create(sample_new_challenge(), now);
        record.transition(ChallengeStatus::Disputed, now).unwrap();
        let id = record.id;

        let mut replay = sample_new_challenge();
        replay.contract_address = "0xdead".to_string();
        replay.spec_cid = "ipfs://other".to_string();
        replay.poster_address = "0xbb".to_string();
        record.apply_upsert(replay, now);

        assert_eq!(record.id, id);
        assert_eq!(record.contract_address, "0xcc00000000000000000000000000000000000001");
        assert_eq!(record.spec_cid, "ipfs://Qm1");
        assert_eq!(record.status, ChallengeStatus::Disputed);
        assert_eq!(record.poster_address, "0xbb");
    }

    #[test]
    fn test_transition_same_status_is_noop() {
        let now = Utc::now();
        let mut record = ChallengeRecord::create(sample_new_challenge(), now);
        assert!(!record.transition(ChallengeStatus::Active, now).unwrap());
        assert!(record.transition(ChallengeStatus::Cancelled, now).unwrap());
        assert!(matches!(
            record.transition(ChallengeStatus::Active, now),
            Err(CoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_finalize_sets_winner_once() {
        let now = Utc::now();
        let mut record = ChallengeRecord::create(sample_new_challenge(), now);
        let settlement = Settlement {
            finalized_at: now,
            winner_on_chain_sub_id: Some(3),
            winner_submission_id: None,
        };
        assert!(record.finalize(&settlement, now).unwrap());
        assert_eq!(record.winner_on_chain_sub_id, Some(3));

        let other = Settlement {
            winner_on_chain_sub_id: Some(4),
            ..settlement
        };
        assert!(!record.finalize(&other, now).unwrap());
        assert_eq!(record.winner_on_chain_sub_id, Some(3));
    }
}
