//! Submission rows and the merge rule used by every store backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::amount::Wad;
use crate::error::{CoreError, CoreResult};

/// Submission write produced by the `Submitted` and `Scored` handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionUpsert {
    pub challenge_id: Uuid,
    pub on_chain_sub_id: u64,
    pub solver_address: String,
    pub result_hash: String,
    pub result_cid: Option<String>,
    pub proof_bundle_hash: String,
    pub proof_bundle_cid: Option<String>,
    pub score: Option<Wad>,
    pub scored: bool,
    pub submitted_at: DateTime<Utc>,
    pub scored_at: Option<DateTime<Utc>>,
    pub tx_hash: String,
}

impl SubmissionUpsert {
    /// `scored` requires a score
    pub fn validate(&self) -> CoreResult<()> {
        if self.scored && self.score.is_none() {
            return Err(CoreError::invariant(format!(
                "submission {} of challenge {} is scored without a score",
                self.on_chain_sub_id, self.challenge_id
            )));
        }
        Ok(())
    }
}

/// Stored submission row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub on_chain_sub_id: u64,
    pub solver_address: String,
    pub result_hash: String,
    /// Set by the submission-confirmation path, never by the indexer
    pub result_cid: Option<String>,
    pub proof_bundle_hash: String,
    pub proof_bundle_cid: Option<String>,
    pub score: Option<Wad>,
    pub scored: bool,
    pub submitted_at: DateTime<Utc>,
    pub scored_at: Option<DateTime<Utc>>,
    pub tx_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubmissionRecord {
    /// Build a fresh row from its first write
    pub fn create(upsert: SubmissionUpsert, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            challenge_id: upsert.challenge_id,
            on_chain_sub_id: upsert.on_chain_sub_id,
            solver_address: upsert.solver_address,
            result_hash: upsert.result_hash,
            result_cid: upsert.result_cid,
            proof_bundle_hash: upsert.proof_bundle_hash,
            proof_bundle_cid: upsert.proof_bundle_cid,
            score: upsert.score,
            scored: upsert.scored,
            submitted_at: upsert.submitted_at,
            scored_at: upsert.scored_at,
            tx_hash: upsert.tx_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a conflicting write on `(challenge_id, on_chain_sub_id)`.
    ///
    /// - `solver_address` and `tx_hash` keep the first non-empty value
    /// - `result_cid` and `proof_bundle_cid` prefer the existing non-null value
    /// - `scored` never goes back to false; an unscored write keeps the
    ///   existing score, proof hash and `scored_at`
    pub fn merge(&mut self, upsert: SubmissionUpsert, now: DateTime<Utc>) {
        if self.solver_address.is_empty() {
            self.solver_address = upsert.solver_address;
        }
        if self.tx_hash.is_empty() {
            self.tx_hash = upsert.tx_hash;
        }
        if !upsert.result_hash.is_empty() {
            self.result_hash = upsert.result_hash;
        }
        if self.result_cid.is_none() {
            self.result_cid = upsert.result_cid;
        }
        if self.proof_bundle_cid.is_none() {
            self.proof_bundle_cid = upsert.proof_bundle_cid;
        }

        if upsert.scored || !self.scored {
            self.proof_bundle_hash = upsert.proof_bundle_hash;
            self.score = upsert.score;
            self.scored = upsert.scored;
            self.scored_at = upsert.scored_at.or(self.scored_at);
        }

        self.submitted_at = upsert.submitted_at;
        self.updated_at = now;
    }

    /// Apply a score update record
    pub fn apply_score(&mut self, update: &ScoreUpdate) {
        self.score = Some(update.score);
        self.scored = true;
        self.proof_bundle_hash = update.proof_bundle_hash.clone();
        if update.proof_bundle_cid.is_some() {
            self.proof_bundle_cid = update.proof_bundle_cid.clone();
        }
        self.scored_at = Some(update.scored_at);
        self.updated_at = update.scored_at;
    }
}

/// Secondary score write mirrored onto an existing submission row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreUpdate {
    pub submission_id: Uuid,
    pub score: Wad,
    pub proof_bundle_cid: Option<String>,
    pub proof_bundle_hash: String,
    pub scored_at: DateTime<Utc>,
}
