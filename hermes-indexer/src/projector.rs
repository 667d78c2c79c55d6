//! Challenge/Submission Projector
//!
//! Applies decoded events to the store. Every handler re-reads the
//! authoritative on-chain state it needs, so handlers converge regardless
//! of the order in which they are replayed.
//!
//! | Event | Effect |
//! |---|---|
//! | `ChallengeCreated` | upsert challenge from the resolved spec, status `active` |
//! | `Submitted` | upsert submission from `getSubmission` |
//! | `Scored` | upsert submission as scored, then mirror a score update |
//! | `Finalized` | settle with `winningSubmissionId` |
//! | `DisputeResolved` | settle with the winner carried by the event |
//! | `Disputed` / `Cancelled` | status transition |
//!
//! Backward status transitions are logged and treated as applied.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hermes_chain::{args, ChainError, DecodedEvent, EventSource, OnChainSubmission};
use hermes_core::{
    address_key, hash_key, usdc_from_units, ChallengeRecord, ChallengeRef, ChallengeStatus,
    NewChallenge, ScoreUpdate, Settlement, SubmissionRecord, SubmissionUpsert, Wad,
};
use hermes_store::{ChallengeRepository, IndexerStore, StoreError, SubmissionRepository};
use tracing::{debug, info, warn};

use crate::error::{IndexerError, IndexerResult};
use crate::fetch::ContentFetcher;
use crate::resolver::SpecResolver;

/// Outcome of one applied event
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Challenge(ChallengeRecord),
    Submission(SubmissionRecord),
    Status(ChallengeRecord),
    /// Backward transition, left as is
    TransitionRejected {
        from: ChallengeStatus,
        to: ChallengeStatus,
    },
    /// Known event without a projection
    Ignored,
}

/// Event projector
pub struct Projector<S, F, D>
where
    S: EventSource,
    F: ContentFetcher,
    D: IndexerStore,
{
    chain_id: u64,
    source: Arc<S>,
    resolver: SpecResolver<F>,
    store: Arc<D>,
}

impl<S, F, D> Projector<S, F, D>
where
    S: EventSource,
    F: ContentFetcher,
    D: IndexerStore,
{
    pub fn new(chain_id: u64, source: Arc<S>, fetcher: Arc<F>, store: Arc<D>) -> Self {
        Self {
            chain_id,
            source,
            resolver: SpecResolver::new(fetcher),
            store,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Apply an event emitted by the factory
    pub async fn apply_factory_event(&self, event: &DecodedEvent) -> IndexerResult<Projection> {
        match event.name.as_str() {
            "ChallengeCreated" => Ok(Projection::Challenge(self.on_challenge_created(event).await?)),
            other => {
                debug!(event = other, "no factory handler");
                Ok(Projection::Ignored)
            }
        }
    }

    /// Apply an event emitted by a challenge contract
    pub async fn apply_challenge_event(
        &self,
        challenge: &ChallengeRef,
        event: &DecodedEvent,
    ) -> IndexerResult<Projection> {
        match event.name.as_str() {
            "Submitted" => Ok(Projection::Submission(
                self.on_submitted(challenge, event).await?,
            )),
            "Scored" => Ok(Projection::Submission(self.on_scored(challenge, event).await?)),
            "Finalized" => self.on_finalized(challenge, event).await,
            "DisputeResolved" => self.on_dispute_resolved(challenge, event).await,
            "Disputed" => self.transition(challenge, ChallengeStatus::Disputed).await,
            "Cancelled" => self.transition(challenge, ChallengeStatus::Cancelled).await,
            other => {
                debug!(event = other, challenge = %challenge.contract_address, "no challenge handler");
                Ok(Projection::Ignored)
            }
        }
    }

    // ========================================================================
    // Handlers
    // ========================================================================

    /// `ChallengeCreated(id, challenge, poster, rewardAmount)`
    pub async fn on_challenge_created(&self, event: &DecodedEvent) -> IndexerResult<ChallengeRecord> {
        let factory_challenge_id = event.uint_u64(args::CHALLENGE_ID)?;
        let contract = event.address(args::CHALLENGE_ADDRESS)?;
        let poster = event.address(args::POSTER)?;
        let reward_amount = usdc_from_units(event.uint(args::REWARD)?)?;

        let spec_cid = self.source.spec_cid(contract).await?;
        let spec = self.resolver.resolve(&spec_cid).await?;
        let deadline = spec
            .deadline_utc()
            .map_err(|source| IndexerError::SpecInvalid {
                uri: spec_cid.clone(),
                source,
            })?;

        let new = NewChallenge {
            chain_id: self.chain_id,
            contract_address: address_key(&contract),
            factory_challenge_id,
            poster_address: address_key(&poster),
            title: spec.title.clone(),
            description: spec.description.clone(),
            domain: spec.domain.as_str().to_string(),
            challenge_type: spec.challenge_type.as_str().to_string(),
            spec_cid,
            dataset_train_cid: Some(spec.dataset.train.clone()),
            dataset_test_cid: Some(spec.dataset.test.clone()),
            scoring_container: spec.scoring.container.clone(),
            scoring_metric: spec.scoring.metric.as_str().to_string(),
            minimum_score: spec.minimum_score,
            reward_amount,
            distribution_type: spec.reward.distribution.as_str().to_string(),
            deadline,
            dispute_window_hours: spec.dispute_window_hours(),
            max_submissions_per_wallet: spec.max_submissions_per_wallet(),
            tx_hash: hash_key(&event.tx_hash),
        };

        let record = self.store.upsert_challenge(new).await?;
        info!(
            challenge_id = %record.id,
            factory_challenge_id,
            contract = %record.contract_address,
            reward = %record.reward_amount,
            "challenge indexed"
        );
        Ok(record)
    }

    /// `Submitted(subId, ...)`: the row is built from `getSubmission`
    pub async fn on_submitted(
        &self,
        challenge: &ChallengeRef,
        event: &DecodedEvent,
    ) -> IndexerResult<SubmissionRecord> {
        let sub_id = event.uint_u64(args::SUBMISSION_ID)?;
        let onchain = self.source.submission(event.address, sub_id).await?;

        let upsert = SubmissionUpsert {
            score: onchain.scored.then(|| Wad::from_raw(onchain.score)),
            scored: onchain.scored,
            scored_at: None,
            result_cid: None,
            proof_bundle_cid: None,
            ..base_upsert(challenge, sub_id, &onchain, event)?
        };

        let record = self.store.upsert_submission(upsert).await?;
        info!(
            challenge_id = %challenge.id,
            on_chain_sub_id = sub_id,
            solver = %record.solver_address,
            scored = record.scored,
            "submission indexed"
        );
        Ok(record)
    }

    /// `Scored(subId, score, proofBundleHash)`
    pub async fn on_scored(
        &self,
        challenge: &ChallengeRef,
        event: &DecodedEvent,
    ) -> IndexerResult<SubmissionRecord> {
        let sub_id = event.uint_u64(args::SUBMISSION_ID)?;
        let score = Wad::from_raw(event.uint(args::SCORE)?);
        let proof_bundle_hash = hash_key(&event.bytes32(args::PROOF_BUNDLE_HASH)?);

        let onchain = self.source.submission(event.address, sub_id).await?;
        let existing = self
            .store
            .get_submission_by_chain_id(challenge.id, sub_id)
            .await?;
        let scored_at = Utc::now();

        let base = base_upsert(challenge, sub_id, &onchain, event)?;
        let (tx_hash, result_cid, proof_bundle_cid) = match existing {
            Some(row) => (
                non_empty_or(row.tx_hash, base.tx_hash.clone()),
                row.result_cid,
                row.proof_bundle_cid,
            ),
            None => (base.tx_hash.clone(), None, None),
        };

        let upsert = SubmissionUpsert {
            proof_bundle_hash: proof_bundle_hash.clone(),
            score: Some(score),
            scored: true,
            scored_at: Some(scored_at),
            tx_hash,
            result_cid,
            proof_bundle_cid: proof_bundle_cid.clone(),
            ..base
        };
        let record = self.store.upsert_submission(upsert).await?;

        self.store
            .update_score(ScoreUpdate {
                submission_id: record.id,
                score,
                proof_bundle_cid,
                proof_bundle_hash,
                scored_at,
            })
            .await?;

        info!(
            challenge_id = %challenge.id,
            on_chain_sub_id = sub_id,
            score = %score,
            "submission scored"
        );
        Ok(self.store.get_submission_required(record.id).await?)
    }

    /// `Finalized(winnerSubId)`: the winner is read back from the contract
    pub async fn on_finalized(
        &self,
        challenge: &ChallengeRef,
        event: &DecodedEvent,
    ) -> IndexerResult<Projection> {
        let winner = self.source.winning_submission_id(event.address).await?;
        self.settle(challenge, winner, event.block_number).await
    }

    /// `DisputeResolved(winnerSubId)`
    pub async fn on_dispute_resolved(
        &self,
        challenge: &ChallengeRef,
        event: &DecodedEvent,
    ) -> IndexerResult<Projection> {
        let winner = event.uint_u64(args::WINNER)?;
        self.settle(challenge, winner, event.block_number).await
    }

    async fn settle(
        &self,
        challenge: &ChallengeRef,
        winner: u64,
        block_number: u64,
    ) -> IndexerResult<Projection> {
        let finalized_at = self.source.block_timestamp(block_number).await?;
        let winner_row = self
            .store
            .get_submission_by_chain_id(challenge.id, winner)
            .await?;

        let settlement = Settlement {
            finalized_at,
            winner_on_chain_sub_id: Some(winner),
            winner_submission_id: winner_row.map(|row| row.id),
        };

        match self
            .store
            .set_challenge_finalized(challenge.id, settlement)
            .await
        {
            Ok(record) => {
                info!(
                    challenge_id = %challenge.id,
                    winner_on_chain_sub_id = winner,
                    "challenge finalized"
                );
                Ok(Projection::Status(record))
            }
            Err(e) => rejected_transition(challenge, e),
        }
    }

    async fn transition(
        &self,
        challenge: &ChallengeRef,
        status: ChallengeStatus,
    ) -> IndexerResult<Projection> {
        match self.store.update_challenge_status(challenge.id, status).await {
            Ok(record) => {
                info!(challenge_id = %challenge.id, status = %status, "challenge status updated");
                Ok(Projection::Status(record))
            }
            Err(e) => rejected_transition(challenge, e),
        }
    }
}

fn rejected_transition(challenge: &ChallengeRef, err: StoreError) -> IndexerResult<Projection> {
    match err {
        StoreError::InvalidTransition { from, to } => {
            warn!(
                challenge_id = %challenge.id,
                contract = %challenge.contract_address,
                from = %from,
                to = %to,
                "status transition rejected"
            );
            Ok(Projection::TransitionRejected { from, to })
        }
        other => Err(other.into()),
    }
}

/// Fields common to both submission handlers, taken from the on-chain record
fn base_upsert(
    challenge: &ChallengeRef,
    sub_id: u64,
    onchain: &OnChainSubmission,
    event: &DecodedEvent,
) -> IndexerResult<SubmissionUpsert> {
    Ok(SubmissionUpsert {
        challenge_id: challenge.id,
        on_chain_sub_id: sub_id,
        solver_address: address_key(&onchain.solver),
        result_hash: hash_key(&onchain.result_hash),
        result_cid: None,
        proof_bundle_hash: hash_key(&onchain.proof_bundle_hash),
        proof_bundle_cid: None,
        score: None,
        scored: false,
        submitted_at: unix_time(event, onchain.submitted_at)?,
        scored_at: None,
        tx_hash: hash_key(&event.tx_hash),
    })
}

fn unix_time(event: &DecodedEvent, seconds: u64) -> IndexerResult<DateTime<Utc>> {
    i64::try_from(seconds)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or_else(|| {
            ChainError::contract_read(
                address_key(&event.address),
                "getSubmission",
                format!("submittedAt out of range: {seconds}"),
            )
            .into()
        })
}

fn non_empty_or(value: String, fallback: String) -> String {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}
