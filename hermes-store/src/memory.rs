//! In-memory store
//!
//! Same semantics as the Postgres store, including unique keys and merge
//! rules. Used by tests and by `--store memory` local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use hermes_core::{
    ChallengeRecord, ChallengeRef, ChallengeStatus, EventKey, IndexedEventRecord, NewChallenge,
    ScoreUpdate, Settlement, SubmissionRecord, SubmissionUpsert,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::repos::{
    ChallengeRepository, IndexedEventRepository, IndexerStateRepository, SubmissionRepository,
};

/// In-memory implementation of every repository
#[derive(Default)]
pub struct InMemoryStore {
    challenges: RwLock<HashMap<Uuid, ChallengeRecord>>,
    submissions: RwLock<HashMap<Uuid, SubmissionRecord>>,
    events: RwLock<HashMap<EventKey, IndexedEventRecord>>,
    watermarks: RwLock<HashMap<u64, u64>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of challenge rows
    pub async fn challenge_count(&self) -> usize {
        self.challenges.read().await.len()
    }

    /// Number of submission rows
    pub async fn submission_count(&self) -> usize {
        self.submissions.read().await.len()
    }

    /// All ledger rows, ordered by block then log index
    pub async fn indexed_events(&self) -> Vec<IndexedEventRecord> {
        let mut events: Vec<_> = self.events.read().await.values().cloned().collect();
        events.sort_by_key(|e| (e.block_number, e.log_index));
        events
    }
}

#[async_trait]
impl ChallengeRepository for InMemoryStore {
    async fn upsert_challenge(&self, challenge: NewChallenge) -> StoreResult<ChallengeRecord> {
        let mut challenges = self.challenges.write().await;
        let now = Utc::now();

        let existing = challenges.values_mut().find(|c| {
            c.chain_id == challenge.chain_id
                && c.factory_challenge_id == challenge.factory_challenge_id
        });

        if let Some(record) = existing {
            record.apply_upsert(challenge, now);
            return Ok(record.clone());
        }

        if challenges.values().any(|c| {
            c.chain_id == challenge.chain_id && c.contract_address == challenge.contract_address
        }) {
            return Err(StoreError::duplicate("Challenge", &challenge.contract_address));
        }

        let record = ChallengeRecord::create(challenge, now);
        challenges.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_challenge(&self, id: Uuid) -> StoreResult<Option<ChallengeRecord>> {
        Ok(self.challenges.read().await.get(&id).cloned())
    }

    async fn get_challenge_by_factory_id(
        &self,
        chain_id: u64,
        factory_challenge_id: u64,
    ) -> StoreResult<Option<ChallengeRecord>> {
        Ok(self
            .challenges
            .read()
            .await
            .values()
            .find(|c| c.chain_id == chain_id && c.factory_challenge_id == factory_challenge_id)
            .cloned())
    }

    async fn list_challenges(&self, chain_id: u64) -> StoreResult<Vec<ChallengeRef>> {
        let challenges = self.challenges.read().await;
        let mut rows: Vec<&ChallengeRecord> =
            challenges.values().filter(|c| c.chain_id == chain_id).collect();
        rows.sort_by_key(|c| c.factory_challenge_id);
        Ok(rows.into_iter().map(ChallengeRecord::to_ref).collect())
    }

    async fn update_challenge_status(
        &self,
        id: Uuid,
        status: ChallengeStatus,
    ) -> StoreResult<ChallengeRecord> {
        let mut challenges = self.challenges.write().await;
        let record = challenges
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Challenge", id))?;
        record.transition(status, Utc::now())?;
        Ok(record.clone())
    }

    async fn set_challenge_finalized(
        &self,
        id: Uuid,
        settlement: Settlement,
    ) -> StoreResult<ChallengeRecord> {
        let mut challenges = self.challenges.write().await;
        let record = challenges
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Challenge", id))?;
        record.finalize(&settlement, Utc::now())?;
        Ok(record.clone())
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryStore {
    async fn upsert_submission(
        &self,
        submission: SubmissionUpsert,
    ) -> StoreResult<SubmissionRecord> {
        submission.validate()?;

        if !self
            .challenges
            .read()
            .await
            .contains_key(&submission.challenge_id)
        {
            return Err(StoreError::not_found("Challenge", submission.challenge_id));
        }

        let mut submissions = self.submissions.write().await;
        let now = Utc::now();

        let existing = submissions.values_mut().find(|s| {
            s.challenge_id == submission.challenge_id
                && s.on_chain_sub_id == submission.on_chain_sub_id
        });

        if let Some(record) = existing {
            record.merge(submission, now);
            return Ok(record.clone());
        }

        let record = SubmissionRecord::create(submission, now);
        submissions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_submission(&self, id: Uuid) -> StoreResult<Option<SubmissionRecord>> {
        Ok(self.submissions.read().await.get(&id).cloned())
    }

    async fn get_submission_by_chain_id(
        &self,
        challenge_id: Uuid,
        on_chain_sub_id: u64,
    ) -> StoreResult<Option<SubmissionRecord>> {
        Ok(self
            .submissions
            .read()
            .await
            .values()
            .find(|s| s.challenge_id == challenge_id && s.on_chain_sub_id == on_chain_sub_id)
            .cloned())
    }

    async fn list_submissions(&self, challenge_id: Uuid) -> StoreResult<Vec<SubmissionRecord>> {
        let mut rows: Vec<SubmissionRecord> = self
            .submissions
            .read()
            .await
            .values()
            .filter(|s| s.challenge_id == challenge_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.on_chain_sub_id);
        Ok(rows)
    }

    async fn set_result_cid(&self, submission_id: Uuid, result_cid: &str) -> StoreResult<()> {
        let mut submissions = self.submissions.write().await;
        let record = submissions
            .get_mut(&submission_id)
            .ok_or_else(|| StoreError::not_found("Submission", submission_id))?;
        record.result_cid = Some(result_cid.to_string());
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn update_score(&self, update: ScoreUpdate) -> StoreResult<()> {
        let mut submissions = self.submissions.write().await;
        let record = submissions
            .get_mut(&update.submission_id)
            .ok_or_else(|| StoreError::not_found("Submission", update.submission_id))?;
        record.apply_score(&update);
        Ok(())
    }
}

#[async_trait]
impl IndexedEventRepository for InMemoryStore {
    async fn is_event_indexed(&self, key: &EventKey) -> StoreResult<bool> {
        Ok(self.events.read().await.contains_key(key))
    }

    async fn mark_event_indexed(&self, record: IndexedEventRecord) -> StoreResult<()> {
        let mut events = self.events.write().await;
        let key = record.key();
        if events.contains_key(&key) {
            return Err(StoreError::duplicate("IndexedEvent", key));
        }
        events.insert(key, record);
        Ok(())
    }

    async fn latest_indexed_block(&self) -> StoreResult<Option<u64>> {
        Ok(self
            .events
            .read()
            .await
            .values()
            .map(|e| e.block_number)
            .max())
    }

    async fn get_indexed_event(&self, key: &EventKey) -> StoreResult<Option<IndexedEventRecord>> {
        Ok(self.events.read().await.get(key).cloned())
    }
}

#[async_trait]
impl IndexerStateRepository for InMemoryStore {
    async fn get_next_block(&self, chain_id: u64) -> StoreResult<Option<u64>> {
        Ok(self.watermarks.read().await.get(&chain_id).copied())
    }

    async fn set_next_block(&self, chain_id: u64, next_block: u64) -> StoreResult<()> {
        self.watermarks.write().await.insert(chain_id, next_block);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hermes_core::{Wad, DEFAULT_CHAIN_ID};
    use rust_decimal::Decimal;

    fn new_challenge(factory_id: u64, poster: &str) -> NewChallenge {
        NewChallenge {
            chain_id: DEFAULT_CHAIN_ID,
            contract_address: format!("0xcc{factory_id:038x}"),
            factory_challenge_id: factory_id,
            poster_address: poster.to_string(),
            title: "Docking benchmark".to_string(),
            description: "Dock ligands against the target".to_string(),
            domain: "drug_discovery".to_string(),
            challenge_type: "docking".to_string(),
            spec_cid: "ipfs://QmSpec".to_string(),
            dataset_train_cid: None,
            dataset_test_cid: None,
            scoring_container: "ghcr.io/hermes/dock:1".to_string(),
            scoring_metric: "custom".to_string(),
            minimum_score: None,
            reward_amount: Decimal::from(500),
            distribution_type: "winner_take_all".to_string(),
            deadline: Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap(),
            dispute_window_hours: 48,
            max_submissions_per_wallet: 3,
            tx_hash: "0x01".to_string(),
        }
    }

    fn submission(challenge_id: Uuid, scored: bool) -> SubmissionUpsert {
        SubmissionUpsert {
            challenge_id,
            on_chain_sub_id: 3,
            solver_address: "0xbb".to_string(),
            result_hash: "0x11".to_string(),
            result_cid: None,
            proof_bundle_hash: "0xdd".to_string(),
            proof_bundle_cid: None,
            score: scored.then(|| "900000000000000000".parse::<Wad>().unwrap()),
            scored,
            submitted_at: Utc::now(),
            scored_at: scored.then(Utc::now),
            tx_hash: "0xaa".to_string(),
        }
    }

    #[tokio::test]
    async fn test_challenge_composite_uniqueness() {
        let store = InMemoryStore::new();
        let first = store.upsert_challenge(new_challenge(7, "0xaa")).await.unwrap();
        let second = store.upsert_challenge(new_challenge(7, "0xee")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.challenge_count().await, 1);
        assert_eq!(second.poster_address, "0xee");
    }

    #[tokio::test]
    async fn test_list_challenges_by_chain() {
        let store = InMemoryStore::new();
        store.upsert_challenge(new_challenge(2, "0xaa")).await.unwrap();
        store.upsert_challenge(new_challenge(1, "0xaa")).await.unwrap();
        let mut other_chain = new_challenge(3, "0xaa");
        other_chain.chain_id = 1;
        store.upsert_challenge(other_chain).await.unwrap();

        let listed = store.list_challenges(DEFAULT_CHAIN_ID).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].contract_address, format!("0xcc{:038x}", 1));
    }

    #[tokio::test]
    async fn test_status_cannot_go_backwards() {
        let store = InMemoryStore::new();
        let challenge = store.upsert_challenge(new_challenge(1, "0xaa")).await.unwrap();

        let cancelled = store
            .update_challenge_status(challenge.id, ChallengeStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, ChallengeStatus::Cancelled);

        let err = store
            .update_challenge_status(challenge.id, ChallengeStatus::Active)
            .await
            .unwrap_err();
        assert!(err.is_invalid_transition());
    }

    #[tokio::test]
    async fn test_submission_requires_challenge() {
        let store = InMemoryStore::new();
        let err = store
            .upsert_submission(submission(Uuid::new_v4(), false))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_result_cid_survives_scoring() {
        let store = InMemoryStore::new();
        let challenge = store.upsert_challenge(new_challenge(1, "0xaa")).await.unwrap();
        let row = store
            .upsert_submission(submission(challenge.id, false))
            .await
            .unwrap();
        store.set_result_cid(row.id, "ipfs://QmResult").await.unwrap();

        let scored = store
            .upsert_submission(submission(challenge.id, true))
            .await
            .unwrap();

        assert_eq!(scored.id, row.id);
        assert_eq!(scored.result_cid.as_deref(), Some("ipfs://QmResult"));
        assert!(scored.scored);
        assert_eq!(store.submission_count().await, 1);
    }

    #[tokio::test]
    async fn test_mark_indexed_conflict() {
        let store = InMemoryStore::new();
        let record = IndexedEventRecord {
            tx_hash: "0xaa".to_string(),
            log_index: 0,
            event_name: "Submitted".to_string(),
            block_number: 12,
            indexed_at: Utc::now(),
        };

        store.mark_event_indexed(record.clone()).await.unwrap();
        assert!(store.is_event_indexed(&record.key()).await.unwrap());
        assert_eq!(store.latest_indexed_block().await.unwrap(), Some(12));

        let err = store.mark_event_indexed(record).await.unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn test_watermark_per_chain() {
        let store = InMemoryStore::new();
        assert_eq!(store.get_next_block(DEFAULT_CHAIN_ID).await.unwrap(), None);

        store.set_next_block(DEFAULT_CHAIN_ID, 120).await.unwrap();
        store.set_next_block(DEFAULT_CHAIN_ID, 240).await.unwrap();
        store.set_next_block(1, 7).await.unwrap();

        assert_eq!(store.get_next_block(DEFAULT_CHAIN_ID).await.unwrap(), Some(240));
        assert_eq!(store.get_next_block(1).await.unwrap(), Some(7));
    }
}
