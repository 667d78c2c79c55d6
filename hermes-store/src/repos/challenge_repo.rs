//! Challenge Repository

use async_trait::async_trait;
use hermes_core::{ChallengeRecord, ChallengeRef, ChallengeStatus, NewChallenge, Settlement};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Challenge repository trait
#[async_trait]
pub trait ChallengeRepository: Send + Sync {
    /// Insert or update on `(chain_id, factory_challenge_id)`.
    ///
    /// On conflict `contract_address`, `spec_cid` and `status` keep their
    /// stored values.
    async fn upsert_challenge(&self, challenge: NewChallenge) -> StoreResult<ChallengeRecord>;

    /// Get challenge by row id
    async fn get_challenge(&self, id: Uuid) -> StoreResult<Option<ChallengeRecord>>;

    /// Get challenge by row id, error if not found
    async fn get_challenge_required(&self, id: Uuid) -> StoreResult<ChallengeRecord> {
        self.get_challenge(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Challenge", id))
    }

    /// Get challenge by its factory id
    async fn get_challenge_by_factory_id(
        &self,
        chain_id: u64,
        factory_challenge_id: u64,
    ) -> StoreResult<Option<ChallengeRecord>>;

    /// All challenges of a chain, ordered by factory id
    async fn list_challenges(&self, chain_id: u64) -> StoreResult<Vec<ChallengeRef>>;

    /// Move a challenge forward in its lifecycle.
    ///
    /// Re-applying the current status returns the row unchanged; a backward
    /// move is `StoreError::InvalidTransition`.
    async fn update_challenge_status(
        &self,
        id: Uuid,
        status: ChallengeStatus,
    ) -> StoreResult<ChallengeRecord>;

    /// Mark a challenge finalized with its winner
    async fn set_challenge_finalized(
        &self,
        id: Uuid,
        settlement: Settlement,
    ) -> StoreResult<ChallengeRecord>;
}
