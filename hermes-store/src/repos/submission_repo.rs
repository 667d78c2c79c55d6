//! Submission Repository

use async_trait::async_trait;
use hermes_core::{ScoreUpdate, SubmissionRecord, SubmissionUpsert};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Submission repository trait
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Insert or merge on `(challenge_id, on_chain_sub_id)`.
    ///
    /// Merging follows [`SubmissionRecord::merge`].
    async fn upsert_submission(&self, submission: SubmissionUpsert)
        -> StoreResult<SubmissionRecord>;

    /// Get submission by row id
    async fn get_submission(&self, id: Uuid) -> StoreResult<Option<SubmissionRecord>>;

    /// Get submission by its on-chain id within a challenge
    async fn get_submission_by_chain_id(
        &self,
        challenge_id: Uuid,
        on_chain_sub_id: u64,
    ) -> StoreResult<Option<SubmissionRecord>>;

    /// Submissions of a challenge, ordered by on-chain id
    async fn list_submissions(&self, challenge_id: Uuid) -> StoreResult<Vec<SubmissionRecord>>;

    /// Record the result URI confirmed by the submitter
    async fn set_result_cid(&self, submission_id: Uuid, result_cid: &str) -> StoreResult<()>;

    /// Mirror a score onto an existing row
    async fn update_score(&self, update: ScoreUpdate) -> StoreResult<()>;

    /// Get submission by row id, error if not found
    async fn get_submission_required(&self, id: Uuid) -> StoreResult<SubmissionRecord> {
        self.get_submission(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Submission", id))
    }
}
