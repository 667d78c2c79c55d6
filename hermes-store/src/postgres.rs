//! PostgreSQL store
//!
//! Implements every repository over a `sqlx` connection pool. Upserts use
//! `ON CONFLICT` on the documented unique keys and each statement is its own
//! transaction.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hermes_core::{
    ChallengeRecord, ChallengeRef, ChallengeStatus, EventKey, IndexedEventRecord, NewChallenge,
    ScoreUpdate, Settlement, SubmissionRecord, SubmissionUpsert, Wad,
};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::repos::{
    ChallengeRepository, IndexedEventRepository, IndexerStateRepository, SubmissionRepository,
};
use crate::schema::HERMES_SCHEMA;

/// Connection settings
#[derive(Debug, Clone)]
pub struct PgStoreConfig {
    /// `postgres://` URL
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PgStoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// PostgreSQL implementation of every repository
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a connection pool
    pub async fn connect(config: &PgStoreConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        debug!(max_connections = config.max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    /// Create tables and indexes if missing
    pub async fn init_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(HERMES_SCHEMA).execute(&self.pool).await?;
        info!("hermes schema initialized");
        Ok(())
    }
}

// ============================================================================
// Row mapping
// ============================================================================

const CHALLENGE_COLUMNS: &str = "id, chain_id, contract_address, factory_challenge_id, \
    poster_address, title, description, domain, challenge_type, spec_cid, dataset_train_cid, \
    dataset_test_cid, scoring_container, scoring_metric, minimum_score, reward_amount, \
    distribution_type, deadline, dispute_window_hours, max_submissions_per_wallet, status, \
    tx_hash, finalized_at, winner_on_chain_sub_id, winner_submission_id, created_at, updated_at";

const SUBMISSION_COLUMNS: &str = "id, challenge_id, on_chain_sub_id, solver_address, \
    result_hash, result_cid, proof_bundle_hash, proof_bundle_cid, score::text AS score, scored, \
    submitted_at, scored_at, tx_hash, created_at, updated_at";

fn to_bigint(value: u64, field: &str) -> StoreResult<i64> {
    i64::try_from(value)
        .map_err(|_| StoreError::serialization(format!("{field} {value} exceeds BIGINT")))
}

fn from_bigint(value: i64, field: &str) -> StoreResult<u64> {
    u64::try_from(value).map_err(|_| StoreError::serialization(format!("{field} {value} is negative")))
}

fn to_int(value: u32, field: &str) -> StoreResult<i32> {
    i32::try_from(value)
        .map_err(|_| StoreError::serialization(format!("{field} {value} exceeds INTEGER")))
}

fn from_int(value: i32, field: &str) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| StoreError::serialization(format!("{field} {value} is negative")))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[derive(sqlx::FromRow)]
struct ChallengeRow {
    id: Uuid,
    chain_id: i64,
    contract_address: String,
    factory_challenge_id: i64,
    poster_address: String,
    title: String,
    description: String,
    domain: String,
    challenge_type: String,
    spec_cid: String,
    dataset_train_cid: Option<String>,
    dataset_test_cid: Option<String>,
    scoring_container: String,
    scoring_metric: String,
    minimum_score: Option<Decimal>,
    reward_amount: Decimal,
    distribution_type: String,
    deadline: DateTime<Utc>,
    dispute_window_hours: i32,
    max_submissions_per_wallet: i32,
    status: String,
    tx_hash: String,
    finalized_at: Option<DateTime<Utc>>,
    winner_on_chain_sub_id: Option<i64>,
    winner_submission_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ChallengeRow> for ChallengeRecord {
    type Error = StoreError;

    fn try_from(row: ChallengeRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            chain_id: from_bigint(row.chain_id, "chain_id")?,
            contract_address: row.contract_address,
            factory_challenge_id: from_bigint(row.factory_challenge_id, "factory_challenge_id")?,
            poster_address: row.poster_address,
            title: row.title,
            description: row.description,
            domain: row.domain,
            challenge_type: row.challenge_type,
            spec_cid: row.spec_cid,
            dataset_train_cid: row.dataset_train_cid,
            dataset_test_cid: row.dataset_test_cid,
            scoring_container: row.scoring_container,
            scoring_metric: row.scoring_metric,
            minimum_score: row.minimum_score,
            reward_amount: row.reward_amount,
            distribution_type: row.distribution_type,
            deadline: row.deadline,
            dispute_window_hours: from_int(row.dispute_window_hours, "dispute_window_hours")?,
            max_submissions_per_wallet: from_int(
                row.max_submissions_per_wallet,
                "max_submissions_per_wallet",
            )?,
            status: row.status.parse()?,
            tx_hash: row.tx_hash,
            finalized_at: row.finalized_at,
            winner_on_chain_sub_id: row
                .winner_on_chain_sub_id
                .map(|v| from_bigint(v, "winner_on_chain_sub_id"))
                .transpose()?,
            winner_submission_id: row.winner_submission_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SubmissionRow {
    id: Uuid,
    challenge_id: Uuid,
    on_chain_sub_id: i64,
    solver_address: String,
    result_hash: String,
    result_cid: Option<String>,
    proof_bundle_hash: String,
    proof_bundle_cid: Option<String>,
    score: Option<String>,
    scored: bool,
    submitted_at: DateTime<Utc>,
    scored_at: Option<DateTime<Utc>>,
    tx_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for SubmissionRecord {
    type Error = StoreError;

    fn try_from(row: SubmissionRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            challenge_id: row.challenge_id,
            on_chain_sub_id: from_bigint(row.on_chain_sub_id, "on_chain_sub_id")?,
            solver_address: row.solver_address,
            result_hash: row.result_hash,
            result_cid: row.result_cid,
            proof_bundle_hash: row.proof_bundle_hash,
            proof_bundle_cid: row.proof_bundle_cid,
            score: row.score.map(|s| s.parse::<Wad>()).transpose()?,
            scored: row.scored,
            submitted_at: row.submitted_at,
            scored_at: row.scored_at,
            tx_hash: row.tx_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct IndexedEventRow {
    tx_hash: String,
    log_index: i64,
    event_name: String,
    block_number: i64,
    indexed_at: DateTime<Utc>,
}

impl TryFrom<IndexedEventRow> for IndexedEventRecord {
    type Error = StoreError;

    fn try_from(row: IndexedEventRow) -> StoreResult<Self> {
        Ok(Self {
            tx_hash: row.tx_hash,
            log_index: from_bigint(row.log_index, "log_index")?,
            event_name: row.event_name,
            block_number: from_bigint(row.block_number, "block_number")?,
            indexed_at: row.indexed_at,
        })
    }
}

// ============================================================================
// Repositories
// ============================================================================

#[async_trait]
impl ChallengeRepository for PgStore {
    async fn upsert_challenge(&self, challenge: NewChallenge) -> StoreResult<ChallengeRecord> {
        let sql = format!(
            "INSERT INTO challenges (id, chain_id, contract_address, factory_challenge_id, \
                poster_address, title, description, domain, challenge_type, spec_cid, \
                dataset_train_cid, dataset_test_cid, scoring_container, scoring_metric, \
                minimum_score, reward_amount, distribution_type, deadline, dispute_window_hours, \
                max_submissions_per_wallet, status, tx_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                $17, $18, $19, $20, 'active', $21) \
             ON CONFLICT (chain_id, factory_challenge_id) DO UPDATE SET \
                poster_address = EXCLUDED.poster_address, \
                title = EXCLUDED.title, \
                description = EXCLUDED.description, \
                domain = EXCLUDED.domain, \
                challenge_type = EXCLUDED.challenge_type, \
                dataset_train_cid = EXCLUDED.dataset_train_cid, \
                dataset_test_cid = EXCLUDED.dataset_test_cid, \
                scoring_container = EXCLUDED.scoring_container, \
                scoring_metric = EXCLUDED.scoring_metric, \
                minimum_score = EXCLUDED.minimum_score, \
                reward_amount = EXCLUDED.reward_amount, \
                distribution_type = EXCLUDED.distribution_type, \
                deadline = EXCLUDED.deadline, \
                dispute_window_hours = EXCLUDED.dispute_window_hours, \
                max_submissions_per_wallet = EXCLUDED.max_submissions_per_wallet, \
                tx_hash = EXCLUDED.tx_hash, \
                updated_at = now() \
             RETURNING {CHALLENGE_COLUMNS}"
        );

        let contract_address = challenge.contract_address.clone();
        let row = sqlx::query_as::<_, ChallengeRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(to_bigint(challenge.chain_id, "chain_id")?)
            .bind(challenge.contract_address)
            .bind(to_bigint(challenge.factory_challenge_id, "factory_challenge_id")?)
            .bind(challenge.poster_address)
            .bind(challenge.title)
            .bind(challenge.description)
            .bind(challenge.domain)
            .bind(challenge.challenge_type)
            .bind(challenge.spec_cid)
            .bind(challenge.dataset_train_cid)
            .bind(challenge.dataset_test_cid)
            .bind(challenge.scoring_container)
            .bind(challenge.scoring_metric)
            .bind(challenge.minimum_score)
            .bind(challenge.reward_amount)
            .bind(challenge.distribution_type)
            .bind(challenge.deadline)
            .bind(to_int(challenge.dispute_window_hours, "dispute_window_hours")?)
            .bind(to_int(
                challenge.max_submissions_per_wallet,
                "max_submissions_per_wallet",
            )?)
            .bind(challenge.tx_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::duplicate("Challenge", &contract_address)
                } else {
                    e.into()
                }
            })?;

        row.try_into()
    }

    async fn get_challenge(&self, id: Uuid) -> StoreResult<Option<ChallengeRecord>> {
        let sql = format!("SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE id = $1");
        sqlx::query_as::<_, ChallengeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(ChallengeRecord::try_from)
            .transpose()
    }

    async fn get_challenge_by_factory_id(
        &self,
        chain_id: u64,
        factory_challenge_id: u64,
    ) -> StoreResult<Option<ChallengeRecord>> {
        let sql = format!(
            "SELECT {CHALLENGE_COLUMNS} FROM challenges \
             WHERE chain_id = $1 AND factory_challenge_id = $2"
        );
        sqlx::query_as::<_, ChallengeRow>(&sql)
            .bind(to_bigint(chain_id, "chain_id")?)
            .bind(to_bigint(factory_challenge_id, "factory_challenge_id")?)
            .fetch_optional(&self.pool)
            .await?
            .map(ChallengeRecord::try_from)
            .transpose()
    }

    async fn list_challenges(&self, chain_id: u64) -> StoreResult<Vec<ChallengeRef>> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT id, contract_address FROM challenges \
             WHERE chain_id = $1 ORDER BY factory_challenge_id",
        )
        .bind(to_bigint(chain_id, "chain_id")?)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, contract_address)| ChallengeRef {
                id,
                contract_address,
            })
            .collect())
    }

    async fn update_challenge_status(
        &self,
        id: Uuid,
        status: ChallengeStatus,
    ) -> StoreResult<ChallengeRecord> {
        let mut record = self.get_challenge_required(id).await?;
        let previous = record.status;
        if !record.transition(status, Utc::now())? {
            return Ok(record);
        }

        let result = sqlx::query(
            "UPDATE challenges SET status = $2, updated_at = $3 WHERE id = $1 AND status = $4",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(record.updated_at)
        .bind(previous.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::invalid_state(format!(
                "challenge {id} left status {previous} concurrently"
            )));
        }
        Ok(record)
    }

    async fn set_challenge_finalized(
        &self,
        id: Uuid,
        settlement: Settlement,
    ) -> StoreResult<ChallengeRecord> {
        let mut record = self.get_challenge_required(id).await?;
        let previous = record.status;
        if !record.finalize(&settlement, Utc::now())? {
            return Ok(record);
        }

        let result = sqlx::query(
            "UPDATE challenges SET status = 'finalized', finalized_at = $2, \
                winner_on_chain_sub_id = $3, winner_submission_id = $4, updated_at = $5 \
             WHERE id = $1 AND status = $6",
        )
        .bind(id)
        .bind(settlement.finalized_at)
        .bind(
            settlement
                .winner_on_chain_sub_id
                .map(|v| to_bigint(v, "winner_on_chain_sub_id"))
                .transpose()?,
        )
        .bind(settlement.winner_submission_id)
        .bind(record.updated_at)
        .bind(previous.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::invalid_state(format!(
                "challenge {id} left status {previous} concurrently"
            )));
        }
        Ok(record)
    }
}

#[async_trait]
impl SubmissionRepository for PgStore {
    async fn upsert_submission(
        &self,
        submission: SubmissionUpsert,
    ) -> StoreResult<SubmissionRecord> {
        submission.validate()?;

        // Mirrors SubmissionRecord::merge. Every right-hand side reads the
        // stored row, so assignment order does not matter.
        let sql = format!(
            "INSERT INTO submissions (id, challenge_id, on_chain_sub_id, solver_address, \
                result_hash, result_cid, proof_bundle_hash, proof_bundle_cid, score, scored, \
                submitted_at, scored_at, tx_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9::numeric, $10, $11, $12, $13) \
             ON CONFLICT (challenge_id, on_chain_sub_id) DO UPDATE SET \
                solver_address = CASE WHEN submissions.solver_address = '' \
                    THEN EXCLUDED.solver_address ELSE submissions.solver_address END, \
                tx_hash = CASE WHEN submissions.tx_hash = '' \
                    THEN EXCLUDED.tx_hash ELSE submissions.tx_hash END, \
                result_hash = CASE WHEN EXCLUDED.result_hash = '' \
                    THEN submissions.result_hash ELSE EXCLUDED.result_hash END, \
                result_cid = COALESCE(submissions.result_cid, EXCLUDED.result_cid), \
                proof_bundle_cid = COALESCE(submissions.proof_bundle_cid, EXCLUDED.proof_bundle_cid), \
                proof_bundle_hash = CASE WHEN EXCLUDED.scored OR NOT submissions.scored \
                    THEN EXCLUDED.proof_bundle_hash ELSE submissions.proof_bundle_hash END, \
                score = CASE WHEN EXCLUDED.scored OR NOT submissions.scored \
                    THEN EXCLUDED.score ELSE submissions.score END, \
                scored_at = CASE WHEN EXCLUDED.scored OR NOT submissions.scored \
                    THEN COALESCE(EXCLUDED.scored_at, submissions.scored_at) \
                    ELSE submissions.scored_at END, \
                scored = submissions.scored OR EXCLUDED.scored, \
                submitted_at = EXCLUDED.submitted_at, \
                updated_at = now() \
             RETURNING {SUBMISSION_COLUMNS}"
        );

        let row = sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(submission.challenge_id)
            .bind(to_bigint(submission.on_chain_sub_id, "on_chain_sub_id")?)
            .bind(submission.solver_address)
            .bind(submission.result_hash)
            .bind(submission.result_cid)
            .bind(submission.proof_bundle_hash)
            .bind(submission.proof_bundle_cid)
            .bind(submission.score.map(|s| s.to_string()))
            .bind(submission.scored)
            .bind(submission.submitted_at)
            .bind(submission.scored_at)
            .bind(submission.tx_hash)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn get_submission(&self, id: Uuid) -> StoreResult<Option<SubmissionRecord>> {
        let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1");
        sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(SubmissionRecord::try_from)
            .transpose()
    }

    async fn get_submission_by_chain_id(
        &self,
        challenge_id: Uuid,
        on_chain_sub_id: u64,
    ) -> StoreResult<Option<SubmissionRecord>> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions \
             WHERE challenge_id = $1 AND on_chain_sub_id = $2"
        );
        sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(challenge_id)
            .bind(to_bigint(on_chain_sub_id, "on_chain_sub_id")?)
            .fetch_optional(&self.pool)
            .await?
            .map(SubmissionRecord::try_from)
            .transpose()
    }

    async fn list_submissions(&self, challenge_id: Uuid) -> StoreResult<Vec<SubmissionRecord>> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions \
             WHERE challenge_id = $1 ORDER BY on_chain_sub_id"
        );
        sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(challenge_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(SubmissionRecord::try_from)
            .collect()
    }

    async fn set_result_cid(&self, submission_id: Uuid, result_cid: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE submissions SET result_cid = $2, updated_at = now() WHERE id = $1",
        )
        .bind(submission_id)
        .bind(result_cid)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Submission", submission_id));
        }
        Ok(())
    }

    async fn update_score(&self, update: ScoreUpdate) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE submissions SET score = $2::numeric, scored = true, proof_bundle_hash = $3, \
                proof_bundle_cid = COALESCE($4, proof_bundle_cid), scored_at = $5, \
                updated_at = $5 \
             WHERE id = $1",
        )
        .bind(update.submission_id)
        .bind(update.score.to_string())
        .bind(update.proof_bundle_hash)
        .bind(update.proof_bundle_cid)
        .bind(update.scored_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Submission", update.submission_id));
        }
        Ok(())
    }
}

#[async_trait]
impl IndexedEventRepository for PgStore {
    async fn is_event_indexed(&self, key: &EventKey) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM indexed_events WHERE tx_hash = $1 AND log_index = $2)",
        )
        .bind(&key.tx_hash)
        .bind(to_bigint(key.log_index, "log_index")?)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn mark_event_indexed(&self, record: IndexedEventRecord) -> StoreResult<()> {
        let key = record.key();
        sqlx::query(
            "INSERT INTO indexed_events (tx_hash, log_index, event_name, block_number, indexed_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(record.tx_hash)
        .bind(to_bigint(record.log_index, "log_index")?)
        .bind(record.event_name)
        .bind(to_bigint(record.block_number, "block_number")?)
        .bind(record.indexed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::duplicate("IndexedEvent", &key)
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    async fn latest_indexed_block(&self) -> StoreResult<Option<u64>> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(block_number) FROM indexed_events")
            .fetch_one(&self.pool)
            .await?;
        max.map(|block| from_bigint(block, "block_number")).transpose()
    }

    async fn get_indexed_event(&self, key: &EventKey) -> StoreResult<Option<IndexedEventRecord>> {
        sqlx::query_as::<_, IndexedEventRow>(
            "SELECT tx_hash, log_index, event_name, block_number, indexed_at \
             FROM indexed_events WHERE tx_hash = $1 AND log_index = $2",
        )
        .bind(&key.tx_hash)
        .bind(to_bigint(key.log_index, "log_index")?)
        .fetch_optional(&self.pool)
        .await?
        .map(IndexedEventRecord::try_from)
        .transpose()
    }
}

#[async_trait]
impl IndexerStateRepository for PgStore {
    async fn get_next_block(&self, chain_id: u64) -> StoreResult<Option<u64>> {
        let next: Option<i64> =
            sqlx::query_scalar("SELECT next_block FROM indexer_state WHERE chain_id = $1")
                .bind(to_bigint(chain_id, "chain_id")?)
                .fetch_optional(&self.pool)
                .await?;
        next.map(|block| from_bigint(block, "next_block")).transpose()
    }

    async fn set_next_block(&self, chain_id: u64, next_block: u64) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO indexer_state (chain_id, next_block, updated_at) VALUES ($1, $2, now()) \
             ON CONFLICT (chain_id) DO UPDATE SET next_block = EXCLUDED.next_block, \
             updated_at = EXCLUDED.updated_at",
        )
        .bind(to_bigint(chain_id, "chain_id")?)
        .bind(to_bigint(next_block, "next_block")?)
        .execute(&self.pool)
        .await?;
        debug!(chain_id, next_block, "watermark saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bigint_bounds() {
        assert_eq!(to_bigint(42, "x").unwrap(), 42);
        assert!(to_bigint(u64::MAX, "x").is_err());
        assert!(from_bigint(-1, "x").is_err());
    }

    #[test]
    fn test_submission_row_parses_wad() {
        let now = Utc::now();
        let row = SubmissionRow {
            id: Uuid::new_v4(),
            challenge_id: Uuid::new_v4(),
            on_chain_sub_id: 3,
            solver_address: "0xbb".to_string(),
            result_hash: "0x11".to_string(),
            result_cid: None,
            proof_bundle_hash: "0xdd".to_string(),
            proof_bundle_cid: None,
            score: Some("900000000000000000".to_string()),
            scored: true,
            submitted_at: now,
            scored_at: Some(now),
            tx_hash: "0xaa".to_string(),
            created_at: now,
            updated_at: now,
        };

        let record = SubmissionRecord::try_from(row).unwrap();
        assert_eq!(record.on_chain_sub_id, 3);
        assert_eq!(record.score.unwrap().to_string(), "900000000000000000");
    }
}
