//! PostgreSQL schema for the indexer tables

/// Complete Hermes schema. Every statement is idempotent.
pub const HERMES_SCHEMA: &str = r#"
-- ============================================
-- Challenges
-- ============================================
CREATE TABLE IF NOT EXISTS challenges (
    id UUID PRIMARY KEY,
    chain_id BIGINT NOT NULL,
    contract_address TEXT NOT NULL,
    factory_challenge_id BIGINT NOT NULL,
    poster_address TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    domain TEXT NOT NULL,
    challenge_type TEXT NOT NULL,
    spec_cid TEXT NOT NULL,
    dataset_train_cid TEXT,
    dataset_test_cid TEXT,
    scoring_container TEXT NOT NULL,
    scoring_metric TEXT NOT NULL,
    minimum_score NUMERIC,
    reward_amount NUMERIC NOT NULL,
    distribution_type TEXT NOT NULL,
    deadline TIMESTAMPTZ NOT NULL,
    dispute_window_hours INTEGER NOT NULL,
    max_submissions_per_wallet INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'active'
        CHECK (status IN ('active', 'disputed', 'finalized', 'cancelled')),
    tx_hash TEXT NOT NULL,
    finalized_at TIMESTAMPTZ,
    winner_on_chain_sub_id BIGINT,
    winner_submission_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (chain_id, factory_challenge_id),
    UNIQUE (chain_id, contract_address)
);
CREATE INDEX IF NOT EXISTS idx_challenges_status ON challenges (status);

-- ============================================
-- Submissions
-- ============================================
CREATE TABLE IF NOT EXISTS submissions (
    id UUID PRIMARY KEY,
    challenge_id UUID NOT NULL REFERENCES challenges (id),
    on_chain_sub_id BIGINT NOT NULL,
    solver_address TEXT NOT NULL,
    result_hash TEXT NOT NULL,
    result_cid TEXT,
    proof_bundle_hash TEXT NOT NULL,
    proof_bundle_cid TEXT,
    score NUMERIC(78, 0),
    scored BOOLEAN NOT NULL DEFAULT false,
    submitted_at TIMESTAMPTZ NOT NULL,
    scored_at TIMESTAMPTZ,
    tx_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (challenge_id, on_chain_sub_id),
    CHECK (NOT scored OR score IS NOT NULL)
);
CREATE INDEX IF NOT EXISTS idx_submissions_solver ON submissions (solver_address);

-- ============================================
-- Indexed events (dedup ledger)
-- ============================================
CREATE TABLE IF NOT EXISTS indexed_events (
    tx_hash TEXT NOT NULL,
    log_index BIGINT NOT NULL,
    event_name TEXT NOT NULL,
    block_number BIGINT NOT NULL,
    indexed_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (tx_hash, log_index)
);
CREATE INDEX IF NOT EXISTS idx_indexed_events_block ON indexed_events (block_number);

-- ============================================
-- Indexer state (poll watermark)
-- ============================================
CREATE TABLE IF NOT EXISTS indexer_state (
    chain_id BIGINT PRIMARY KEY,
    next_block BIGINT NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_declares_unique_keys() {
        assert!(HERMES_SCHEMA.contains("UNIQUE (chain_id, factory_challenge_id)"));
        assert!(HERMES_SCHEMA.contains("UNIQUE (challenge_id, on_chain_sub_id)"));
        assert!(HERMES_SCHEMA.contains("PRIMARY KEY (tx_hash, log_index)"));
        assert!(HERMES_SCHEMA.contains("chain_id BIGINT PRIMARY KEY"));
    }
}
