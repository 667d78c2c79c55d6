//! Indexer configuration
//!
//! Environment variables (a `.env` file is loaded first by the binary):
//! - HERMES_RPC_URL: JSON-RPC endpoint (required)
//! - HERMES_CHAIN_ID: chain id stamped on challenge rows
//! - HERMES_FACTORY_ADDRESS: factory contract address (required)
//! - HERMES_DATABASE_URL: Postgres URL
//! - HERMES_DB_MAX_CONNECTIONS: pool size
//! - HERMES_IPFS_GATEWAY: gateway prefix for `ipfs://` URIs
//! - HERMES_FETCH_TIMEOUT_SECS: gateway request timeout
//! - HERMES_POLL_INTERVAL_SECS, HERMES_INDEXER_START_BLOCK, HERMES_MAX_BLOCK_RANGE,
//!   HERMES_CONFIRMATIONS, HERMES_MAX_EVENT_ATTEMPTS: poll loop
//! - HERMES_INDEXER_LAG_WARN_BLOCKS, HERMES_INDEXER_LAG_CRITICAL_BLOCKS: lag health
//! - HERMES_LOG_LEVEL, HERMES_LOG_FORMAT: logging

use std::env;
use std::str::FromStr;

use hermes_chain::Address;
use hermes_core::DEFAULT_CHAIN_ID;
use serde::{Deserialize, Serialize};

use crate::controller::PollConfig;
use crate::error::{IndexerError, IndexerResult};
use crate::fetch::DEFAULT_IPFS_GATEWAY;
use crate::health::LagThresholds;
use crate::telemetry::{LogConfig, LogFormat};

/// Full indexer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub factory_address: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub ipfs_gateway: String,
    pub fetch_timeout_secs: u64,
    pub poll: PollConfig,
    pub lag: LagThresholds,
    pub log: LogConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            chain_id: DEFAULT_CHAIN_ID,
            factory_address: String::new(),
            database_url: None,
            db_max_connections: 5,
            ipfs_gateway: DEFAULT_IPFS_GATEWAY.to_string(),
            fetch_timeout_secs: 30,
            poll: PollConfig::default(),
            lag: LagThresholds::default(),
            log: LogConfig::default(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

impl IndexerConfig {
    /// Load configuration from environment variables
    ///
    /// Unparseable numeric values fall back to their defaults; missing
    /// required values are reported by [`IndexerConfig::validate`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let poll_defaults = PollConfig::default();
        let lag_defaults = LagThresholds::default();

        Self {
            rpc_url: env_opt("HERMES_RPC_URL").unwrap_or_default(),
            chain_id: env_or("HERMES_CHAIN_ID", defaults.chain_id),
            factory_address: env_opt("HERMES_FACTORY_ADDRESS").unwrap_or_default(),
            database_url: env_opt("HERMES_DATABASE_URL"),
            db_max_connections: env_or("HERMES_DB_MAX_CONNECTIONS", defaults.db_max_connections),
            ipfs_gateway: env_opt("HERMES_IPFS_GATEWAY").unwrap_or(defaults.ipfs_gateway),
            fetch_timeout_secs: env_or("HERMES_FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs),
            poll: PollConfig {
                poll_interval_secs: env_or(
                    "HERMES_POLL_INTERVAL_SECS",
                    poll_defaults.poll_interval_secs,
                ),
                start_block: env_or("HERMES_INDEXER_START_BLOCK", poll_defaults.start_block),
                max_block_range: env_or("HERMES_MAX_BLOCK_RANGE", poll_defaults.max_block_range),
                confirmations: env_or("HERMES_CONFIRMATIONS", poll_defaults.confirmations),
                max_event_attempts: env_or(
                    "HERMES_MAX_EVENT_ATTEMPTS",
                    poll_defaults.max_event_attempts,
                ),
            },
            lag: LagThresholds {
                warn_blocks: env_or("HERMES_INDEXER_LAG_WARN_BLOCKS", lag_defaults.warn_blocks),
                critical_blocks: env_or(
                    "HERMES_INDEXER_LAG_CRITICAL_BLOCKS",
                    lag_defaults.critical_blocks,
                ),
            },
            log: LogConfig {
                level: env_opt("HERMES_LOG_LEVEL").unwrap_or(defaults.log.level),
                format: env_or("HERMES_LOG_FORMAT", LogFormat::default()),
                ..defaults.log
            },
        }
    }

    /// Check required values and ranges
    pub fn validate(&self) -> IndexerResult<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(IndexerError::config("HERMES_RPC_URL is required"));
        }
        self.factory()?;
        if self.poll.max_block_range == 0 {
            return Err(IndexerError::config("HERMES_MAX_BLOCK_RANGE must be positive"));
        }
        if self.lag.warn_blocks >= self.lag.critical_blocks {
            return Err(IndexerError::config(
                "lag warning threshold must be below the critical threshold",
            ));
        }
        Ok(())
    }

    /// Parsed factory address
    pub fn factory(&self) -> IndexerResult<Address> {
        let raw = self.factory_address.trim();
        if raw.is_empty() {
            return Err(IndexerError::config("HERMES_FACTORY_ADDRESS is required"));
        }
        Address::from_str(raw).map_err(|e| IndexerError::InvalidAddress(format!("{raw}: {e}")))
    }

    /// Postgres URL, required by the Postgres backend
    pub fn database_url(&self) -> IndexerResult<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| IndexerError::config("HERMES_DATABASE_URL is required"))
    }
}
