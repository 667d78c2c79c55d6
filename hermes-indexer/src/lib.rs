//! Hermes Indexer
//!
//! Mirrors the Hermes bounty contracts into the relational store.
//!
//! # Components
//!
//! - [`PollLoop`]: pass scheduling, watermark, per-event quarantine
//! - [`Projector`]: event handlers writing challenge and submission rows
//! - [`DedupLedger`]: at-least-once delivery becomes exactly-once application
//! - [`SpecResolver`]: fetches and validates challenge spec documents
//! - [`check_lag`]: block-lag health report
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use hermes_chain::RpcEventSource;
//! use hermes_indexer::{GatewayFetcher, PollConfig, PollLoop, DEFAULT_IPFS_GATEWAY};
//! use hermes_store::{PgStore, PgStoreConfig};
//!
//! let store = Arc::new(PgStore::connect(&PgStoreConfig::new(database_url)).await?);
//! let source = Arc::new(RpcEventSource::connect(rpc_url)?);
//! let fetcher = Arc::new(GatewayFetcher::new(DEFAULT_IPFS_GATEWAY));
//!
//! let mut poll = PollLoop::new(PollConfig::default(), 84532, factory, source, fetcher, store)?;
//! poll.resume().await?;
//! poll.run().await;
//! ```

pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod handler;
pub mod health;
pub mod ledger;
pub mod projector;
pub mod resolver;
pub mod telemetry;

pub use commands::{Cli, Commands, StoreBackend};
pub use config::IndexerConfig;
pub use controller::{PassReport, PollConfig, PollLoop};
pub use error::{IndexerError, IndexerResult};
pub use fetch::{
    check_content_uri, gateway_url, ContentFetcher, GatewayFetcher, MockContentFetcher,
    RetryConfig, DEFAULT_IPFS_GATEWAY,
};
pub use health::{check_lag, LagReport, LagStatus, LagThresholds};
pub use ledger::DedupLedger;
pub use projector::{Projection, Projector};
pub use resolver::SpecResolver;
pub use telemetry::{init_logging, LogConfig, LogFormat};
