//! Hermes Store
//!
//! Relational store for the indexer's output tables:
//!
//! | Table | Key |
//! |---|---|
//! | `challenges` | `(chain_id, factory_challenge_id)` |
//! | `submissions` | `(challenge_id, on_chain_sub_id)` |
//! | `indexed_events` | `(tx_hash, log_index)` |
//! | `indexer_state` | `chain_id` |
//!
//! Two backends implement the same repository traits:
//!
//! - [`PgStore`]: PostgreSQL through `sqlx`
//! - [`InMemoryStore`]: `tokio::sync::RwLock` maps, for tests and local runs
//!
//! # Usage Example
//!
//! ```ignore
//! use hermes_store::{PgStore, PgStoreConfig, ChallengeRepository};
//!
//! async fn example() -> hermes_store::StoreResult<()> {
//!     let store = PgStore::connect(&PgStoreConfig::new("postgres://localhost/hermes")).await?;
//!     store.init_schema().await?;
//!     let challenges = store.list_challenges(84532).await?;
//!     println!("{} challenges", challenges.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repos;
pub mod schema;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use postgres::{PgStore, PgStoreConfig};
pub use repos::{
    ChallengeRepository, IndexedEventRepository, IndexerStateRepository, IndexerStore,
    SubmissionRepository,
};
pub use schema::HERMES_SCHEMA;
