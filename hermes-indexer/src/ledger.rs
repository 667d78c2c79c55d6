//! Dedup Ledger
//!
//! Write-once record of every applied event, keyed by `(tx_hash, log_index)`.
//! An event is marked only after its projection succeeded, so a crash
//! between the two replays the projection, never skips it.

use std::sync::Arc;

use chrono::Utc;
use hermes_core::{EventKey, IndexedEventRecord, QUARANTINE_SUFFIX};
use hermes_store::{IndexedEventRepository, StoreError};
use tracing::debug;

use crate::error::{IndexerError, IndexerResult};

/// Ledger over an [`IndexedEventRepository`]
pub struct DedupLedger<R: IndexedEventRepository> {
    repo: Arc<R>,
}

impl<R: IndexedEventRepository> DedupLedger<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn is_indexed(&self, key: &EventKey) -> IndexerResult<bool> {
        Ok(self.repo.is_event_indexed(key).await?)
    }

    /// Record an applied event. A second mark is a [`IndexerError::LedgerConflict`].
    pub async fn mark_indexed(
        &self,
        key: &EventKey,
        event_name: &str,
        block_number: u64,
    ) -> IndexerResult<()> {
        let record = IndexedEventRecord {
            tx_hash: key.tx_hash.clone(),
            log_index: key.log_index,
            event_name: event_name.to_string(),
            block_number,
            indexed_at: Utc::now(),
        };

        match self.repo.mark_event_indexed(record).await {
            Ok(()) => {
                debug!(key = %key, event = event_name, block_number, "event indexed");
                Ok(())
            }
            Err(StoreError::Duplicate { .. }) => Err(IndexerError::LedgerConflict {
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Record an event as skipped without projection
    pub async fn mark_quarantined(
        &self,
        key: &EventKey,
        event_name: &str,
        block_number: u64,
    ) -> IndexerResult<()> {
        self.mark_indexed(key, &format!("{event_name}{QUARANTINE_SUFFIX}"), block_number)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_store::InMemoryStore;

    #[tokio::test]
    async fn test_mark_then_seen() {
        let store = Arc::new(InMemoryStore::new());
        let ledger = DedupLedger::new(store.clone());
        let key = EventKey::new("0xaa", 2);

        assert!(!ledger.is_indexed(&key).await.unwrap());
        ledger.mark_indexed(&key, "Submitted", 10).await.unwrap();
        assert!(ledger.is_indexed(&key).await.unwrap());
        assert_eq!(store.latest_indexed_block().await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_double_mark_is_conflict() {
        let ledger = DedupLedger::new(Arc::new(InMemoryStore::new()));
        let key = EventKey::new("0xaa", 0);

        ledger.mark_indexed(&key, "Cancelled", 4).await.unwrap();
        let err = ledger.mark_indexed(&key, "Cancelled", 4).await.unwrap_err();
        assert!(err.is_ledger_conflict());
    }

    #[tokio::test]
    async fn test_quarantine_suffix() {
        let store = Arc::new(InMemoryStore::new());
        let ledger = DedupLedger::new(store.clone());
        let key = EventKey::new("0xbb", 1);

        ledger.mark_quarantined(&key, "ChallengeCreated", 7).await.unwrap();

        let record = store.get_indexed_event(&key).await.unwrap().unwrap();
        assert_eq!(record.event_name, "ChallengeCreated:invalid");
        assert!(record.is_quarantined());
        assert!(ledger.is_indexed(&key).await.unwrap());
    }
}
