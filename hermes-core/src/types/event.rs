//! Dedup ledger records

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Suffix appended to the event name of a quarantined event
pub const QUARANTINE_SUFFIX: &str = ":invalid";

/// Identity of one log: `(tx_hash, log_index)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    /// Lowercase 0x-prefixed transaction hash
    pub tx_hash: String,
    pub log_index: u64,
}

impl EventKey {
    pub fn new(tx_hash: impl Into<String>, log_index: u64) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            log_index,
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash, self.log_index)
    }
}

/// Ledger row. Write-once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedEventRecord {
    pub tx_hash: String,
    pub log_index: u64,
    pub event_name: String,
    pub block_number: u64,
    pub indexed_at: DateTime<Utc>,
}

impl IndexedEventRecord {
    pub fn key(&self) -> EventKey {
        EventKey::new(self.tx_hash.clone(), self.log_index)
    }

    /// Whether the event was recorded as skipped rather than applied
    pub fn is_quarantined(&self) -> bool {
        self.event_name.ends_with(QUARANTINE_SUFFIX)
    }
}
