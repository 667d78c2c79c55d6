//! Hermes domain types

pub mod amount;
pub mod challenge;
pub mod event;
pub mod submission;

pub use amount::{usdc_from_units, Wad, USDC_DECIMALS, WAD_DECIMALS};
pub use challenge::{
    ChallengeRecord, ChallengeRef, ChallengeStatus, NewChallenge, Settlement, DEFAULT_CHAIN_ID,
};
pub use event::{EventKey, IndexedEventRecord, QUARANTINE_SUFFIX};
pub use submission::{ScoreUpdate, SubmissionRecord, SubmissionUpsert};

use alloy_primitives::{Address, B256};

/// Lowercase 0x-prefixed address, the form stored in every address column
pub fn address_key(address: &Address) -> String {
    format!("{address:#x}")
}

/// Lowercase 0x-prefixed 32-byte hash
pub fn hash_key(hash: &B256) -> String {
    format!("{hash:#x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_key_is_lowercase() {
        let address: Address = "0xCC00000000000000000000000000000000000001".parse().unwrap();
        assert_eq!(
            address_key(&address),
            "0xcc00000000000000000000000000000000000001"
        );
    }
}
