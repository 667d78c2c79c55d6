//! Contract ABIs
//!
//! Two views of the same contracts:
//!
//! - `sol!` bindings, used for typed view calls and for building logs in tests
//! - human-readable event signatures, parsed into [`Event`]s for dynamic
//!   decoding of raw logs

use std::collections::HashMap;

use alloy::json_abi::Event;
use alloy::primitives::B256;
use alloy::sol;

use crate::decode::ArgShape;
use crate::error::{ChainError, ChainResult};

sol! {
    /// Challenge factory
    #[sol(rpc)]
    interface IHermesFactory {
        event ChallengeCreated(uint256 indexed id, address indexed challenge, address indexed poster, uint256 rewardAmount);
    }

    /// Per-challenge escrow contract
    #[sol(rpc)]
    interface IHermesChallenge {
        struct Submission {
            address solver;
            bytes32 resultHash;
            bytes32 proofBundleHash;
            uint256 score;
            uint64 submittedAt;
            bool scored;
        }

        event Submitted(uint256 indexed subId, address indexed solver, bytes32 resultHash);
        event Scored(uint256 indexed subId, uint256 score, bytes32 proofBundleHash);
        event Finalized(uint256 indexed winnerSubId);
        event Disputed(address indexed disputer, string reason);
        event DisputeResolved(uint256 indexed winnerSubId);
        event Cancelled();

        function specCid() external view returns (string memory);
        function getSubmission(uint256 subId) external view returns (Submission memory);
        function winningSubmissionId() external view returns (uint256);
    }
}

/// Events emitted by the factory
pub const FACTORY_EVENTS: &[&str] = &[
    "ChallengeCreated(uint256 indexed id, address indexed challenge, address indexed poster, uint256 rewardAmount)",
];

/// Events emitted by each challenge contract
pub const CHALLENGE_EVENTS: &[&str] = &[
    "Submitted(uint256 indexed subId, address indexed solver, bytes32 resultHash)",
    "Scored(uint256 indexed subId, uint256 score, bytes32 proofBundleHash)",
    "Finalized(uint256 indexed winnerSubId)",
    "Disputed(address indexed disputer, string reason)",
    "DisputeResolved(uint256 indexed winnerSubId)",
    "Cancelled()",
];

/// Event set of one contract, keyed by selector (`topic0`)
#[derive(Debug, Clone)]
pub struct ContractAbi {
    name: String,
    events: HashMap<B256, Event>,
    shape: ArgShape,
}

impl ContractAbi {
    /// Parse event signatures.
    ///
    /// Arguments are exposed by name when every input of every event is
    /// named, and by position otherwise.
    pub fn parse(name: impl Into<String>, signatures: &[&str]) -> ChainResult<Self> {
        let mut events = HashMap::with_capacity(signatures.len());
        for signature in signatures {
            let event = Event::parse(signature)
                .map_err(|e| ChainError::InvalidAbi(format!("{signature}: {e}")))?;
            events.insert(event.selector(), event);
        }

        let all_named = events
            .values()
            .flat_map(|event| event.inputs.iter())
            .all(|input| !input.name.is_empty());
        let shape = if all_named {
            ArgShape::Named
        } else {
            ArgShape::Positional
        };

        Ok(Self {
            name: name.into(),
            events,
            shape,
        })
    }

    /// Factory contract ABI
    pub fn factory() -> ChainResult<Self> {
        Self::parse("HermesFactory", FACTORY_EVENTS)
    }

    /// Challenge contract ABI
    pub fn challenge() -> ChainResult<Self> {
        Self::parse("HermesChallenge", CHALLENGE_EVENTS)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an event by its selector
    pub fn event(&self, selector: &B256) -> Option<&Event> {
        self.events.get(selector)
    }

    pub fn shape(&self) -> ArgShape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolEvent;

    #[test]
    fn test_signatures_match_bindings() {
        let factory = ContractAbi::factory().unwrap();
        assert!(factory
            .event(&IHermesFactory::ChallengeCreated::SIGNATURE_HASH)
            .is_some());

        let challenge = ContractAbi::challenge().unwrap();
        for selector in [
            IHermesChallenge::Submitted::SIGNATURE_HASH,
            IHermesChallenge::Scored::SIGNATURE_HASH,
            IHermesChallenge::Finalized::SIGNATURE_HASH,
            IHermesChallenge::Disputed::SIGNATURE_HASH,
            IHermesChallenge::DisputeResolved::SIGNATURE_HASH,
            IHermesChallenge::Cancelled::SIGNATURE_HASH,
        ] {
            assert!(challenge.event(&selector).is_some());
        }
        assert_eq!(challenge.len(), 6);
    }

    #[test]
    fn test_shape_selection() {
        assert_eq!(ContractAbi::challenge().unwrap().shape(), ArgShape::Named);

        let positional =
            ContractAbi::parse("Legacy", &["Scored(uint256 indexed, uint256, bytes32)"]).unwrap();
        assert_eq!(positional.shape(), ArgShape::Positional);
    }

    #[test]
    fn test_invalid_signature() {
        assert!(matches!(
            ContractAbi::parse("Broken", &["Scored(uint999 x"]),
            Err(ChainError::InvalidAbi(_))
        ));
    }
}
