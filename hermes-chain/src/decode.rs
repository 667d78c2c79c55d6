//! Event Decoder
//!
//! Turns raw logs into [`DecodedEvent`]s using a [`ContractAbi`]. Logs whose
//! `topic0` matches no known event are dropped, so unrelated events emitted
//! at the same address never fail a pass. A log that matches a known
//! selector but does not decode is an error.
//!
//! Arguments are read through [`ArgReader`], which resolves an
//! `(index, names)` pair against either a positional or a named
//! representation.

use alloy::dyn_abi::{DynSolValue, EventExt};
use alloy::primitives::{Address, B256, U256};
use hermes_core::{hash_key, EventKey};
use tracing::trace;

use crate::abi::ContractAbi;
use crate::error::{ChainError, ChainResult};
use crate::source::RawLog;

/// Argument representation chosen for a decoded batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    /// Values in declaration order
    Positional,
    /// `(name, value)` pairs
    Named,
}

/// Reference to an event argument: declaration index plus accepted names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arg {
    pub index: usize,
    pub names: &'static [&'static str],
}

impl Arg {
    pub const fn new(index: usize, names: &'static [&'static str]) -> Self {
        Self { index, names }
    }

    fn label(&self) -> String {
        self.names
            .first()
            .map(|name| name.to_string())
            .unwrap_or_else(|| format!("#{}", self.index))
    }
}

/// Arguments read by the projector
pub mod args {
    use super::Arg;

    pub const CHALLENGE_ID: Arg = Arg::new(0, &["id"]);
    pub const CHALLENGE_ADDRESS: Arg =
        Arg::new(1, &["challenge", "challengeAddr", "challengeAddress"]);
    pub const POSTER: Arg = Arg::new(2, &["poster", "creator"]);
    pub const REWARD: Arg = Arg::new(3, &["rewardAmount", "reward"]);

    pub const SUBMISSION_ID: Arg = Arg::new(0, &["subId", "submissionId"]);
    pub const SCORE: Arg = Arg::new(1, &["score"]);
    pub const PROOF_BUNDLE_HASH: Arg = Arg::new(2, &["proofBundleHash"]);

    pub const WINNER: Arg = Arg::new(0, &["winnerSubId"]);
}

/// Uniform access to decoded event arguments
#[derive(Debug, Clone, PartialEq)]
pub enum ArgReader {
    Positional(Vec<DynSolValue>),
    Named(Vec<(String, DynSolValue)>),
}

impl ArgReader {
    fn from_values(shape: ArgShape, values: Vec<(String, DynSolValue)>) -> Self {
        match shape {
            ArgShape::Positional => {
                ArgReader::Positional(values.into_iter().map(|(_, value)| value).collect())
            }
            ArgShape::Named => ArgReader::Named(values),
        }
    }

    /// Resolve by position or by the first matching name
    pub fn get(&self, index: usize, names: &[&str]) -> Option<&DynSolValue> {
        match self {
            ArgReader::Positional(values) => values.get(index),
            ArgReader::Named(pairs) => names.iter().find_map(|name| {
                pairs
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| value)
            }),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArgReader::Positional(values) => values.len(),
            ArgReader::Named(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One decoded log
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub name: String,
    pub args: ArgReader,
    /// Emitting contract
    pub address: Address,
    pub tx_hash: B256,
    pub log_index: u64,
    pub block_number: u64,
}

impl DecodedEvent {
    /// Dedup ledger key
    pub fn key(&self) -> EventKey {
        EventKey::new(hash_key(&self.tx_hash), self.log_index)
    }

    /// Ordering key within a block range
    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }

    fn value(&self, arg: Arg) -> ChainResult<&DynSolValue> {
        self.args
            .get(arg.index, arg.names)
            .ok_or_else(|| ChainError::invalid_argument(&self.name, arg.label()))
    }

    /// Unsigned integer argument
    pub fn uint(&self, arg: Arg) -> ChainResult<U256> {
        self.value(arg)?
            .as_uint()
            .map(|(value, _)| value)
            .ok_or_else(|| ChainError::invalid_argument(&self.name, arg.label()))
    }

    /// Unsigned integer argument that must fit a `u64` (ids)
    pub fn uint_u64(&self, arg: Arg) -> ChainResult<u64> {
        u64::try_from(self.uint(arg)?)
            .map_err(|_| ChainError::invalid_argument(&self.name, arg.label()))
    }

    /// Address argument
    pub fn address(&self, arg: Arg) -> ChainResult<Address> {
        self.value(arg)?
            .as_address()
            .ok_or_else(|| ChainError::invalid_argument(&self.name, arg.label()))
    }

    /// `bytes32` argument
    pub fn bytes32(&self, arg: Arg) -> ChainResult<B256> {
        match self.value(arg)?.as_fixed_bytes() {
            Some((bytes, 32)) => Ok(B256::from_slice(bytes)),
            _ => Err(ChainError::invalid_argument(&self.name, arg.label())),
        }
    }
}

/// Decode every log that matches an event of `abi`.
pub fn decode_logs(abi: &ContractAbi, logs: &[RawLog]) -> ChainResult<Vec<DecodedEvent>> {
    let mut decoded = Vec::with_capacity(logs.len());

    for log in logs {
        let Some(event) = log.topics.first().and_then(|topic0| abi.event(topic0)) else {
            trace!(
                contract = abi.name(),
                tx_hash = %log.tx_hash,
                log_index = log.log_index,
                "skipping log with unknown selector"
            );
            continue;
        };

        let decode_error = |reason: String| ChainError::Decode {
            event: event.name.clone(),
            key: format!("{}:{}", hash_key(&log.tx_hash), log.log_index),
            reason,
        };

        let parts = event
            .decode_log_parts(log.topics.iter().copied(), &log.data)
            .map_err(|e| decode_error(e.to_string()))?;

        let mut indexed = parts.indexed.into_iter();
        let mut body = parts.body.into_iter();
        let mut values = Vec::with_capacity(event.inputs.len());
        for input in &event.inputs {
            let value = if input.indexed {
                indexed.next()
            } else {
                body.next()
            }
            .ok_or_else(|| decode_error(format!("missing value for {}", input.name)))?;
            values.push((input.name.clone(), value));
        }

        decoded.push(DecodedEvent {
            name: event.name.clone(),
            args: ArgReader::from_values(abi.shape(), values),
            address: log.address,
            tx_hash: log.tx_hash,
            log_index: log.log_index,
            block_number: log.block_number,
        });
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{IHermesChallenge, IHermesFactory};
    use alloy::primitives::{address, Bytes};

    const CHALLENGE: Address = address!("cc00000000000000000000000000000000000001");

    fn scored_log(log_index: u64) -> RawLog {
        RawLog::from_event(
            CHALLENGE,
            &IHermesChallenge::Scored {
                subId: U256::from(3),
                score: U256::from(900_000_000_000_000_000u64),
                proofBundleHash: B256::repeat_byte(0xdd),
            },
            12,
            B256::repeat_byte(0x01),
            log_index,
        )
    }

    #[test]
    fn test_decode_named_arguments() {
        let abi = ContractAbi::challenge().unwrap();
        let events = decode_logs(&abi, &[scored_log(4)]).unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.name, "Scored");
        assert!(matches!(event.args, ArgReader::Named(_)));
        assert_eq!(event.uint_u64(args::SUBMISSION_ID).unwrap(), 3);
        assert_eq!(
            event.uint(args::SCORE).unwrap(),
            U256::from(900_000_000_000_000_000u64)
        );
        assert_eq!(
            event.bytes32(args::PROOF_BUNDLE_HASH).unwrap(),
            B256::repeat_byte(0xdd)
        );
        assert_eq!(event.position(), (12, 4));
    }

    #[test]
    fn test_positional_and_named_resolve_identically() {
        let named = ContractAbi::challenge().unwrap();
        let positional = ContractAbi::parse(
            "Legacy",
            &["Scored(uint256 indexed, uint256, bytes32)"],
        )
        .unwrap();

        let a = decode_logs(&named, &[scored_log(0)]).unwrap().remove(0);
        let b = decode_logs(&positional, &[scored_log(0)]).unwrap().remove(0);

        assert!(matches!(b.args, ArgReader::Positional(_)));
        for arg in [args::SUBMISSION_ID, args::SCORE, args::PROOF_BUNDLE_HASH] {
            assert_eq!(
                a.args.get(arg.index, arg.names),
                b.args.get(arg.index, arg.names)
            );
        }
    }

    #[test]
    fn test_alias_lookup() {
        let abi = ContractAbi::parse(
            "Renamed",
            &["ChallengeCreated(uint256 indexed id, address indexed challengeAddress, address indexed creator, uint256 reward)"],
        )
        .unwrap();
        let log = RawLog::from_event(
            CHALLENGE,
            &IHermesFactory::ChallengeCreated {
                id: U256::from(7),
                challenge: CHALLENGE,
                poster: address!("aa00000000000000000000000000000000000001"),
                rewardAmount: U256::from(10_000_000u64),
            },
            1,
            B256::repeat_byte(0x02),
            0,
        );

        let event = decode_logs(&abi, &[log]).unwrap().remove(0);
        assert_eq!(event.address(args::CHALLENGE_ADDRESS).unwrap(), CHALLENGE);
        assert_eq!(
            event.address(args::POSTER).unwrap(),
            address!("aa00000000000000000000000000000000000001")
        );
        assert_eq!(event.uint(args::REWARD).unwrap(), U256::from(10_000_000u64));
    }

    #[test]
    fn test_unknown_selector_is_dropped() {
        let abi = ContractAbi::factory().unwrap();
        let events = decode_logs(&abi, &[scored_log(0)]).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_malformed_known_log_is_error() {
        let abi = ContractAbi::challenge().unwrap();
        let mut log = scored_log(0);
        log.data = Bytes::from_static(&[0x01, 0x02]);

        assert!(matches!(
            decode_logs(&abi, &[log]),
            Err(ChainError::Decode { .. })
        ));
    }

    #[test]
    fn test_missing_argument_is_invalid() {
        let abi = ContractAbi::challenge().unwrap();
        let event = decode_logs(&abi, &[scored_log(0)]).unwrap().remove(0);

        assert!(matches!(
            event.address(args::POSTER),
            Err(ChainError::InvalidArgument { .. })
        ));
        assert!(matches!(
            event.address(args::SCORE),
            Err(ChainError::InvalidArgument { .. })
        ));
    }
}
