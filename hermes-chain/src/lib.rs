//! Hermes Chain
//!
//! Read side of the Hermes contracts:
//!
//! - [`EventSource`]: block numbers, logs and contract view calls, with a
//!   JSON-RPC implementation ([`RpcEventSource`]) and a mock
//!   ([`MockEventSource`])
//! - [`ContractAbi`] and [`decode_logs`]: raw logs to [`DecodedEvent`]s
//!
//! # Usage
//!
//! ```ignore
//! use hermes_chain::{decode_logs, ContractAbi, EventSource, RpcEventSource};
//!
//! let source = RpcEventSource::connect("https://sepolia.base.org")?;
//! let abi = ContractAbi::factory()?;
//! let head = source.latest_block().await?;
//! let logs = source.logs(factory, head - 100, head).await?;
//! for event in decode_logs(&abi, &logs)? {
//!     println!("{} at {:?}", event.name, event.position());
//! }
//! ```

pub mod abi;
pub mod decode;
pub mod error;
pub mod mock;
pub mod rpc;
pub mod source;

pub use abi::{ContractAbi, IHermesChallenge, IHermesFactory, CHALLENGE_EVENTS, FACTORY_EVENTS};
pub use decode::{args, decode_logs, Arg, ArgReader, ArgShape, DecodedEvent};
pub use error::{ChainError, ChainResult};
pub use mock::MockEventSource;
pub use rpc::RpcEventSource;
pub use source::{EventSource, OnChainSubmission, RawLog};

pub use alloy::primitives::{Address, B256, U256};
