//! tac-indexer — the TAC chain build of the Cosmos indexer.
//!
//! Adds the EVM message types to the engine's registry before running it.

pub mod evm_types;
pub mod startup;

pub use evm_types::{tac_evm_type_map, EvmPlaceholderMsg, EvmTxKind};
pub use startup::{run, IndexerEngine, StartupError};
