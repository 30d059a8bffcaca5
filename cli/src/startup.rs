//! Startup sequence: register the EVM types, then hand over to the engine.

use std::error::Error as StdError;

use tacindex_core::error::RegistryError;
use tacindex_core::msg::MsgTypeMap;

use crate::evm_types::{tac_evm_type_map, EvmTxKind};

/// The parts of the indexer engine the startup sequence drives.
pub trait IndexerEngine {
    type Error: StdError + Send + Sync + 'static;

    fn register_custom_msg_types_by_type_urls(
        &mut self,
        types: MsgTypeMap,
    ) -> Result<(), RegistryError>;

    /// Parse the process arguments and run the selected command.
    fn execute(self) -> Result<(), Self::Error>;
}

impl IndexerEngine for tacindex_cmd::Indexer {
    type Error = tacindex_cmd::CmdError;

    fn register_custom_msg_types_by_type_urls(
        &mut self,
        types: MsgTypeMap,
    ) -> Result<(), RegistryError> {
        tacindex_cmd::Indexer::register_custom_msg_types_by_type_urls(self, types)
    }

    fn execute(self) -> Result<(), Self::Error> {
        tacindex_cmd::Indexer::execute(self)
    }
}

/// Why startup failed. Both cases have already been logged.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to register EVM message types: {0}")]
    Register(#[source] RegistryError),

    #[error("failed to execute: {0}")]
    Execute(#[source] Box<dyn StdError + Send + Sync>),
}

/// Register the TAC EVM message types with `engine` and run it.
pub fn run<E: IndexerEngine>(mut engine: E) -> Result<(), StartupError> {
    if let Err(e) = engine.register_custom_msg_types_by_type_urls(tac_evm_type_map()) {
        tracing::error!("Failed to register EVM message types. Err: {e}");
        return Err(StartupError::Register(e));
    }

    tracing::info!("Registered EVM message types for TAC chain:");
    for kind in EvmTxKind::ALL {
        tracing::info!("  - {}", kind.type_url());
    }

    engine.execute().map_err(|e| {
        tracing::error!("Failed to execute. Err: {e}");
        StartupError::Execute(Box::new(e))
    })
}
