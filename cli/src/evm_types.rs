//! EVM message types of the TAC chain.
//!
//! TAC runs the Cosmos EVM module, whose transactions arrive as
//! `/cosmos.evm.vm.v1.*` messages. The indexer only needs to recognise
//! these type URLs; the payloads are not decoded, so every kind shares one
//! stateless placeholder implementation.

use std::fmt;

use tacindex_core::error::MsgError;
use tacindex_core::msg::{AccAddress, Msg, MsgTypeMap, ProtoMessage};

/// Routing category shared by all EVM messages.
pub const EVM_ROUTE: &str = "evm";

/// The EVM message kinds registered for TAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvmTxKind {
    /// Ethereum transaction wrapped in a Cosmos message.
    EthereumTx,
    /// EIP-1559 transaction payload.
    DynamicFeeTx,
    /// Pre-EIP-2718 transaction payload.
    LegacyTx,
}

impl EvmTxKind {
    /// All kinds, in registration order.
    pub const ALL: [EvmTxKind; 3] = [Self::EthereumTx, Self::DynamicFeeTx, Self::LegacyTx];

    pub fn type_url(self) -> &'static str {
        match self {
            Self::EthereumTx => "/cosmos.evm.vm.v1.MsgEthereumTx",
            Self::DynamicFeeTx => "/cosmos.evm.vm.v1.DynamicFeeTx",
            Self::LegacyTx => "/cosmos.evm.vm.v1.LegacyTx",
        }
    }

    pub fn msg_type(self) -> &'static str {
        match self {
            Self::EthereumTx => "ethereum_tx",
            Self::DynamicFeeTx => "dynamic_fee_tx",
            Self::LegacyTx => "legacy_tx",
        }
    }

    /// Protobuf message name.
    pub fn name(self) -> &'static str {
        match self {
            Self::EthereumTx => "MsgEthereumTx",
            Self::DynamicFeeTx => "DynamicFeeTx",
            Self::LegacyTx => "LegacyTx",
        }
    }
}

/// Inert stand-in for an EVM message: always valid, nothing to sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvmPlaceholderMsg {
    kind: EvmTxKind,
}

impl EvmPlaceholderMsg {
    pub fn new(kind: EvmTxKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> EvmTxKind {
        self.kind
    }
}

impl fmt::Display for EvmPlaceholderMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.name())
    }
}

impl ProtoMessage for EvmPlaceholderMsg {
    fn reset(&mut self) {}
}

impl Msg for EvmPlaceholderMsg {
    fn route(&self) -> &str {
        EVM_ROUTE
    }

    fn msg_type(&self) -> &str {
        self.kind.msg_type()
    }

    fn validate_basic(&self) -> Result<(), MsgError> {
        Ok(())
    }

    fn sign_bytes(&self) -> Vec<u8> {
        Vec::new()
    }

    fn signers(&self) -> Vec<AccAddress> {
        Vec::new()
    }
}

/// Type URL → placeholder for every [`EvmTxKind`].
pub fn tac_evm_type_map() -> MsgTypeMap {
    EvmTxKind::ALL
        .into_iter()
        .map(|kind| {
            let msg: Box<dyn Msg> = Box::new(EvmPlaceholderMsg::new(kind));
            (kind.type_url().to_string(), msg)
        })
        .collect()
}
