//! Message processor — classifies transaction messages against the
//! type-URL registry.

use std::sync::Arc;

use tacindex_core::registry::MsgTypeRegistry;
use tacindex_core::types::{
    BlockSummary, IndexedBlock, IndexedMsg, IndexedTx, MsgStatus, RawMsg, RawTx,
};

/// Resolves each message's type URL to a registered prototype.
#[derive(Clone)]
pub struct MsgProcessor {
    registry: Arc<MsgTypeRegistry>,
}

impl MsgProcessor {
    pub fn new(registry: Arc<MsgTypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MsgTypeRegistry {
        &self.registry
    }

    pub fn process_block(&self, block: BlockSummary, txs: Vec<RawTx>) -> IndexedBlock {
        IndexedBlock {
            block,
            txs: txs.into_iter().map(|tx| self.process_tx(tx)).collect(),
        }
    }

    /// Classify every message of `tx`.
    pub fn process_tx(&self, tx: RawTx) -> IndexedTx {
        let messages = tx
            .messages
            .into_iter()
            .enumerate()
            .map(|(i, msg)| self.process_msg(i as u32, msg))
            .collect();

        IndexedTx {
            hash: tx.hash,
            height: tx.height,
            code: tx.code,
            codespace: tx.codespace,
            gas_wanted: tx.gas_wanted,
            gas_used: tx.gas_used,
            memo: tx.memo,
            fee: tx.fee,
            messages,
        }
    }

    fn process_msg(&self, index: u32, raw: RawMsg) -> IndexedMsg {
        let Some(proto) = self.registry.get(&raw.type_url) else {
            return IndexedMsg {
                index,
                type_url: raw.type_url,
                status: MsgStatus::Unknown,
                route: None,
                msg_type: None,
                signers: vec![],
                value: raw.value,
            };
        };

        let status = match proto.validate_basic() {
            Ok(()) => MsgStatus::Known,
            Err(e) => MsgStatus::Invalid {
                reason: e.to_string(),
            },
        };

        IndexedMsg {
            index,
            status,
            route: Some(proto.route().to_string()),
            msg_type: Some(proto.msg_type().to_string()),
            signers: proto.signers().iter().map(ToString::to_string).collect(),
            type_url: raw.type_url,
            value: raw.value,
        }
    }
}
