//! Shared types for the indexing pipeline.

use serde::{Deserialize, Serialize};

// ─── BlockSummary ─────────────────────────────────────────────────────────────

/// A minimal summary of a CometBFT block header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    /// Block height.
    pub height: u64,
    /// Block hash (upper-case hex, as reported by CometBFT).
    pub hash: String,
    /// Hash of the previous block (`last_block_id.hash`).
    pub parent_hash: String,
    /// Chain ID from the header (e.g. `"tacchain_239-1"`).
    pub chain_id: String,
    /// Unix timestamp of the block (seconds since epoch).
    pub timestamp: i64,
    /// Proposer validator address (hex).
    pub proposer: String,
    /// Number of transactions in the block.
    pub tx_count: u32,
}

impl BlockSummary {
    /// Returns `true` if `parent` is the direct parent of `self`.
    pub fn extends(&self, parent: &BlockSummary) -> bool {
        self.height == parent.height + 1 && self.parent_hash == parent.hash
    }
}

// ─── Transactions ─────────────────────────────────────────────────────────────

/// A coin amount (`"1000"` of `"utac"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

/// A message as found in a transaction body: its `Any` type URL plus the
/// JSON rendering the node returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMsg {
    pub type_url: String,
    pub value: serde_json::Value,
}

/// A transaction as returned by the node, before message classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTx {
    pub hash: String,
    pub height: u64,
    /// ABCI result code (`0` = success).
    pub code: u32,
    pub codespace: String,
    pub gas_wanted: u64,
    pub gas_used: u64,
    pub memo: String,
    pub fee: Vec<Coin>,
    pub messages: Vec<RawMsg>,
}

// ─── Indexed output ───────────────────────────────────────────────────────────

/// How a message's type URL resolved against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MsgStatus {
    /// Registered and passed `validate_basic`.
    Known,
    /// Type URL not registered.
    Unknown,
    /// Registered but `validate_basic` failed.
    Invalid { reason: String },
}

impl MsgStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Known => "known",
            Self::Unknown => "unknown",
            Self::Invalid { .. } => "invalid",
        }
    }

    /// Why the message failed validation; `None` unless `Invalid`.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Invalid { reason } => Some(reason),
            _ => None,
        }
    }
}

/// A classified transaction message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedMsg {
    /// Position of the message within the transaction body.
    pub index: u32,
    pub type_url: String,
    pub status: MsgStatus,
    /// Routing category from the registered prototype.
    pub route: Option<String>,
    /// Message type label from the registered prototype.
    pub msg_type: Option<String>,
    pub signers: Vec<String>,
    pub value: serde_json::Value,
}

/// A transaction with its messages classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedTx {
    pub hash: String,
    pub height: u64,
    pub code: u32,
    pub codespace: String,
    pub gas_wanted: u64,
    pub gas_used: u64,
    pub memo: String,
    pub fee: Vec<Coin>,
    pub messages: Vec<IndexedMsg>,
}

/// Everything the indexer persists for one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedBlock {
    pub block: BlockSummary,
    pub txs: Vec<IndexedTx>,
}

// ─── IndexStats ───────────────────────────────────────────────────────────────

/// Running counters for an index run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub blocks: u64,
    pub txs: u64,
    pub known_msgs: u64,
    pub unknown_msgs: u64,
    pub invalid_msgs: u64,
}

impl IndexStats {
    /// Fold one indexed block into the counters.
    pub fn record(&mut self, block: &IndexedBlock) {
        self.blocks += 1;
        self.txs += block.txs.len() as u64;
        for msg in block.txs.iter().flat_map(|tx| &tx.messages) {
            match msg.status {
                MsgStatus::Known => self.known_msgs += 1,
                MsgStatus::Unknown => self.unknown_msgs += 1,
                MsgStatus::Invalid { .. } => self.invalid_msgs += 1,
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
