//! Indexer configuration and state types.

use serde::{Deserialize, Serialize};

/// Configuration for an indexer instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Unique name for this indexer (used for checkpoint keys).
    pub id: String,
    /// Chain ID the node must report (e.g. `"tacchain_239-1"`).
    pub chain_id: String,
    /// First height to index. `None` = resume from checkpoint, else chain head.
    pub start_height: Option<u64>,
    /// Optional last height (for bounded backfill). `None` = run forever.
    pub end_height: Option<u64>,
    /// Ignore any saved checkpoint and start from `start_height`.
    pub reindex: bool,
    /// Fetch and classify transactions (blocks only when `false`).
    pub index_transactions: bool,
    /// How often to save a checkpoint (every N blocks).
    pub checkpoint_interval: u64,
    /// Head polling interval in live mode (milliseconds).
    pub poll_interval_ms: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            id: "tac-indexer".into(),
            chain_id: "tacchain_239-1".into(),
            start_height: None,
            end_height: None,
            reindex: false,
            index_transactions: true,
            checkpoint_interval: 100,
            poll_interval_ms: 2000,
        }
    }
}

/// Runtime state of the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexerState {
    /// Not yet started.
    Idle,
    /// Syncing historical blocks up to the current head.
    Backfilling,
    /// Following the chain tip in real-time.
    Live,
    /// Shutting down gracefully.
    Stopping,
    /// Terminated.
    Stopped,
    /// Encountered an unrecoverable error.
    Error,
}

impl std::fmt::Display for IndexerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Backfilling => write!(f, "backfilling"),
            Self::Live => write!(f, "live"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
            Self::Error => write!(f, "error"),
        }
    }
}
