//! tacindex-core — foundation for the TAC chain indexer.
//!
//! # Architecture
//!
//! ```text
//! Indexer (tacindex-cmd) ── MsgTypeRegistry  (type URL → Msg prototype)
//!        │
//!        └── IndexLoop (tacindex-cosmos)
//!                ├── CosmosFetcher     (CometBFT RPC + LCD)
//!                ├── MsgProcessor      (known / unknown / invalid messages)
//!                ├── CheckpointManager (crash recovery)
//!                └── IndexStore        (memory / Postgres)
//! ```

pub mod checkpoint;
pub mod error;
pub mod indexer;
pub mod msg;
pub mod registry;
pub mod types;

pub use checkpoint::{Checkpoint, CheckpointManager, CheckpointStore, IndexStore};
pub use error::{IndexerError, MsgError, RegistryError};
pub use indexer::{IndexerConfig, IndexerState};
pub use msg::{AccAddress, Msg, MsgTypeMap, ProtoMessage};
pub use registry::MsgTypeRegistry;
pub use types::{
    BlockSummary, Coin, IndexStats, IndexedBlock, IndexedMsg, IndexedTx, MsgStatus, RawMsg, RawTx,
};
