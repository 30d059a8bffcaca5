//! Fluent builder API for creating Cosmos indexers.
//!
//! # Example
//!
//! ```rust,no_run
//! use tacindex_cosmos::IndexerBuilder;
//!
//! let config = IndexerBuilder::new()
//!     .chain_id("tacchain_239-1")
//!     .start_height(1_200_000)
//!     .checkpoint_interval(50)
//!     .build_config();
//! ```

use std::sync::Arc;

use tacindex_core::checkpoint::{CheckpointStore, IndexStore};
use tacindex_core::indexer::IndexerConfig;
use tacindex_core::registry::MsgTypeRegistry;
use tacindex_storage::InMemoryStorage;

use crate::fetcher::CosmosRpcClient;
use crate::index_loop::IndexLoop;

/// Fluent builder for `IndexerConfig` and `IndexLoop`.
#[derive(Default)]
pub struct IndexerBuilder {
    config: IndexerConfig,
    registry: Option<Arc<MsgTypeRegistry>>,
    store: Option<(Arc<dyn IndexStore>, Arc<dyn CheckpointStore>)>,
}

impl IndexerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing config.
    pub fn from_config(config: IndexerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Set the indexer ID (used for checkpoint keys).
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.config.id = id.into();
        self
    }

    /// Set the chain ID the node must report.
    pub fn chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.config.chain_id = chain_id.into();
        self
    }

    /// Set the first height to index.
    pub fn start_height(mut self, height: u64) -> Self {
        self.config.start_height = Some(height);
        self
    }

    /// Set the last height to index (bounded backfill).
    pub fn end_height(mut self, height: u64) -> Self {
        self.config.end_height = Some(height);
        self
    }

    /// Ignore any saved checkpoint.
    pub fn reindex(mut self, reindex: bool) -> Self {
        self.config.reindex = reindex;
        self
    }

    /// Index blocks only, skipping transactions.
    pub fn blocks_only(mut self) -> Self {
        self.config.index_transactions = false;
        self
    }

    /// Set checkpoint save interval (every N blocks).
    pub fn checkpoint_interval(mut self, n: u64) -> Self {
        self.config.checkpoint_interval = n;
        self
    }

    /// Set live mode polling interval in milliseconds.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Use this message type registry.
    pub fn registry(mut self, registry: Arc<MsgTypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use this storage backend (blocks + checkpoints).
    pub fn store<S: IndexStore + 'static>(mut self, store: Arc<S>) -> Self {
        let checkpoints: Arc<dyn CheckpointStore> = store.clone();
        let blocks: Arc<dyn IndexStore> = store;
        self.store = Some((blocks, checkpoints));
        self
    }

    /// Build the `IndexerConfig`.
    pub fn build_config(self) -> IndexerConfig {
        self.config
    }

    /// Build an `IndexLoop` over `client`.
    ///
    /// Defaults to an empty registry and in-memory storage.
    pub fn build<C: CosmosRpcClient>(self, client: C) -> IndexLoop<C> {
        let registry = self.registry.unwrap_or_default();
        let (blocks, checkpoints) = self.store.unwrap_or_else(|| {
            let mem = Arc::new(InMemoryStorage::new());
            let checkpoints: Arc<dyn CheckpointStore> = mem.clone();
            let blocks: Arc<dyn IndexStore> = mem;
            (blocks, checkpoints)
        });
        IndexLoop::new(self.config, client, registry, blocks, checkpoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let cfg = IndexerBuilder::new().build_config();
        assert_eq!(cfg.chain_id, "tacchain_239-1");
        assert_eq!(cfg.checkpoint_interval, 100);
        assert!(cfg.index_transactions);
        assert!(cfg.start_height.is_none());
    }

    #[test]
    fn builder_custom() {
        let cfg = IndexerBuilder::new()
            .id("evm-indexer")
            .chain_id("tacchain_2391-1")
            .start_height(50_000)
            .end_height(60_000)
            .reindex(true)
            .blocks_only()
            .checkpoint_interval(10)
            .build_config();

        assert_eq!(cfg.id, "evm-indexer");
        assert_eq!(cfg.chain_id, "tacchain_2391-1");
        assert_eq!(cfg.start_height, Some(50_000));
        assert_eq!(cfg.end_height, Some(60_000));
        assert!(cfg.reindex);
        assert!(!cfg.index_transactions);
        assert_eq!(cfg.checkpoint_interval, 10);
    }
}
