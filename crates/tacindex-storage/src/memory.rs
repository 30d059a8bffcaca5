//! In-memory storage backend.
//!
//! Stores indexed blocks, transactions, messages and checkpoints in RAM.
//! Useful for testing and short-lived indexers that don't need persistence.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use tacindex_core::checkpoint::{Checkpoint, CheckpointStore, IndexStore};
use tacindex_core::error::IndexerError;
use tacindex_core::types::{IndexedBlock, IndexedMsg, MsgStatus};

/// In-memory indexer storage.
///
/// All data is lost when the process exits.
#[derive(Default)]
pub struct InMemoryStorage {
    checkpoints: Mutex<HashMap<(String, String), Checkpoint>>,
    blocks: Mutex<BTreeMap<u64, IndexedBlock>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn blocks(&self) -> MutexGuard<'_, BTreeMap<u64, IndexedBlock>> {
        self.blocks.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn checkpoints(&self) -> MutexGuard<'_, HashMap<(String, String), Checkpoint>> {
        self.checkpoints.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up a stored block by height.
    pub fn block(&self, height: u64) -> Option<IndexedBlock> {
        self.blocks().get(&height).cloned()
    }

    /// Highest stored height.
    pub fn latest_height(&self) -> Option<u64> {
        self.blocks().keys().next_back().copied()
    }

    pub fn block_count(&self) -> usize {
        self.blocks().len()
    }

    pub fn tx_count(&self) -> usize {
        self.blocks().values().map(|b| b.txs.len()).sum()
    }

    /// All stored messages with the given type URL, in chain order.
    pub fn messages_by_type(&self, type_url: &str) -> Vec<IndexedMsg> {
        self.blocks()
            .values()
            .flat_map(|b| &b.txs)
            .flat_map(|tx| &tx.messages)
            .filter(|m| m.type_url == type_url)
            .cloned()
            .collect()
    }

    /// Distinct type URLs that were seen but not registered.
    pub fn unknown_type_urls(&self) -> BTreeSet<String> {
        self.blocks()
            .values()
            .flat_map(|b| &b.txs)
            .flat_map(|tx| &tx.messages)
            .filter(|m| m.status == MsgStatus::Unknown)
            .map(|m| m.type_url.clone())
            .collect()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryStorage {
    async fn load(
        &self,
        chain_id: &str,
        indexer_id: &str,
    ) -> Result<Option<Checkpoint>, IndexerError> {
        Ok(self
            .checkpoints()
            .get(&(chain_id.to_string(), indexer_id.to_string()))
            .cloned())
    }

    async fn save(&self, checkpoint: Checkpoint) -> Result<(), IndexerError> {
        let key = (checkpoint.chain_id.clone(), checkpoint.indexer_id.clone());
        self.checkpoints().insert(key, checkpoint);
        Ok(())
    }

    async fn delete(&self, chain_id: &str, indexer_id: &str) -> Result<(), IndexerError> {
        self.checkpoints()
            .remove(&(chain_id.to_string(), indexer_id.to_string()));
        Ok(())
    }
}

#[async_trait]
impl IndexStore for InMemoryStorage {
    async fn store_block(&self, block: &IndexedBlock) -> Result<(), IndexerError> {
        self.blocks()
            .entry(block.block.height)
            .or_insert_with(|| block.clone());
        Ok(())
    }
}
