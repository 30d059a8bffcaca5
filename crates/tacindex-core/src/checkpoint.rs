//! Checkpoint manager — persists the indexer's position for crash recovery.
//!
//! A checkpoint stores the last successfully indexed height and block hash.
//! On restart the indexer resumes at `height + 1` instead of starting over.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::IndexerError;
use crate::types::IndexedBlock;

/// A persisted checkpoint for an indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Chain ID (e.g. `"tacchain_239-1"`).
    pub chain_id: String,
    /// Unique indexer identifier.
    pub indexer_id: String,
    /// Last successfully indexed height.
    pub height: u64,
    /// Hash of the block at `height`.
    pub block_hash: String,
    /// Unix timestamp of when this checkpoint was saved.
    pub updated_at: i64,
}

/// Trait for storing and loading checkpoints.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the latest checkpoint for a chain + indexer pair.
    async fn load(
        &self,
        chain_id: &str,
        indexer_id: &str,
    ) -> Result<Option<Checkpoint>, IndexerError>;

    /// Save (upsert) a checkpoint.
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), IndexerError>;

    /// Delete a checkpoint (e.g. when reindexing).
    async fn delete(&self, chain_id: &str, indexer_id: &str) -> Result<(), IndexerError>;
}

/// A storage backend for indexed blocks; every backend also keeps checkpoints.
#[async_trait]
pub trait IndexStore: CheckpointStore {
    /// Persist a block with its classified transactions.
    ///
    /// Storing the same height twice must not duplicate rows.
    async fn store_block(&self, block: &IndexedBlock) -> Result<(), IndexerError>;
}

/// Manages checkpoint reads/writes for one indexer.
pub struct CheckpointManager {
    store: Arc<dyn CheckpointStore>,
    chain_id: String,
    indexer_id: String,
    /// Save every N blocks.
    save_interval: u64,
    /// Blocks since the last save.
    pending: u64,
}

impl CheckpointManager {
    pub fn new(
        store: Arc<dyn CheckpointStore>,
        chain_id: impl Into<String>,
        indexer_id: impl Into<String>,
        save_interval: u64,
    ) -> Self {
        Self {
            store,
            chain_id: chain_id.into(),
            indexer_id: indexer_id.into(),
            save_interval: save_interval.max(1),
            pending: 0,
        }
    }

    /// Load the saved checkpoint (`None` if none exists).
    pub async fn load(&self) -> Result<Option<Checkpoint>, IndexerError> {
        self.store.load(&self.chain_id, &self.indexer_id).await
    }

    /// Save a checkpoint once every `save_interval` calls.
    ///
    /// Call this after each block is stored.
    pub async fn maybe_save(&mut self, height: u64, block_hash: &str) -> Result<(), IndexerError> {
        self.pending += 1;
        if self.pending >= self.save_interval {
            self.force_save(height, block_hash).await?;
        }
        Ok(())
    }

    /// Save immediately (shutdown, end of a bounded run).
    pub async fn force_save(&mut self, height: u64, block_hash: &str) -> Result<(), IndexerError> {
        let cp = Checkpoint {
            chain_id: self.chain_id.clone(),
            indexer_id: self.indexer_id.clone(),
            height,
            block_hash: block_hash.to_string(),
            updated_at: chrono::Utc::now().timestamp(),
        };
        self.store.save(cp).await?;
        self.pending = 0;
        tracing::debug!(height, "checkpoint saved");
        Ok(())
    }

    /// Drop the saved checkpoint.
    pub async fn reset(&mut self) -> Result<(), IndexerError> {
        self.pending = 0;
        self.store.delete(&self.chain_id, &self.indexer_id).await
    }

    /// Blocks indexed since the last save.
    pub fn pending(&self) -> u64 {
        self.pending
    }
}

// ─── In-memory store (for testing) ────────────────────────────────────────────

/// In-memory checkpoint store for tests and ephemeral indexers.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    data: Mutex<HashMap<(String, String), Checkpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(
        &self,
        chain_id: &str,
        indexer_id: &str,
    ) -> Result<Option<Checkpoint>, IndexerError> {
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        Ok(data
            .get(&(chain_id.to_string(), indexer_id.to_string()))
            .cloned())
    }

    async fn save(&self, checkpoint: Checkpoint) -> Result<(), IndexerError> {
        let key = (checkpoint.chain_id.clone(), checkpoint.indexer_id.clone());
        self.data
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, checkpoint);
        Ok(())
    }

    async fn delete(&self, chain_id: &str, indexer_id: &str) -> Result<(), IndexerError> {
        self.data
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(chain_id.to_string(), indexer_id.to_string()));
        Ok(())
    }
}
