//! The main index loop — orchestrates backfill and live phases.
//!
//! # Phase 1: BACKFILL
//! Index every height from the start height up to `min(head, end_height)`.
//! The start height is the saved checkpoint + 1, or `start_height`, or the
//! current head when neither is set.
//!
//! # Phase 2: LIVE
//! Poll the head every `poll_interval_ms` and index each new height until
//! `end_height` (if any) is reached.
//!
//! For every block:
//!   - Check the chain ID (first block) and the parent link
//!   - Fetch and classify its transactions
//!   - Store the block
//!   - Update the checkpoint

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tacindex_core::checkpoint::{CheckpointManager, CheckpointStore, IndexStore};
use tacindex_core::error::IndexerError;
use tacindex_core::indexer::{IndexerConfig, IndexerState};
use tacindex_core::registry::MsgTypeRegistry;
use tacindex_core::types::{BlockSummary, IndexStats, IndexedBlock, MsgStatus};

use crate::fetcher::{CosmosFetcher, CosmosRpcClient};
use crate::processor::MsgProcessor;

/// Log a backfill progress line every N blocks.
const PROGRESS_EVERY: u64 = 1_000;

/// The core index loop implementation.
pub struct IndexLoop<C: CosmosRpcClient> {
    config: IndexerConfig,
    fetcher: CosmosFetcher<C>,
    processor: MsgProcessor,
    store: Arc<dyn IndexStore>,
    checkpoint: CheckpointManager,
    state: IndexerState,
    stats: IndexStats,
    /// Last block written to the store.
    last: Option<BlockSummary>,
    /// Hash of the checkpointed block we resumed after.
    resume_parent: Option<String>,
    /// Unregistered type URLs already reported.
    seen_unknown: HashSet<String>,
}

impl<C: CosmosRpcClient> IndexLoop<C> {
    pub fn new(
        config: IndexerConfig,
        client: C,
        registry: Arc<MsgTypeRegistry>,
        store: Arc<dyn IndexStore>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        let checkpoint = CheckpointManager::new(
            checkpoints,
            &config.chain_id,
            &config.id,
            config.checkpoint_interval,
        );
        Self {
            fetcher: CosmosFetcher::new(client),
            processor: MsgProcessor::new(registry),
            store,
            checkpoint,
            state: IndexerState::Idle,
            stats: IndexStats::default(),
            last: None,
            resume_parent: None,
            seen_unknown: HashSet::new(),
            config,
        }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn state(&self) -> IndexerState {
        self.state
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    /// Height of the last stored block.
    pub fn last_indexed(&self) -> Option<u64> {
        self.last.as_ref().map(|b| b.height)
    }

    /// Run the index loop until `end_height` is reached or an error occurs.
    ///
    /// Without `end_height` this only returns on error; callers stop it by
    /// dropping the future and calling [`IndexLoop::shutdown`].
    pub async fn run(&mut self) -> Result<IndexStats, IndexerError> {
        match self.run_inner().await {
            Ok(()) => Ok(self.stats),
            Err(e) => {
                self.state = IndexerState::Error;
                tracing::error!(error = %e, "index loop failed");
                Err(e)
            }
        }
    }

    /// Save the last indexed height and stop.
    pub async fn shutdown(&mut self) -> Result<(), IndexerError> {
        self.state = IndexerState::Stopping;
        if let Some(last) = &self.last {
            self.checkpoint.force_save(last.height, &last.hash).await?;
            tracing::info!(height = last.height, "checkpoint saved on shutdown");
        }
        self.state = IndexerState::Stopped;
        Ok(())
    }

    async fn run_inner(&mut self) -> Result<(), IndexerError> {
        let head = self.fetcher.latest_height().await?;
        let start = self.start_height(head).await?;

        // Phase 1: Backfill
        self.state = IndexerState::Backfilling;
        let target = match self.config.end_height {
            Some(end) => end.min(head),
            None => head,
        };
        tracing::info!(
            chain_id = %self.config.chain_id,
            from = start,
            to = target,
            head,
            "starting backfill"
        );
        self.backfill(start, target).await?;

        if self.reached_end() || self.config.end_height.is_some_and(|end| end < start) {
            return self.shutdown().await;
        }

        // Phase 2: Live
        self.state = IndexerState::Live;
        tracing::info!(next = self.next_height(start), "following chain head");
        self.live_loop(start).await
    }

    /// Resolve where indexing begins.
    async fn start_height(&mut self, head: u64) -> Result<u64, IndexerError> {
        if self.config.reindex {
            self.checkpoint.reset().await?;
        } else if let Some(cp) = self.checkpoint.load().await? {
            tracing::info!(height = cp.height, hash = %cp.block_hash, "resuming from checkpoint");
            self.resume_parent = Some(cp.block_hash);
            return Ok(cp.height + 1);
        }
        Ok(self.config.start_height.unwrap_or(head))
    }

    fn next_height(&self, start: u64) -> u64 {
        self.last_indexed().map_or(start, |h| h + 1)
    }

    fn reached_end(&self) -> bool {
        match (self.config.end_height, self.last_indexed()) {
            (Some(end), Some(last)) => last >= end,
            _ => false,
        }
    }

    async fn backfill(&mut self, from: u64, to: u64) -> Result<(), IndexerError> {
        for height in from..=to {
            if !self.index_block(height).await? {
                return Err(IndexerError::Rpc(format!(
                    "block {height} is below the reported head but unavailable"
                )));
            }
            if (height - from + 1) % PROGRESS_EVERY == 0 {
                tracing::info!(height, target = to, txs = self.stats.txs, "backfill progress");
            }
        }
        if from <= to {
            tracing::info!(at = to, blocks = self.stats.blocks, "backfill complete");
        }
        Ok(())
    }

    async fn live_loop(&mut self, start: u64) -> Result<(), IndexerError> {
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            tokio::time::sleep(poll_interval).await;

            let head = match self.fetcher.latest_height().await {
                Ok(h) => h,
                Err(e) if e.is_transient() => {
                    tracing::warn!(error = %e, "head poll failed");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let mut next = self.next_height(start);
            while next <= head {
                match self.index_block(next).await {
                    Ok(true) => {}
                    // Not served yet; retry on the next poll
                    Ok(false) => break,
                    Err(e) if e.is_transient() => {
                        tracing::warn!(height = next, error = %e, "block fetch failed");
                        break;
                    }
                    Err(e) => return Err(e),
                }
                if self.reached_end() {
                    return self.shutdown().await;
                }
                next += 1;
            }
        }
    }

    /// Index one height. Returns `false` if the node does not have it yet.
    async fn index_block(&mut self, height: u64) -> Result<bool, IndexerError> {
        let Some((block, raw_txs)) = self
            .fetcher
            .block_with_txs(height, self.config.index_transactions)
            .await?
        else {
            return Ok(false);
        };

        self.verify_link(&block)?;

        let indexed = self.processor.process_block(block.clone(), raw_txs);
        self.report_unknown(&indexed);

        self.store.store_block(&indexed).await?;
        self.stats.record(&indexed);
        self.checkpoint.maybe_save(block.height, &block.hash).await?;

        tracing::debug!(height, txs = indexed.txs.len(), "block indexed");
        self.last = Some(block);
        Ok(true)
    }

    fn verify_link(&self, block: &BlockSummary) -> Result<(), IndexerError> {
        match &self.last {
            Some(prev) if !block.extends(prev) => Err(IndexerError::ChainMismatch {
                height: block.height,
                expected: prev.hash.clone(),
                actual: block.parent_hash.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                if block.chain_id != self.config.chain_id {
                    return Err(IndexerError::Config(format!(
                        "node serves chain {:?}, expected {:?}",
                        block.chain_id, self.config.chain_id
                    )));
                }
                match &self.resume_parent {
                    Some(hash) if *hash != block.parent_hash => Err(IndexerError::ChainMismatch {
                        height: block.height,
                        expected: hash.clone(),
                        actual: block.parent_hash.clone(),
                    }),
                    _ => Ok(()),
                }
            }
        }
    }

    fn report_unknown(&mut self, block: &IndexedBlock) {
        for msg in block.txs.iter().flat_map(|tx| &tx.messages) {
            if msg.status == MsgStatus::Unknown && self.seen_unknown.insert(msg.type_url.clone()) {
                tracing::warn!(
                    type_url = %msg.type_url,
                    height = block.block.height,
                    "unregistered message type"
                );
            }
        }
    }
}
