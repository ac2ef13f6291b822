//! Checkpointed block replay feeding the release index.
//!
//! On startup the index is behind the chain by however many blocks were
//! connected while the process was down (or since genesis on first run).
//! [`ReleaseStorageSynchronizer::tick`] is driven by a periodic scheduler and
//! replays those blocks in ascending height order, after which the node's
//! live block notifications are forwarded to
//! [`ReleaseStorageSynchronizer::process_block`].
//!
//! Replay and live processing share one processing lock and one code path, so
//! the two never interleave and both apply blocks identically. Re-applying a
//! block is harmless: release insertion is idempotent and the checkpoint only
//! moves forward.

use std::sync::{Arc, Mutex, MutexGuard};

use fedsync_store::{BlockStore, ReceiptStore};
use fedsync_types::{Block, TransactionReceipt};

use crate::{ReleaseEventDecoder, ReleaseIndex, ReleaseMetrics, SyncError};

const DEFAULT_MAX_INITIALIZATION_DEPTH: u64 = 6_000;

/// Whether the host node is still downloading its own chain.
pub trait NodeSyncStatus: Send + Sync {
    fn is_syncing(&self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// Historical replay has not completed; live blocks are ignored.
    Unsynced,
    /// A replay pass is applying historical blocks.
    Replaying,
    /// Caught up with the chain head; live blocks are applied. Sticky for the
    /// lifetime of the synchronizer.
    Synced,
}

/// What a [`ReleaseStorageSynchronizer::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    AlreadySynced,
    /// The node is still syncing its own chain; replay deferred.
    NodeSyncing,
    /// Replay reached the chain head after applying `blocks` blocks.
    CaughtUp { blocks: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncOptions {
    /// With no checkpoint stored, replay starts this many blocks below the
    /// current best block instead of at genesis.
    pub max_initialization_depth: u64,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_initialization_depth: DEFAULT_MAX_INITIALIZATION_DEPTH,
        }
    }
}

/// Height of the last block applied, guarded by the processing lock.
struct Cursor {
    last_height: Option<u64>,
}

pub struct ReleaseStorageSynchronizer {
    blocks: Arc<dyn BlockStore>,
    receipts: Arc<dyn ReceiptStore>,
    node_sync: Arc<dyn NodeSyncStatus>,
    index: Arc<dyn ReleaseIndex>,
    decoder: Box<dyn ReleaseEventDecoder>,
    options: SyncOptions,
    metrics: Arc<ReleaseMetrics>,
    state: Mutex<SyncState>,
    processing: Mutex<Cursor>,
}

impl ReleaseStorageSynchronizer {
    pub fn new(
        blocks: Arc<dyn BlockStore>,
        receipts: Arc<dyn ReceiptStore>,
        node_sync: Arc<dyn NodeSyncStatus>,
        index: Arc<dyn ReleaseIndex>,
        decoder: Box<dyn ReleaseEventDecoder>,
        options: SyncOptions,
        metrics: Arc<ReleaseMetrics>,
    ) -> Self {
        Self {
            blocks,
            receipts,
            node_sync,
            index,
            decoder,
            options,
            metrics,
            state: Mutex::new(SyncState::Unsynced),
            processing: Mutex::new(Cursor { last_height: None }),
        }
    }

    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_synced(&self) -> bool {
        self.state() == SyncState::Synced
    }

    fn set_state(&self, next: SyncState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    fn lock_processing(&self) -> MutexGuard<'_, Cursor> {
        self.processing.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run one catch-up pass unless already synced or the node is still syncing.
    ///
    /// A failed pass leaves the synchronizer `Unsynced`; blocks applied before
    /// the failure keep their checkpoint, so the next tick resumes after them.
    pub fn tick(&self) -> Result<TickOutcome, SyncError> {
        let mut cursor = self.lock_processing();

        if self.is_synced() {
            return Ok(TickOutcome::AlreadySynced);
        }
        if self.node_sync.is_syncing() {
            tracing::debug!("node is still syncing, deferring release replay");
            return Ok(TickOutcome::NodeSyncing);
        }

        self.set_state(SyncState::Replaying);
        match self.replay(&mut cursor) {
            Ok(blocks) => {
                self.set_state(SyncState::Synced);
                self.metrics.synced.set(1);
                tracing::info!(
                    blocks,
                    entries = self.index.len(),
                    "release storage synced with chain head"
                );
                Ok(TickOutcome::CaughtUp { blocks })
            }
            Err(e) => {
                self.set_state(SyncState::Unsynced);
                tracing::warn!(error = %e, "release replay pass failed");
                Err(e)
            }
        }
    }

    /// Apply a newly connected block.
    ///
    /// Ignored until historical replay has completed. Release requests are
    /// recorded for every block; the checkpoint only advances for blocks above
    /// the last applied height, so a sibling connected by a reorganization
    /// still contributes its releases without moving the checkpoint backwards.
    pub fn process_block(&self, block: &Block, receipts: &[TransactionReceipt]) {
        let mut cursor = self.lock_processing();

        if self.state() == SyncState::Unsynced {
            tracing::trace!(number = block.number, "release storage not synced, ignoring block");
            return;
        }

        self.metrics.live_blocks.inc();
        match cursor.last_height {
            Some(last) if block.number <= last => {
                tracing::warn!(
                    number = block.number,
                    hash = %block.hash,
                    last_applied = last,
                    "block at or below last applied height, keeping checkpoint"
                );
                self.record_releases(block, receipts);
            }
            _ => self.apply_block(&mut cursor, block, receipts),
        }
    }

    fn replay(&self, cursor: &mut Cursor) -> Result<u64, SyncError> {
        let best = self.blocks.best_block()?;

        let start = match self.index.checkpoint() {
            Some(hash) => {
                let checkpoint = self
                    .blocks
                    .block_by_hash(&hash)?
                    .ok_or(SyncError::UnresolvableCheckpoint(hash))?;
                cursor.last_height = Some(checkpoint.number);
                checkpoint.number + 1
            }
            None => best
                .number
                .saturating_sub(self.options.max_initialization_depth),
        };

        if start > best.number {
            return Ok(0);
        }

        tracing::info!(start, end = best.number, "replaying blocks into release storage");

        let mut applied = 0;
        for height in start..=best.number {
            let block = self
                .blocks
                .chain_block_by_number(height)?
                .ok_or(SyncError::MissingBlock(height))?;
            let receipts = self.receipts.receipts_for_block(&block)?;
            self.apply_block(cursor, &block, &receipts);
            self.metrics.replayed_blocks.inc();
            applied += 1;
        }
        Ok(applied)
    }

    fn apply_block(&self, cursor: &mut Cursor, block: &Block, receipts: &[TransactionReceipt]) {
        self.record_releases(block, receipts);
        self.index.set_checkpoint(block.hash);
        cursor.last_height = Some(block.number);
    }

    fn record_releases(&self, block: &Block, receipts: &[TransactionReceipt]) {
        let span = tracing::debug_span!("release_block", number = block.number, hash = %block.hash);
        let _enter = span.enter();

        for receipt in receipts {
            for request in self.decoder.decode_release_requests(receipt) {
                tracing::debug!(
                    btc_tx = %request.btc_tx_hash,
                    rsk_tx = %request.rsk_tx_hash,
                    "release requested"
                );
                self.index
                    .put_release_entry(request.btc_tx_hash, request.rsk_tx_hash);
            }
        }
    }
}
