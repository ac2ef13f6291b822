//! Debounced access to the persisted release state.
//!
//! Reads and writes hit the in-memory [`ReleaseState`] directly; every
//! mutation then asks for a deferred flush of the whole state. A flush that is
//! already pending is cancelled and rescheduled, restarting the countdown, so
//! a burst of writes becomes a single disk write once the burst quiets down.
//! After `max_delays` extensions the pending flush is left alone and fires at
//! its scheduled time, which bounds how stale the disk copy can get under
//! sustained write pressure.
//!
//! State, pending-flush bookkeeping and the flush itself share one mutex, so a
//! flush never persists a half-applied mutation.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use fedsync_store::{ReleaseState, ReleaseStateStorage};
use fedsync_types::{BtcTxHash, NetworkId, RskHash};

use crate::scheduler::{ScheduledTask, TaskScheduler};
use crate::{AccessorError, ReleaseMetrics};

const DEFAULT_DELAY: Duration = Duration::from_millis(5);
const DEFAULT_MAX_DELAYS: u32 = 5;

/// Read/write view of the release index and chain checkpoint.
///
/// This is what the synchronizer drives; [`ReleaseStorageAccessor`] is the
/// production implementation.
pub trait ReleaseIndex: Send + Sync {
    /// Hash of the last block whose effects are reflected in the index.
    fn checkpoint(&self) -> Option<RskHash>;

    fn set_checkpoint(&self, hash: RskHash);

    fn has_release_entry(&self, btc_tx_hash: &BtcTxHash) -> bool;

    /// The smart-contract transaction that requested `btc_tx_hash`, if known.
    fn requester(&self, btc_tx_hash: &BtcTxHash) -> Option<RskHash>;

    fn put_release_entry(&self, btc_tx_hash: BtcTxHash, rsk_tx_hash: RskHash);

    /// Number of release entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Debounce tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessorOptions {
    /// Quiet period after the last mutation before the state is flushed.
    pub delay: Duration,
    /// How many times a pending flush may be pushed back.
    pub max_delays: u32,
}

impl Default for AccessorOptions {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            max_delays: DEFAULT_MAX_DELAYS,
        }
    }
}

struct PendingFlush {
    generation: u64,
    task: Box<dyn ScheduledTask>,
}

struct Inner {
    state: ReleaseState,
    pending: Option<PendingFlush>,
    /// Times the pending flush has been pushed back.
    delays: u32,
    /// Identifies the most recently scheduled flush.
    generation: u64,
}

pub struct ReleaseStorageAccessor {
    network: NetworkId,
    storage: Arc<dyn ReleaseStateStorage>,
    scheduler: Arc<dyn TaskScheduler>,
    options: AccessorOptions,
    metrics: Arc<ReleaseMetrics>,
    inner: Mutex<Inner>,
    this: Weak<ReleaseStorageAccessor>,
}

impl ReleaseStorageAccessor {
    /// Load the release state for `network` and start serving it.
    ///
    /// Any failure to read the stored state is fatal: callers must not start
    /// release tracking on top of a state that could not be loaded.
    pub fn open(
        network: NetworkId,
        storage: Arc<dyn ReleaseStateStorage>,
        scheduler: Arc<dyn TaskScheduler>,
        options: AccessorOptions,
        metrics: Arc<ReleaseMetrics>,
    ) -> Result<Arc<Self>, AccessorError> {
        let state = storage
            .read(network)
            .map_err(|source| AccessorError::InvalidStorageFile {
                network: network.as_str(),
                source,
            })?;

        tracing::info!(
            network = network.as_str(),
            entries = state.release_hashes.len(),
            checkpoint = ?state.best_block_hash,
            "release state loaded"
        );

        Ok(Arc::new_cyclic(|this| Self {
            network,
            storage,
            scheduler,
            options,
            metrics,
            inner: Mutex::new(Inner {
                state,
                pending: None,
                delays: 0,
                generation: 0,
            }),
            this: this.clone(),
        }))
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }

    /// Copy of the current in-memory state.
    pub fn snapshot(&self) -> ReleaseState {
        self.lock().state.clone()
    }

    /// Persist the current state now, cancelling any pending deferred flush.
    pub fn flush(&self) -> Result<(), AccessorError> {
        let mut inner = self.lock();
        if let Some(pending) = inner.pending.take() {
            pending.task.cancel();
        }
        inner.delays = 0;
        self.write_state(&inner.state)
            .map_err(AccessorError::FlushFailure)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Schedule a flush, or push back the pending one.
    fn request_flush(&self, inner: &mut Inner) {
        if let Some(pending) = &inner.pending {
            inner.delays += 1;
            if inner.delays >= self.options.max_delays {
                tracing::trace!(
                    delays = inner.delays,
                    "flush deferral limit reached, keeping scheduled flush"
                );
                return;
            }
            pending.task.cancel();
        }

        inner.generation += 1;
        let generation = inner.generation;
        let this = self.this.clone();
        let task = self.scheduler.schedule(
            self.options.delay,
            Box::new(move || {
                if let Some(accessor) = this.upgrade() {
                    accessor.run_scheduled_flush(generation);
                }
            }),
        );
        inner.pending = Some(PendingFlush { generation, task });
    }

    fn run_scheduled_flush(&self, generation: u64) {
        let mut inner = self.lock();
        match &inner.pending {
            Some(pending) if pending.generation == generation => {}
            // Cancelled after the timer had already fired.
            _ => return,
        }
        // Failures are reported by write_state; the next mutation retries.
        let _ = self.write_state(&inner.state);
        inner.pending = None;
        inner.delays = 0;
    }

    fn write_state(&self, state: &ReleaseState) -> Result<(), fedsync_store::StoreError> {
        match self.storage.write(self.network, state) {
            Ok(()) => {
                self.metrics.flushes.inc();
                tracing::debug!(
                    network = self.network.as_str(),
                    entries = state.release_hashes.len(),
                    "release state flushed"
                );
                Ok(())
            }
            Err(e) => {
                self.metrics.flush_failures.inc();
                tracing::error!(
                    network = self.network.as_str(),
                    error = %e,
                    "failed to persist release state"
                );
                Err(e)
            }
        }
    }
}

impl ReleaseIndex for ReleaseStorageAccessor {
    fn checkpoint(&self) -> Option<RskHash> {
        self.lock().state.best_block_hash
    }

    fn set_checkpoint(&self, hash: RskHash) {
        let mut inner = self.lock();
        inner.state.best_block_hash = Some(hash);
        self.request_flush(&mut inner);
    }

    fn has_release_entry(&self, btc_tx_hash: &BtcTxHash) -> bool {
        self.lock().state.release_hashes.contains_key(btc_tx_hash)
    }

    fn requester(&self, btc_tx_hash: &BtcTxHash) -> Option<RskHash> {
        self.lock().state.release_hashes.get(btc_tx_hash).copied()
    }

    fn put_release_entry(&self, btc_tx_hash: BtcTxHash, rsk_tx_hash: RskHash) {
        let mut inner = self.lock();
        match inner.state.release_hashes.get(&btc_tx_hash) {
            Some(existing) if *existing == rsk_tx_hash => return,
            Some(existing) => {
                // A release is requested by exactly one transaction; keep the first.
                tracing::warn!(
                    btc_tx = %btc_tx_hash,
                    recorded = %existing,
                    ignored = %rsk_tx_hash,
                    "conflicting requester for release, keeping recorded one"
                );
                return;
            }
            None => {}
        }
        inner.state.release_hashes.insert(btc_tx_hash, rsk_tx_hash);
        self.metrics.release_entries.inc();
        self.request_flush(&mut inner);
    }

    fn len(&self) -> usize {
        self.lock().state.release_hashes.len()
    }
}
