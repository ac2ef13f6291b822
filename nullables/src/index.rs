//! Recording release index: captures every call the synchronizer makes.

use fedsync_release::ReleaseIndex;
use fedsync_types::{BtcTxHash, RskHash};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// An in-memory [`ReleaseIndex`] that keeps a log of checkpoint and
/// release-entry calls, and a count of every call including reads.
pub struct RecordingReleaseIndex {
    checkpoint: Mutex<Option<RskHash>>,
    entries: Mutex<BTreeMap<BtcTxHash, RskHash>>,
    checkpoints: Mutex<Vec<RskHash>>,
    puts: Mutex<Vec<(BtcTxHash, RskHash)>>,
    calls: AtomicUsize,
}

impl RecordingReleaseIndex {
    pub fn new() -> Self {
        Self {
            checkpoint: Mutex::new(None),
            entries: Mutex::new(BTreeMap::new()),
            checkpoints: Mutex::new(Vec::new()),
            puts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// An index whose stored checkpoint is `hash`.
    pub fn with_checkpoint(hash: RskHash) -> Self {
        let index = Self::new();
        *index.checkpoint.lock().unwrap() = Some(hash);
        index
    }

    /// Every `set_checkpoint` argument, in call order.
    pub fn checkpoint_calls(&self) -> Vec<RskHash> {
        self.checkpoints.lock().unwrap().clone()
    }

    /// Every `put_release_entry` argument pair, in call order.
    pub fn put_calls(&self) -> Vec<(BtcTxHash, RskHash)> {
        self.puts.lock().unwrap().clone()
    }

    /// Total calls of any method.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for RecordingReleaseIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseIndex for RecordingReleaseIndex {
    fn checkpoint(&self) -> Option<RskHash> {
        self.record();
        *self.checkpoint.lock().unwrap()
    }

    fn set_checkpoint(&self, hash: RskHash) {
        self.record();
        self.checkpoints.lock().unwrap().push(hash);
        *self.checkpoint.lock().unwrap() = Some(hash);
    }

    fn has_release_entry(&self, btc_tx_hash: &BtcTxHash) -> bool {
        self.record();
        self.entries.lock().unwrap().contains_key(btc_tx_hash)
    }

    fn requester(&self, btc_tx_hash: &BtcTxHash) -> Option<RskHash> {
        self.record();
        self.entries.lock().unwrap().get(btc_tx_hash).copied()
    }

    fn put_release_entry(&self, btc_tx_hash: BtcTxHash, rsk_tx_hash: RskHash) {
        self.record();
        self.puts.lock().unwrap().push((btc_tx_hash, rsk_tx_hash));
        self.entries
            .lock()
            .unwrap()
            .entry(btc_tx_hash)
            .or_insert(rsk_tx_hash);
    }

    fn len(&self) -> usize {
        self.record();
        self.entries.lock().unwrap().len()
    }
}
