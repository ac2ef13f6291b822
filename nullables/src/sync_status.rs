//! Nullable node sync status.

use fedsync_release::NodeSyncStatus;
use std::sync::atomic::{AtomicBool, Ordering};

/// A node sync flag the test flips by hand.
pub struct NullSyncStatus {
    syncing: AtomicBool,
}

impl NullSyncStatus {
    /// A node that has finished syncing its chain.
    pub fn synced() -> Self {
        Self {
            syncing: AtomicBool::new(false),
        }
    }

    /// A node still downloading its chain.
    pub fn syncing() -> Self {
        Self {
            syncing: AtomicBool::new(true),
        }
    }

    pub fn set_syncing(&self, syncing: bool) {
        self.syncing.store(syncing, Ordering::SeqCst);
    }
}

impl NodeSyncStatus for NullSyncStatus {
    fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::SeqCst)
    }
}
