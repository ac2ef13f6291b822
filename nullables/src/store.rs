//! Nullable release-state storage: in-memory, with failure injection.

use fedsync_store::{ReleaseState, ReleaseStateStorage, StoreError};
use fedsync_types::NetworkId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory [`ReleaseStateStorage`] that records every write.
pub struct NullReleaseStorage {
    states: Mutex<HashMap<NetworkId, ReleaseState>>,
    writes: Mutex<Vec<(NetworkId, ReleaseState)>>,
    read_error: Mutex<Option<String>>,
    fail_writes: AtomicBool,
}

impl NullReleaseStorage {
    pub fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            read_error: Mutex::new(None),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Storage that already holds `state` for `network`.
    pub fn with_state(network: NetworkId, state: ReleaseState) -> Self {
        let storage = Self::new();
        storage.states.lock().unwrap().insert(network, state);
        storage
    }

    /// Make every read report a corrupted file.
    pub fn corrupt(&self, reason: &str) {
        *self.read_error.lock().unwrap() = Some(reason.to_string());
    }

    /// Make writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    /// The most recently written state for `network`.
    pub fn last_write(&self, network: NetworkId) -> Option<ReleaseState> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(n, _)| *n == network)
            .map(|(_, state)| state.clone())
    }
}

impl Default for NullReleaseStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseStateStorage for NullReleaseStorage {
    fn read(&self, network: NetworkId) -> Result<ReleaseState, StoreError> {
        if let Some(reason) = self.read_error.lock().unwrap().clone() {
            return Err(StoreError::Corruption(reason));
        }
        Ok(self
            .states
            .lock()
            .unwrap()
            .get(&network)
            .cloned()
            .unwrap_or_default())
    }

    fn write(&self, network: NetworkId, state: &ReleaseState) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".into()));
        }
        self.states.lock().unwrap().insert(network, state.clone());
        self.writes.lock().unwrap().push((network, state.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedsync_types::RskHash;

    #[test]
    fn empty_storage_reads_default() {
        let storage = NullReleaseStorage::new();
        assert_eq!(
            storage.read(NetworkId::Regtest).unwrap(),
            ReleaseState::default()
        );
    }

    #[test]
    fn write_is_visible_to_read() {
        let storage = NullReleaseStorage::new();
        let state = ReleaseState::new().with_best_block(RskHash::new([1; 32]));
        storage.write(NetworkId::Regtest, &state).unwrap();
        assert_eq!(storage.read(NetworkId::Regtest).unwrap(), state);
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn failed_write_is_not_recorded() {
        let storage = NullReleaseStorage::new();
        storage.set_fail_writes(true);
        assert!(storage
            .write(NetworkId::Regtest, &ReleaseState::default())
            .is_err());
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn corrupt_storage_fails_reads() {
        let storage = NullReleaseStorage::new();
        storage.corrupt("bad magic");
        assert!(matches!(
            storage.read(NetworkId::Regtest),
            Err(StoreError::Corruption(_))
        ));
    }
}
