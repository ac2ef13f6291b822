//! Persisted release-tracking state and its durable storage trait.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fedsync_types::{BtcTxHash, NetworkId, RskHash};

use crate::StoreError;

/// Everything the release tracker persists for one network.
///
/// `Default` is the state of a network with no commitment on disk yet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseState {
    /// Last block whose effects have been applied to `release_hashes`.
    pub best_block_hash: Option<RskHash>,
    /// Bitcoin release tx hash -> smart-contract tx hash that requested it.
    pub release_hashes: BTreeMap<BtcTxHash, RskHash>,
}

impl ReleaseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_best_block(mut self, hash: RskHash) -> Self {
        self.best_block_hash = Some(hash);
        self
    }
}

/// Durable read/write of [`ReleaseState`], one record per network.
pub trait ReleaseStateStorage: Send + Sync {
    /// Load the state for `network`.
    ///
    /// A network with nothing stored yields `ReleaseState::default()`.
    /// Undecodable data must be reported as [`StoreError::Corruption`],
    /// never replaced by an empty state.
    fn read(&self, network: NetworkId) -> Result<ReleaseState, StoreError>;

    /// Replace the stored state for `network` with `state`.
    fn write(&self, network: NetworkId, state: &ReleaseState) -> Result<(), StoreError>;
}
