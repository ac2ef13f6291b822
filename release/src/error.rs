use thiserror::Error;

use fedsync_store::StoreError;
use fedsync_types::RskHash;

#[derive(Debug, Error)]
pub enum AccessorError {
    /// The stored release state could not be loaded. Fatal at startup: an
    /// empty state is never substituted for an unreadable one.
    #[error("invalid release storage for {network}: {source}")]
    InvalidStorageFile {
        network: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("failed to persist release state: {0}")]
    FlushFailure(#[source] StoreError),
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// The persisted checkpoint is not a block this node knows about,
    /// typically after a reorganization dropped it.
    #[error("checkpoint block {0} cannot be found in the chain")]
    UnresolvableCheckpoint(RskHash),

    #[error("no chain block at height {0}")]
    MissingBlock(u64),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
