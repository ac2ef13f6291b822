//! Release-tracking engine for a federation node.
//!
//! Remembers, for every Bitcoin release transaction the federation cosigned,
//! the smart-contract transaction that requested it:
//!
//! - [`ReleaseStorageAccessor`] holds the release index and chain checkpoint in
//!   memory and coalesces mutations into deferred, bounded-staleness flushes.
//! - [`ReleaseStorageSynchronizer`] rebuilds the index by replaying chain history
//!   from the last checkpoint, then follows live block notifications.

pub mod accessor;
pub mod error;
pub mod events;
pub mod metrics;
pub mod scheduler;
pub mod synchronizer;

pub use accessor::{AccessorOptions, ReleaseIndex, ReleaseStorageAccessor};
pub use error::{AccessorError, SyncError};
pub use events::{BridgeEventDecoder, ReleaseEventDecoder, ReleaseRequest};
pub use metrics::ReleaseMetrics;
pub use scheduler::{ScheduledTask, Task, TaskScheduler, TokioTaskScheduler};
pub use synchronizer::{
    NodeSyncStatus, ReleaseStorageSynchronizer, SyncOptions, SyncState, TickOutcome,
};
