//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies of the release tracker (durable storage, the
//! node's chain data, deferred scheduling, node sync status) are abstracted
//! behind traits. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (fire timers, inject failures)
//! - Record what was asked of them
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod chain;
pub mod index;
pub mod scheduler;
pub mod store;
pub mod sync_status;

pub use chain::NullChain;
pub use index::RecordingReleaseIndex;
pub use scheduler::ManualScheduler;
pub use store::NullReleaseStorage;
pub use sync_status::NullSyncStatus;
