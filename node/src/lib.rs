//! Federation node release tracking.
//!
//! Wires the release engine into a running node:
//! - Loads configuration from TOML
//! - Opens the LMDB-backed release storage
//! - Drives historical replay on a periodic timer until caught up
//! - Forwards live block notifications in arrival order
//! - Flushes the release state on shutdown

pub mod config;
pub mod error;
pub mod logging;
pub mod service;
pub mod shutdown;

pub use config::{NodeConfig, ReleaseStorageConfig, ReleaseSyncConfig};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use service::{
    open_release_storage, BlockNotification, ReleaseTrackingHandle, ReleaseTrackingService,
};
pub use shutdown::ShutdownController;
