//! LMDB storage backend for the federation release tracker.
//!
//! Implements [`fedsync_store::ReleaseStateStorage`] using the `heed` LMDB
//! bindings. Every network's release state lives under its own key in a
//! single named database, so mainnet, testnet and regtest never share data.

pub mod environment;
pub mod error;
pub mod release_state;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use release_state::LmdbReleaseStateStore;
