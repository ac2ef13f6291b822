//! Fundamental types for the federation release tracker.
//!
//! Hashes for both chains, the minimal block and receipt shapes the
//! synchronizer consumes, and the network identifier that keys storage.

pub mod block;
pub mod hash;
pub mod network;
pub mod receipt;

pub use block::Block;
pub use hash::{BtcTxHash, RskHash};
pub use network::NetworkId;
pub use receipt::{Address, LogInfo, TransactionReceipt};
