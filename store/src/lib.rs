//! Abstract storage traits for the federation release tracker.
//!
//! The durable release-state backend and the node's chain data (blocks and
//! receipts) are all reached through these traits. The release engine
//! depends only on the traits; LMDB and in-memory test doubles implement them.

pub mod block;
pub mod error;
pub mod receipt;
pub mod release_state;

pub use block::BlockStore;
pub use error::StoreError;
pub use receipt::ReceiptStore;
pub use release_state::{ReleaseState, ReleaseStateStorage};
