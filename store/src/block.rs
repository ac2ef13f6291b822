//! Chain block lookup trait.

use crate::StoreError;
use fedsync_types::{Block, RskHash};

/// Read-only view of the node's block store.
///
/// Implementations must never be mutated through this trait; the release
/// tracker only replays what the node has already connected.
pub trait BlockStore: Send + Sync {
    /// The block at `number` on the current best chain, if any.
    fn chain_block_by_number(&self, number: u64) -> Result<Option<Block>, StoreError>;

    /// Any known block with this hash, on the best chain or not.
    fn block_by_hash(&self, hash: &RskHash) -> Result<Option<Block>, StoreError>;

    /// The current best (tip) block.
    fn best_block(&self) -> Result<Block, StoreError>;
}
