//! Transaction receipt lookup trait.

use crate::StoreError;
use fedsync_types::{Block, TransactionReceipt};

/// Read-only view of the node's receipt store.
pub trait ReceiptStore: Send + Sync {
    /// All receipts for the transactions of `block`, in transaction order.
    fn receipts_for_block(&self, block: &Block) -> Result<Vec<TransactionReceipt>, StoreError>;
}
