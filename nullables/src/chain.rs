//! Nullable chain: an in-memory block and receipt store.

use fedsync_release::events::release_requested_log;
use fedsync_store::{BlockStore, ReceiptStore, StoreError};
use fedsync_types::{Block, BtcTxHash, RskHash, TransactionReceipt};
use std::collections::HashMap;
use std::sync::Mutex;

/// Deterministic hash for the block at `number`.
pub fn block_hash(number: u64) -> RskHash {
    let mut bytes = [0xb1u8; 32];
    bytes[24..].copy_from_slice(&number.to_be_bytes());
    RskHash::new(bytes)
}

/// Receipt of a transaction `rsk_tx_hash` that made the bridge request `btc_tx_hash`.
pub fn release_receipt(rsk_tx_hash: RskHash, btc_tx_hash: BtcTxHash) -> TransactionReceipt {
    TransactionReceipt::new(
        rsk_tx_hash,
        vec![release_requested_log(rsk_tx_hash, btc_tx_hash, 100_000_000)],
    )
}

/// A linear chain held in memory.
///
/// Blocks can also be registered off the best chain to model forks.
pub struct NullChain {
    main: Mutex<Vec<Block>>,
    side: Mutex<HashMap<RskHash, Block>>,
    receipts: Mutex<HashMap<RskHash, Vec<TransactionReceipt>>>,
    receipt_requests: Mutex<Vec<u64>>,
}

impl NullChain {
    /// A chain with blocks `0..=best` and no receipts.
    pub fn with_best(best: u64) -> Self {
        let chain = Self {
            main: Mutex::new(Vec::new()),
            side: Mutex::new(HashMap::new()),
            receipts: Mutex::new(HashMap::new()),
            receipt_requests: Mutex::new(Vec::new()),
        };
        for _ in 0..=best {
            chain.push_block(Vec::new());
        }
        chain
    }

    /// Connect a new best block carrying `receipts`.
    pub fn push_block(&self, receipts: Vec<TransactionReceipt>) -> Block {
        let mut main = self.main.lock().unwrap();
        let number = main.len() as u64;
        let parent_hash = main.last().map(|b| b.hash).unwrap_or(RskHash::ZERO);
        let block = Block::new(block_hash(number), parent_hash, number);
        main.push(block.clone());
        self.receipts.lock().unwrap().insert(block.hash, receipts);
        block
    }

    /// Attach receipts to an existing block.
    pub fn set_receipts(&self, hash: RskHash, receipts: Vec<TransactionReceipt>) {
        self.receipts.lock().unwrap().insert(hash, receipts);
    }

    /// Register a block known to the node but not on the best chain.
    pub fn add_side_block(&self, block: Block) {
        self.side.lock().unwrap().insert(block.hash, block);
    }

    /// The best-chain block at `number`.
    pub fn block(&self, number: u64) -> Block {
        self.main.lock().unwrap()[number as usize].clone()
    }

    /// Heights whose receipts were requested, in request order.
    pub fn receipt_requests(&self) -> Vec<u64> {
        self.receipt_requests.lock().unwrap().clone()
    }
}

impl BlockStore for NullChain {
    fn chain_block_by_number(&self, number: u64) -> Result<Option<Block>, StoreError> {
        Ok(self.main.lock().unwrap().get(number as usize).cloned())
    }

    fn block_by_hash(&self, hash: &RskHash) -> Result<Option<Block>, StoreError> {
        if let Some(block) = self.main.lock().unwrap().iter().find(|b| b.hash == *hash) {
            return Ok(Some(block.clone()));
        }
        Ok(self.side.lock().unwrap().get(hash).cloned())
    }

    fn best_block(&self) -> Result<Block, StoreError> {
        self.main
            .lock()
            .unwrap()
            .last()
            .cloned()
            .ok_or_else(|| StoreError::NotFound("best block".into()))
    }
}

impl ReceiptStore for NullChain {
    fn receipts_for_block(&self, block: &Block) -> Result<Vec<TransactionReceipt>, StoreError> {
        self.receipt_requests.lock().unwrap().push(block.number);
        Ok(self
            .receipts
            .lock()
            .unwrap()
            .get(&block.hash)
            .cloned()
            .unwrap_or_default())
    }
}
