//! Smart-contract chain block header view.

use serde::{Deserialize, Serialize};

use crate::RskHash;

/// The subset of a block the release tracker needs: identity and height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub hash: RskHash,
    pub parent_hash: RskHash,
    pub number: u64,
}

impl Block {
    pub fn new(hash: RskHash, parent_hash: RskHash, number: u64) -> Self {
        Self {
            hash,
            parent_hash,
            number,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.number == 0
    }
}
