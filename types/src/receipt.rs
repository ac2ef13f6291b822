//! Transaction receipts and the event logs they carry.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hash::hex;
use crate::RskHash;

/// A 20-byte contract or account address on the smart-contract chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", hex::encode(&self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

/// A single event log emitted during transaction execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogInfo {
    /// Contract that emitted the log.
    pub address: Address,
    /// Indexed topics; `topics[0]` is the event signature hash.
    pub topics: Vec<[u8; 32]>,
    /// Non-indexed ABI-encoded payload.
    pub data: Vec<u8>,
}

/// Execution receipt of one transaction in a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Hash of the transaction this receipt belongs to.
    pub transaction_hash: RskHash,
    pub logs: Vec<LogInfo>,
}

impl TransactionReceipt {
    pub fn new(transaction_hash: RskHash, logs: Vec<LogInfo>) -> Self {
        Self {
            transaction_hash,
            logs,
        }
    }
}
