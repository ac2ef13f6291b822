//! Decoding of the bridge contract's `release_requested` event.

use sha3::{Digest, Keccak256};

use fedsync_types::{Address, BtcTxHash, LogInfo, RskHash, TransactionReceipt};

/// Precompiled bridge contract address, `0x0000000000000000000000000000000001000006`.
pub const BRIDGE_ADDRESS: Address = Address::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0x00, 0x00, 0x06,
]);

/// ABI signature of the event logged when the bridge requests a Bitcoin release.
pub const RELEASE_REQUESTED_SIGNATURE: &str = "release_requested(bytes32,bytes32,uint256)";

/// One (release, requester) pair extracted from a receipt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleaseRequest {
    pub btc_tx_hash: BtcTxHash,
    pub rsk_tx_hash: RskHash,
}

/// Extracts release requests from a transaction receipt.
pub trait ReleaseEventDecoder: Send + Sync {
    fn decode_release_requests(&self, receipt: &TransactionReceipt) -> Vec<ReleaseRequest>;
}

/// Decoder for logs emitted by the bridge contract.
///
/// Layout: `topics[0]` is the event signature hash, `topics[1]` the
/// requesting transaction hash, `topics[2]` the Bitcoin release hash; the
/// amount is in `data` and not needed here.
#[derive(Clone, Debug)]
pub struct BridgeEventDecoder {
    bridge_address: Address,
    topic: [u8; 32],
}

impl BridgeEventDecoder {
    pub fn new() -> Self {
        Self::with_address(BRIDGE_ADDRESS)
    }

    pub fn with_address(bridge_address: Address) -> Self {
        Self {
            bridge_address,
            topic: release_requested_topic(),
        }
    }

    fn decode_log(&self, log: &LogInfo) -> Option<ReleaseRequest> {
        if log.address != self.bridge_address {
            return None;
        }
        match log.topics.as_slice() {
            [signature, rsk_tx, btc_tx, ..] if *signature == self.topic => Some(ReleaseRequest {
                btc_tx_hash: BtcTxHash::new(*btc_tx),
                rsk_tx_hash: RskHash::new(*rsk_tx),
            }),
            _ => None,
        }
    }
}

impl Default for BridgeEventDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseEventDecoder for BridgeEventDecoder {
    fn decode_release_requests(&self, receipt: &TransactionReceipt) -> Vec<ReleaseRequest> {
        receipt
            .logs
            .iter()
            .filter_map(|log| self.decode_log(log))
            .collect()
    }
}

/// Keccak-256 of [`RELEASE_REQUESTED_SIGNATURE`].
pub fn release_requested_topic() -> [u8; 32] {
    let digest = Keccak256::digest(RELEASE_REQUESTED_SIGNATURE.as_bytes());
    let mut topic = [0u8; 32];
    topic.copy_from_slice(&digest);
    topic
}

/// Build the log the bridge emits when it requests `btc_tx_hash` on behalf of `rsk_tx_hash`.
pub fn release_requested_log(rsk_tx_hash: RskHash, btc_tx_hash: BtcTxHash, amount: u64) -> LogInfo {
    let mut data = vec![0u8; 32];
    data[24..].copy_from_slice(&amount.to_be_bytes());
    LogInfo {
        address: BRIDGE_ADDRESS,
        topics: vec![
            release_requested_topic(),
            *rsk_tx_hash.as_bytes(),
            *btc_tx_hash.as_bytes(),
        ],
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt(logs: Vec<LogInfo>) -> TransactionReceipt {
        TransactionReceipt::new(RskHash::new([7; 32]), logs)
    }

    #[test]
    fn decodes_release_requested_log() {
        let rsk = RskHash::new([3; 32]);
        let btc = BtcTxHash::new([4; 32]);
        let decoder = BridgeEventDecoder::new();
        let found = decoder.decode_release_requests(&receipt(vec![release_requested_log(
            rsk, btc, 100_000_000,
        )]));
        assert_eq!(
            found,
            vec![ReleaseRequest {
                btc_tx_hash: btc,
                rsk_tx_hash: rsk
            }]
        );
    }

    #[test]
    fn ignores_logs_from_other_contracts() {
        let mut log = release_requested_log(RskHash::new([1; 32]), BtcTxHash::new([2; 32]), 1);
        log.address = Address::new([0xaa; 20]);
        let decoder = BridgeEventDecoder::new();
        assert!(decoder.decode_release_requests(&receipt(vec![log])).is_empty());
    }

    #[test]
    fn ignores_other_bridge_events() {
        let mut log = release_requested_log(RskHash::new([1; 32]), BtcTxHash::new([2; 32]), 1);
        log.topics[0] = [0xee; 32];
        let decoder = BridgeEventDecoder::new();
        assert!(decoder.decode_release_requests(&receipt(vec![log])).is_empty());
    }

    #[test]
    fn ignores_logs_with_missing_topics() {
        let mut log = release_requested_log(RskHash::new([1; 32]), BtcTxHash::new([2; 32]), 1);
        log.topics.truncate(2);
        let decoder = BridgeEventDecoder::new();
        assert!(decoder.decode_release_requests(&receipt(vec![log])).is_empty());
    }

    #[test]
    fn decodes_every_matching_log_in_order() {
        let first = release_requested_log(RskHash::new([1; 32]), BtcTxHash::new([2; 32]), 1);
        let second = release_requested_log(RskHash::new([5; 32]), BtcTxHash::new([6; 32]), 1);
        let decoder = BridgeEventDecoder::new();
        let found = decoder.decode_release_requests(&receipt(vec![first, second]));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].btc_tx_hash, BtcTxHash::new([2; 32]));
        assert_eq!(found[1].btc_tx_hash, BtcTxHash::new([6; 32]));
    }

    #[test]
    fn custom_bridge_address() {
        let address = Address::new([0x11; 20]);
        let mut log = release_requested_log(RskHash::new([1; 32]), BtcTxHash::new([2; 32]), 1);
        log.address = address;
        let decoder = BridgeEventDecoder::with_address(address);
        assert_eq!(decoder.decode_release_requests(&receipt(vec![log])).len(), 1);
    }

    #[test]
    fn amount_is_big_endian_in_last_word() {
        let log = release_requested_log(RskHash::ZERO, BtcTxHash::ZERO, 0x0102);
        assert_eq!(log.data.len(), 32);
        assert_eq!(&log.data[30..], &[0x01, 0x02]);
    }
}
