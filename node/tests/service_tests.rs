//! Integration tests for the release-tracking service:
//! startup → timed replay → live notifications → shutdown flush.

use std::sync::Arc;
use std::time::Duration;

use fedsync_nullables::chain::{block_hash, release_receipt};
use fedsync_nullables::{NullChain, NullReleaseStorage, NullSyncStatus};
use fedsync_node::{
    open_release_storage, NodeConfig, NodeError, ReleaseTrackingHandle, ReleaseTrackingService,
    ShutdownController,
};
use fedsync_release::{ReleaseIndex, SyncState};
use fedsync_store::ReceiptStore;
use fedsync_types::{BtcTxHash, NetworkId, RskHash};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fast_config() -> NodeConfig {
    let mut config = NodeConfig::default();
    config.release_sync.initial_delay_ms = 0;
    config.release_sync.period_ms = 5;
    config.release_storage.delay_ms = 5;
    config
}

fn start(
    config: &NodeConfig,
    storage: Arc<NullReleaseStorage>,
    chain: &Arc<NullChain>,
    node_sync: &Arc<NullSyncStatus>,
) -> ReleaseTrackingHandle {
    ReleaseTrackingService::start(
        config,
        storage,
        chain.clone(),
        chain.clone(),
        node_sync.clone(),
        &ShutdownController::new(),
    )
    .expect("start release tracking")
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached within 2s");
}

fn rsk(n: u8) -> RskHash {
    RskHash::new([n; 32])
}

fn btc(n: u8) -> BtcTxHash {
    BtcTxHash::new([n; 32])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn replays_then_follows_live_blocks() {
    let chain = Arc::new(NullChain::with_best(0));
    chain.push_block(vec![release_receipt(rsk(1), btc(1))]);
    let storage = Arc::new(NullReleaseStorage::new());
    let node_sync = Arc::new(NullSyncStatus::synced());
    let config = fast_config();

    let handle = start(&config, storage.clone(), &chain, &node_sync);
    wait_until(|| handle.is_synced()).await;
    assert_eq!(handle.accessor().requester(&btc(1)), Some(rsk(1)));

    let block = chain.push_block(vec![release_receipt(rsk(2), btc(2))]);
    let receipts = chain.receipts_for_block(&block).unwrap();
    handle.notify_block(block.clone(), receipts);
    wait_until(|| handle.accessor().checkpoint() == Some(block.hash)).await;

    assert_eq!(handle.metrics().live_blocks.get(), 1);
    handle.stop().await.expect("stop");

    let written = storage.last_write(config.network).unwrap();
    assert_eq!(written.best_block_hash, Some(block_hash(2)));
    assert_eq!(written.release_hashes.len(), 2);
}

#[tokio::test]
async fn waits_for_node_to_finish_syncing() {
    let chain = Arc::new(NullChain::with_best(3));
    let storage = Arc::new(NullReleaseStorage::new());
    let node_sync = Arc::new(NullSyncStatus::syncing());

    let handle = start(&fast_config(), storage, &chain, &node_sync);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(handle.state(), SyncState::Unsynced);
    assert!(chain.receipt_requests().is_empty());

    node_sync.set_syncing(false);
    wait_until(|| handle.is_synced()).await;
    assert_eq!(handle.accessor().checkpoint(), Some(block_hash(3)));

    handle.stop().await.expect("stop");
}

#[tokio::test]
async fn notifications_before_sync_are_ignored_and_replay_covers_them() {
    let chain = Arc::new(NullChain::with_best(1));
    let storage = Arc::new(NullReleaseStorage::new());
    let node_sync = Arc::new(NullSyncStatus::syncing());

    let handle = start(&fast_config(), storage, &chain, &node_sync);
    let block = chain.push_block(vec![release_receipt(rsk(5), btc(5))]);
    handle.notify_block(block.clone(), chain.receipts_for_block(&block).unwrap());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(handle.accessor().len(), 0);

    node_sync.set_syncing(false);
    wait_until(|| handle.is_synced()).await;
    assert_eq!(handle.accessor().requester(&btc(5)), Some(rsk(5)));
    assert_eq!(handle.metrics().live_blocks.get(), 0);

    handle.stop().await.expect("stop");
}

#[tokio::test]
async fn stop_flushes_even_before_replay_starts() {
    let chain = Arc::new(NullChain::with_best(1));
    let storage = Arc::new(NullReleaseStorage::new());
    let node_sync = Arc::new(NullSyncStatus::synced());
    let mut config = fast_config();
    config.release_sync.initial_delay_ms = 60_000;

    let handle = start(&config, storage.clone(), &chain, &node_sync);
    handle.accessor().put_release_entry(btc(9), rsk(9));
    handle.stop().await.expect("stop");

    assert!(chain.receipt_requests().is_empty());
    let written = storage.last_write(config.network).unwrap();
    assert_eq!(written.release_hashes.get(&btc(9)), Some(&rsk(9)));
}

#[tokio::test]
async fn corrupt_storage_fails_startup() {
    let chain = Arc::new(NullChain::with_best(1));
    let storage = Arc::new(NullReleaseStorage::new());
    storage.corrupt("garbage");

    let result = ReleaseTrackingService::start(
        &fast_config(),
        storage,
        chain.clone(),
        chain.clone(),
        Arc::new(NullSyncStatus::synced()),
        &ShutdownController::new(),
    );

    assert!(matches!(result, Err(NodeError::Accessor(_))));
}

#[tokio::test]
async fn zero_sync_period_fails_startup() {
    let chain = Arc::new(NullChain::with_best(1));
    let storage = Arc::new(NullReleaseStorage::new());
    let mut config = fast_config();
    config.release_sync.period_ms = 0;

    let result = ReleaseTrackingService::start(
        &config,
        storage.clone(),
        chain.clone(),
        chain.clone(),
        Arc::new(NullSyncStatus::synced()),
        &ShutdownController::new(),
    );

    assert!(matches!(result, Err(NodeError::Config(_))));
    assert_eq!(storage.write_count(), 0);
}

#[tokio::test]
async fn failed_shutdown_flush_is_reported() {
    let chain = Arc::new(NullChain::with_best(0));
    let storage = Arc::new(NullReleaseStorage::new());
    let mut config = fast_config();
    config.release_sync.initial_delay_ms = 60_000;

    let handle = start(&config, storage.clone(), &chain, &Arc::new(NullSyncStatus::synced()));
    storage.set_fail_writes(true);

    assert!(matches!(handle.stop().await, Err(NodeError::Accessor(_))));
}

#[tokio::test]
async fn external_shutdown_stops_the_loops() {
    let chain = Arc::new(NullChain::with_best(2));
    let storage = Arc::new(NullReleaseStorage::new());
    let shutdown = ShutdownController::new();
    let mut config = fast_config();
    config.release_sync.initial_delay_ms = 60_000;

    let handle = ReleaseTrackingService::start(
        &config,
        storage.clone(),
        chain.clone(),
        chain.clone(),
        Arc::new(NullSyncStatus::synced()),
        &shutdown,
    )
    .expect("start");

    shutdown.shutdown();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!handle.is_synced());

    handle.stop().await.expect("stop");
    assert_eq!(storage.write_count(), 1);
}

#[tokio::test]
async fn lmdb_storage_resumes_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fast_config();
    config.data_dir = dir.path().to_path_buf();
    config.network = NetworkId::Testnet;

    let chain = Arc::new(NullChain::with_best(0));
    chain.push_block(vec![release_receipt(rsk(1), btc(1))]);
    let node_sync = Arc::new(NullSyncStatus::synced());

    {
        let storage = open_release_storage(&config).expect("open storage");
        let handle = ReleaseTrackingService::start(
            &config,
            storage,
            chain.clone(),
            chain.clone(),
            node_sync.clone(),
            &ShutdownController::new(),
        )
        .expect("start");
        wait_until(|| handle.is_synced()).await;
        handle.stop().await.expect("stop");
    }

    let requests_before = chain.receipt_requests().len();
    let storage = open_release_storage(&config).expect("reopen storage");
    let handle = ReleaseTrackingService::start(
        &config,
        storage,
        chain.clone(),
        chain.clone(),
        node_sync,
        &ShutdownController::new(),
    )
    .expect("restart");

    assert_eq!(handle.accessor().checkpoint(), Some(block_hash(1)));
    assert_eq!(handle.accessor().requester(&btc(1)), Some(rsk(1)));
    wait_until(|| handle.is_synced()).await;
    // Nothing past the checkpoint, so no block was fetched again.
    assert_eq!(chain.receipt_requests().len(), requests_before);

    handle.stop().await.expect("stop");
}
