//! Release-tracking service: background loops around the release engine.
//!
//! Two tasks run on the tokio runtime:
//! - the replay loop waits the configured initial delay, then ticks the
//!   synchronizer on the blocking pool every period until it reports caught up;
//! - the live loop drains block notifications in arrival order and hands each
//!   one to the synchronizer.
//!
//! Both loops watch the shutdown channel. [`ReleaseTrackingHandle::stop`]
//! joins them and writes the release state one last time.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use fedsync_release::{
    BridgeEventDecoder, NodeSyncStatus, ReleaseMetrics, ReleaseStorageAccessor,
    ReleaseStorageSynchronizer, SyncState, TickOutcome, TokioTaskScheduler,
};
use fedsync_store::{BlockStore, ReceiptStore, ReleaseStateStorage};
use fedsync_store_lmdb::LmdbEnvironment;
use fedsync_types::{Block, TransactionReceipt};

use crate::config::ReleaseSyncConfig;
use crate::{NodeConfig, NodeError, ShutdownController};

const MAX_DBS: u32 = 4;

/// A block connected to the best chain, with its transaction receipts.
#[derive(Clone, Debug)]
pub struct BlockNotification {
    pub block: Block,
    pub receipts: Vec<TransactionReceipt>,
}

/// Open the LMDB release storage under the configured data directory.
pub fn open_release_storage(config: &NodeConfig) -> Result<Arc<dyn ReleaseStateStorage>, NodeError> {
    let env = LmdbEnvironment::open(
        &config.release_storage_dir(),
        MAX_DBS,
        config.release_storage.map_size()?,
    )?;
    Ok(Arc::new(env.release_state_store()))
}

pub struct ReleaseTrackingService;

impl ReleaseTrackingService {
    /// Load the release state and spawn the replay and live loops.
    ///
    /// Must be called from within a tokio runtime. Fails if the configuration
    /// is invalid or the stored release state cannot be read; nothing is
    /// spawned in either case.
    pub fn start(
        config: &NodeConfig,
        storage: Arc<dyn ReleaseStateStorage>,
        chain: Arc<dyn BlockStore>,
        receipts: Arc<dyn ReceiptStore>,
        node_sync: Arc<dyn NodeSyncStatus>,
        shutdown: &ShutdownController,
    ) -> Result<ReleaseTrackingHandle, NodeError> {
        config.validate()?;

        let metrics = Arc::new(ReleaseMetrics::new());
        let accessor = ReleaseStorageAccessor::open(
            config.network,
            storage,
            Arc::new(TokioTaskScheduler::current()),
            config.release_storage.accessor_options(),
            Arc::clone(&metrics),
        )?;

        let synchronizer = Arc::new(ReleaseStorageSynchronizer::new(
            chain,
            receipts,
            node_sync,
            accessor.clone(),
            Box::new(BridgeEventDecoder::new()),
            config.release_sync.sync_options(),
            Arc::clone(&metrics),
        ));

        let (blocks_tx, blocks_rx) = mpsc::unbounded_channel();

        let replay_handle = spawn_replay_loop(
            Arc::clone(&synchronizer),
            config.release_sync.clone(),
            shutdown.subscribe(),
        );
        let live_handle =
            spawn_live_loop(Arc::clone(&synchronizer), blocks_rx, shutdown.subscribe());

        tracing::info!(
            network = config.network.as_str(),
            initial_delay_ms = config.release_sync.initial_delay_ms,
            period_ms = config.release_sync.period_ms,
            "release tracking started"
        );

        Ok(ReleaseTrackingHandle {
            accessor,
            synchronizer,
            metrics,
            blocks_tx,
            shutdown: shutdown.clone(),
            tasks: vec![replay_handle, live_handle],
        })
    }
}

fn spawn_replay_loop(
    synchronizer: Arc<ReleaseStorageSynchronizer>,
    sync_config: ReleaseSyncConfig,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                tracing::info!("release replay task shutting down");
                return;
            }
            _ = tokio::time::sleep(sync_config.initial_delay()) => {}
        }

        let mut interval = tokio::time::interval(sync_config.period());
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    tracing::info!("release replay task shutting down");
                    break;
                }
                _ = interval.tick() => {
                    let sync = Arc::clone(&synchronizer);
                    match tokio::task::spawn_blocking(move || sync.tick()).await {
                        Ok(Ok(TickOutcome::NodeSyncing)) => {}
                        Ok(Ok(outcome)) => {
                            tracing::debug!(?outcome, "release replay finished");
                            break;
                        }
                        // Logged by the synchronizer; retried next period.
                        Ok(Err(_)) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "release replay tick panicked");
                            break;
                        }
                    }
                }
            }
        }
    })
}

fn spawn_live_loop(
    synchronizer: Arc<ReleaseStorageSynchronizer>,
    mut blocks_rx: mpsc::UnboundedReceiver<BlockNotification>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let notification = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    // Apply what was notified before shutdown.
                    while let Ok(notification) = blocks_rx.try_recv() {
                        apply(&synchronizer, notification).await;
                    }
                    tracing::info!("release live block task shutting down");
                    break;
                }
                notification = blocks_rx.recv() => match notification {
                    Some(notification) => notification,
                    None => break,
                },
            };
            apply(&synchronizer, notification).await;
        }
    })
}

async fn apply(synchronizer: &Arc<ReleaseStorageSynchronizer>, notification: BlockNotification) {
    let sync = Arc::clone(synchronizer);
    let number = notification.block.number;
    let result = tokio::task::spawn_blocking(move || {
        sync.process_block(&notification.block, &notification.receipts)
    })
    .await;
    if let Err(e) = result {
        tracing::error!(number, error = %e, "release block processing panicked");
    }
}

/// Running release tracking.
pub struct ReleaseTrackingHandle {
    accessor: Arc<ReleaseStorageAccessor>,
    synchronizer: Arc<ReleaseStorageSynchronizer>,
    metrics: Arc<ReleaseMetrics>,
    blocks_tx: mpsc::UnboundedSender<BlockNotification>,
    shutdown: ShutdownController,
    tasks: Vec<JoinHandle<()>>,
}

impl ReleaseTrackingHandle {
    /// Queue a newly connected block. Never blocks.
    pub fn notify_block(&self, block: Block, receipts: Vec<TransactionReceipt>) {
        let number = block.number;
        if self
            .blocks_tx
            .send(BlockNotification { block, receipts })
            .is_err()
        {
            tracing::warn!(number, "release tracking stopped, dropping block notification");
        }
    }

    pub fn state(&self) -> SyncState {
        self.synchronizer.state()
    }

    pub fn is_synced(&self) -> bool {
        self.synchronizer.is_synced()
    }

    /// The release index, for queries by the signing path.
    pub fn accessor(&self) -> &Arc<ReleaseStorageAccessor> {
        &self.accessor
    }

    pub fn metrics(&self) -> &Arc<ReleaseMetrics> {
        &self.metrics
    }

    /// Signal shutdown, join both loops, then write the release state.
    pub async fn stop(self) -> Result<(), NodeError> {
        tracing::info!("release tracking stopping");
        self.shutdown.shutdown();

        let mut join_error = None;
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "release task failed");
                join_error.get_or_insert(NodeError::Task(e.to_string()));
            }
        }

        let accessor = Arc::clone(&self.accessor);
        tokio::task::spawn_blocking(move || accessor.flush())
            .await
            .map_err(|e| NodeError::Task(e.to_string()))??;
        tracing::info!(
            network = self.accessor.network().as_str(),
            "release state flushed on shutdown"
        );

        match join_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
