//! Graceful shutdown signalling.
//!
//! Broadcasts a shutdown signal to the release-tracking loops via a
//! `tokio::sync::broadcast` channel.

use tokio::sync::broadcast;

/// Coordinates graceful shutdown across background loops.
///
/// The embedding node triggers it from its own signal handling.
///
/// Loops call [`ShutdownController::subscribe`] before they are spawned, then
/// `select!` on the receiver alongside their work. Clones share the channel.
#[derive(Clone)]
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Get a receiver that will be notified on shutdown.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
