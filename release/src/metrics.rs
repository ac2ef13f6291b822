//! Prometheus metrics for release tracking.
//!
//! [`ReleaseMetrics`] owns a dedicated [`Registry`] so the node can expose it
//! next to its other registries. Flush failures are counted here as well as
//! logged, since the mutation that triggered the flush has long returned.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, IntCounter, IntGauge,
    Opts, Registry,
};

pub struct ReleaseMetrics {
    pub registry: Registry,

    // ── Storage ─────────────────────────────────────────────────────────
    /// Successful writes of the release state to durable storage.
    pub flushes: IntCounter,
    /// Writes that failed; the in-memory state stays authoritative.
    pub flush_failures: IntCounter,
    /// Release entries newly added to the index.
    pub release_entries: IntCounter,

    // ── Sync ────────────────────────────────────────────────────────────
    /// Blocks processed by historical replay.
    pub replayed_blocks: IntCounter,
    /// Blocks processed from live notifications.
    pub live_blocks: IntCounter,
    /// 1 once historical replay reached the chain head.
    pub synced: IntGauge,
}

impl ReleaseMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let flushes = register_int_counter_with_registry!(
            Opts::new(
                "fedsync_release_flushes_total",
                "Release state writes to durable storage"
            ),
            registry
        )
        .expect("failed to register flushes counter");

        let flush_failures = register_int_counter_with_registry!(
            Opts::new(
                "fedsync_release_flush_failures_total",
                "Release state writes that failed"
            ),
            registry
        )
        .expect("failed to register flush_failures counter");

        let release_entries = register_int_counter_with_registry!(
            Opts::new(
                "fedsync_release_entries_total",
                "Release entries added to the index"
            ),
            registry
        )
        .expect("failed to register release_entries counter");

        let replayed_blocks = register_int_counter_with_registry!(
            Opts::new(
                "fedsync_release_replayed_blocks_total",
                "Blocks processed during historical replay"
            ),
            registry
        )
        .expect("failed to register replayed_blocks counter");

        let live_blocks = register_int_counter_with_registry!(
            Opts::new(
                "fedsync_release_live_blocks_total",
                "Blocks processed from live notifications"
            ),
            registry
        )
        .expect("failed to register live_blocks counter");

        let synced = register_int_gauge_with_registry!(
            Opts::new(
                "fedsync_release_synced",
                "Whether historical replay has caught up with the chain head"
            ),
            registry
        )
        .expect("failed to register synced gauge");

        Self {
            registry,
            flushes,
            flush_failures,
            release_entries,
            replayed_blocks,
            live_blocks,
            synced,
        }
    }
}

impl Default for ReleaseMetrics {
    fn default() -> Self {
        Self::new()
    }
}
