//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use fedsync_release::{AccessorOptions, SyncOptions};
use fedsync_types::NetworkId;

use crate::NodeError;

/// Configuration for release tracking on a federation node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Which network the federation bridges.
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Data directory; release storage lives in a subdirectory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub release_storage: ReleaseStorageConfig,

    #[serde(default)]
    pub release_sync: ReleaseSyncConfig,
}

/// `[release_storage]`: debounced persistence of the release index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReleaseStorageConfig {
    /// Quiet period after the last change before the state is written.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// How many times a pending write may be pushed back.
    #[serde(default = "default_max_delays")]
    pub max_delays: u32,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,
}

/// `[release_sync]`: historical replay scheduling.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReleaseSyncConfig {
    /// Wait before the first replay attempt.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Interval between replay attempts until caught up.
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    /// With no stored checkpoint, replay starts this many blocks below the head.
    #[serde(default = "default_max_initialization_depth")]
    pub max_initialization_depth: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Regtest
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./fedsync_data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_delay_ms() -> u64 {
    5
}

fn default_max_delays() -> u32 {
    5
}

fn default_map_size_mb() -> usize {
    64
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_period_ms() -> u64 {
    100
}

fn default_max_initialization_depth() -> u64 {
    6_000
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.release_sync.period_ms == 0 {
            return Err(NodeError::Config(
                "release_sync.period_ms must be greater than zero".into(),
            ));
        }
        self.release_storage.map_size()?;
        Ok(())
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Directory holding the release storage LMDB environment.
    pub fn release_storage_dir(&self) -> PathBuf {
        self.data_dir.join("release_storage")
    }
}

impl ReleaseStorageConfig {
    pub fn accessor_options(&self) -> AccessorOptions {
        AccessorOptions {
            delay: Duration::from_millis(self.delay_ms),
            max_delays: self.max_delays,
        }
    }

    /// LMDB map size in bytes.
    pub fn map_size(&self) -> Result<usize, NodeError> {
        self.map_size_mb.checked_mul(1024 * 1024).ok_or_else(|| {
            NodeError::Config(format!(
                "release_storage.map_size_mb = {} overflows",
                self.map_size_mb
            ))
        })
    }
}

impl ReleaseSyncConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            max_initialization_depth: self.max_initialization_depth,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            data_dir: default_data_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            release_storage: ReleaseStorageConfig::default(),
            release_sync: ReleaseSyncConfig::default(),
        }
    }
}

impl Default for ReleaseStorageConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            max_delays: default_max_delays(),
            map_size_mb: default_map_size_mb(),
        }
    }
}

impl Default for ReleaseSyncConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            period_ms: default_period_ms(),
            max_initialization_depth: default_max_initialization_depth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string().expect("should serialize");
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.network, config.network);
        assert_eq!(parsed.release_storage.max_delays, config.release_storage.max_delays);
        assert_eq!(parsed.release_sync.period_ms, config.release_sync.period_ms);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.network, NetworkId::Regtest);
        assert_eq!(config.log_format, "human");
        assert_eq!(config.release_storage.delay_ms, 5);
        assert_eq!(config.release_storage.max_delays, 5);
        assert_eq!(config.release_sync.initial_delay_ms, 1_000);
        assert_eq!(config.release_sync.period_ms, 100);
        assert_eq!(config.release_sync.max_initialization_depth, 6_000);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            network = "testnet"

            [release_storage]
            max_delays = 2

            [release_sync]
            period_ms = 250
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.network, NetworkId::Testnet);
        assert_eq!(config.release_storage.max_delays, 2);
        assert_eq!(config.release_storage.delay_ms, 5); // default
        assert_eq!(config.release_sync.period(), Duration::from_millis(250));
        assert_eq!(config.release_sync.initial_delay_ms, 1_000); // default
    }

    #[test]
    fn options_follow_config() {
        let config = NodeConfig::default();
        let options = config.release_storage.accessor_options();
        assert_eq!(options.delay, Duration::from_millis(5));
        assert_eq!(options.max_delays, 5);
        assert_eq!(
            config.release_sync.sync_options().max_initialization_depth,
            6_000
        );
        assert_eq!(config.release_storage.map_size().unwrap(), 64 * 1024 * 1024);
    }

    #[test]
    fn zero_sync_period_is_rejected() {
        let toml = r#"
            [release_sync]
            period_ms = 0
        "#;
        let err = NodeConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));

        let mut config = NodeConfig::default();
        config.release_sync.period_ms = 0;
        assert!(matches!(config.validate(), Err(NodeError::Config(_))));
    }

    #[test]
    fn overflowing_map_size_is_rejected() {
        let mut config = NodeConfig::default();
        config.release_storage.map_size_mb = usize::MAX;
        assert!(matches!(
            config.release_storage.map_size(),
            Err(NodeError::Config(_))
        ));
        assert!(matches!(config.validate(), Err(NodeError::Config(_))));
    }

    #[test]
    fn unknown_network_is_rejected() {
        let err = NodeConfig::from_toml_str(r#"network = "simnet""#).unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/fedsync.toml");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }
}
