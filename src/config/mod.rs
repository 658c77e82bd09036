//! Harness configuration — broker address, timings and logging.
//!
//! User-level config: `~/.harness/config.yaml` (optional)
//! Explicit config: `--config <path>` (must exist)
//!
//! Resolution: CLI flags → config file → built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::broker::kafka::KafkaSettings;

/// Broker used when none is given on the command line or in config.
pub const DEFAULT_BROKER: &str = "localhost:9092";

/// How long a transient alert stays on screen.
pub const DEFAULT_ALERT_TTL_MS: u64 = 5_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("no broker address configured")]
    NoBrokers,

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Seed brokers (`host:port`).
    pub brokers: Vec<String>,
    /// Topics list refresh cadence.
    pub refresh_interval_ms: u64,
    pub alert_ttl_ms: u64,
    /// How long one broker poll blocks before checking for shutdown.
    pub poll_timeout_ms: u64,
    pub max_batch: usize,
    pub metadata_timeout_ms: u64,
    /// Grace period for the ingestion worker to exit after close.
    pub shutdown_timeout_ms: u64,
    /// Broker bookkeeping topics never subscribed to.
    pub internal_topics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            brokers: vec![DEFAULT_BROKER.to_string()],
            refresh_interval_ms: 2_000,
            alert_ttl_ms: DEFAULT_ALERT_TTL_MS,
            poll_timeout_ms: 250,
            max_batch: 1_000,
            metadata_timeout_ms: 10_000,
            shutdown_timeout_ms: 5_000,
            internal_topics: vec![
                "__consumer_offsets".to_string(),
                "__transaction_state".to_string(),
            ],
            log_file: None,
        }
    }
}

/// Path to `~/.harness/config.yaml`.
fn user_config_path() -> Option<PathBuf> {
    #[cfg(windows)]
    let home = std::env::var("USERPROFILE").ok();
    #[cfg(not(windows))]
    let home = std::env::var("HOME").ok();

    home.map(|h| PathBuf::from(h).join(".harness").join("config.yaml"))
}

impl HarnessConfig {
    /// Load from an explicit path, or from the user config if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match user_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Parse a YAML config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not a map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Override brokers from a comma-separated CLI argument.
    pub fn with_brokers_arg(mut self, arg: &str) -> Self {
        let brokers: Vec<String> = arg
            .split(',')
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(String::from)
            .collect();
        if !brokers.is_empty() {
            self.brokers = brokers;
        }
        self
    }

    /// Reject configs the session cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.brokers.is_empty() {
            return Err(ConfigError::NoBrokers);
        }
        // Zero would turn the refresh timer and the broker poll into busy loops
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("refresh_interval_ms"));
        }
        if self.poll_timeout_ms == 0 {
            return Err(ConfigError::ZeroInterval("poll_timeout_ms"));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn alert_ttl(&self) -> Duration {
        Duration::from_millis(self.alert_ttl_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Log file path, defaulting to `harness.log` in the temp dir.
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("harness.log"))
    }

    pub fn kafka_settings(&self) -> KafkaSettings {
        KafkaSettings {
            brokers: self.brokers.clone(),
            metadata_timeout: Duration::from_millis(self.metadata_timeout_ms),
            max_batch: self.max_batch.max(1),
        }
    }
}
