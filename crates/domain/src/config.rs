//! Configuration structures
//!
//! Every section has defaults so a config file only needs the values it
//! overrides. `remote.base_url` has no useful default and is checked by
//! [`FerryConfig::validate`].

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_APPLY_TIMEOUT_MS, DEFAULT_PROBE_INTERVAL_SECS, DEFAULT_PROBE_TIMEOUT_MS,
    DEFAULT_REMOTE_TIMEOUT_MS, DEFAULT_RETRY_BASE_MS, DEFAULT_RETRY_JITTER, DEFAULT_RETRY_MAX_MS,
    DEFAULT_STORAGE_DIR, QUEUE_STORAGE_KEY,
};
use crate::errors::{FerryError, Result};
use crate::impl_tag_conversions;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FerryConfig {
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub connectivity: ConnectivityConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

impl FerryConfig {
    /// Check cross-field constraints the type system cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.remote.base_url.trim().is_empty() {
            return Err(FerryError::Config("remote.base_url must be set".to_string()));
        }
        if self.storage.key.trim().is_empty() {
            return Err(FerryError::Config("storage.key must not be empty".to_string()));
        }
        if self.connectivity.poll_interval_secs == 0 {
            return Err(FerryError::Config(
                "connectivity.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.sync.retry_base_ms == 0 || self.sync.retry_base_ms > self.sync.retry_max_ms {
            return Err(FerryError::Config(format!(
                "sync.retry_base_ms ({}) must be in 1..=retry_max_ms ({})",
                self.sync.retry_base_ms, self.sync.retry_max_ms
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one file per stored key.
    pub directory: PathBuf,
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { directory: PathBuf::from(DEFAULT_STORAGE_DIR), key: QUEUE_STORAGE_KEY.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self { base_url: String::new(), timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS }
    }
}

impl RemoteConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Health endpoint polled for reachability. Without one, the host
    /// pushes connectivity signals itself.
    pub probe_url: Option<String>,
    pub poll_interval_secs: u64,
    pub probe_timeout_ms: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_url: None,
            poll_interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

impl ConnectivityConfig {
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub apply_timeout_ms: u64,
    /// Schedule a retry after a run halted by a transient failure.
    pub auto_retry: bool,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
    pub retry_jitter: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            apply_timeout_ms: DEFAULT_APPLY_TIMEOUT_MS,
            auto_retry: true,
            retry_base_ms: DEFAULT_RETRY_BASE_MS,
            retry_max_ms: DEFAULT_RETRY_MAX_MS,
            retry_jitter: DEFAULT_RETRY_JITTER,
        }
    }
}

impl SyncConfig {
    pub const fn apply_timeout(&self) -> Duration {
        Duration::from_millis(self.apply_timeout_ms)
    }

    pub const fn retry_base(&self) -> Duration {
        Duration::from_millis(self.retry_base_ms)
    }

    pub const fn retry_max(&self) -> Duration {
        Duration::from_millis(self.retry_max_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl_tag_conversions!(LogFormat {
    Pretty => "pretty",
    Json => "json",
});

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}
