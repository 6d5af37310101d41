//! Configuration loader
//!
//! Loads [`FerryConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whichever source wins, the result is checked with
//! [`FerryConfig::validate`].
//!
//! ## Environment Variables
//! Required:
//! - `FERRY_STORAGE_DIR`: Directory holding the durable queue record
//! - `FERRY_REMOTE_BASE_URL`: Base URL of the backend REST API
//!
//! Optional:
//! - `FERRY_CONNECTIVITY_PROBE_URL`: Health endpoint for reachability checks
//! - `FERRY_REMOTE_TIMEOUT_MS`: Per-request timeout for the backend
//! - `FERRY_PROBE_INTERVAL_SECS`: Reachability polling interval
//! - `FERRY_APPLY_TIMEOUT_MS`: Upper bound on one remote apply
//! - `FERRY_AUTO_RETRY`: Retry halted passes with backoff (true/false)
//! - `FERRY_RETRY_BASE_MS`: First retry delay
//! - `FERRY_RETRY_MAX_MS`: Retry delay cap
//! - `FERRY_LOG_FORMAT`: `pretty` or `json`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./ferry.json` or `./ferry.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ferry_domain::{
    ConnectivityConfig, FerryConfig, FerryError, LogFormat, LoggingConfig, RemoteConfig, Result,
    StorageConfig, SyncConfig,
};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `FerryError::Config` if neither source yields a valid
/// configuration.
pub fn load() -> Result<FerryConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Unset optional variables keep their defaults.
///
/// # Errors
/// Returns `FerryError::Config` if required variables are missing or any
/// value fails to parse.
pub fn load_from_env() -> Result<FerryConfig> {
    let storage_dir = env_var("FERRY_STORAGE_DIR")?;
    let base_url = env_var("FERRY_REMOTE_BASE_URL")?;

    let remote_defaults = RemoteConfig::default();
    let connectivity_defaults = ConnectivityConfig::default();
    let sync_defaults = SyncConfig::default();

    let config = FerryConfig {
        storage: StorageConfig { directory: PathBuf::from(storage_dir), ..Default::default() },
        remote: RemoteConfig {
            base_url,
            timeout_ms: env_parse("FERRY_REMOTE_TIMEOUT_MS", remote_defaults.timeout_ms)?,
        },
        connectivity: ConnectivityConfig {
            probe_url: std::env::var("FERRY_CONNECTIVITY_PROBE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            poll_interval_secs: env_parse(
                "FERRY_PROBE_INTERVAL_SECS",
                connectivity_defaults.poll_interval_secs,
            )?,
            ..connectivity_defaults
        },
        sync: SyncConfig {
            apply_timeout_ms: env_parse("FERRY_APPLY_TIMEOUT_MS", sync_defaults.apply_timeout_ms)?,
            auto_retry: env_bool("FERRY_AUTO_RETRY", sync_defaults.auto_retry),
            retry_base_ms: env_parse("FERRY_RETRY_BASE_MS", sync_defaults.retry_base_ms)?,
            retry_max_ms: env_parse("FERRY_RETRY_MAX_MS", sync_defaults.retry_max_ms)?,
            ..sync_defaults
        },
        logging: LoggingConfig {
            format: match std::env::var("FERRY_LOG_FORMAT") {
                Ok(raw) => LogFormat::from_str(&raw).map_err(FerryError::Config)?,
                Err(_) => LogFormat::default(),
            },
        },
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `FerryError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The parsed configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<FerryConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FerryError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FerryError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FerryError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<FerryConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| FerryError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| FerryError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(FerryError::Config(format!("Unsupported config format: {extension}"))),
    }
}

fn candidates_in(dir: &Path) -> [PathBuf; 8] {
    [
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("ferry.json"),
        dir.join("ferry.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Probe multiple paths for configuration files
///
/// Returns the first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| FerryError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional numeric environment variable, keeping `default` when
/// unset.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| FerryError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
