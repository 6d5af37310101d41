//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Durable queue record
pub const QUEUE_STORAGE_KEY: &str = "ferry.offline_queue";
pub const QUEUE_RECORD_VERSION: u32 = 1;

// Storage
pub const DEFAULT_STORAGE_DIR: &str = ".ferry";

// Remote apply
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_APPLY_TIMEOUT_MS: u64 = 30_000;

// Connectivity probing
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;

// Retry after a transient sync failure
pub const DEFAULT_RETRY_BASE_MS: u64 = 2_000;
pub const DEFAULT_RETRY_MAX_MS: u64 = 300_000;
pub const DEFAULT_RETRY_JITTER: f64 = 0.3;

// Service lifecycle
pub const WORKER_STOP_TIMEOUT_SECS: u64 = 5;
