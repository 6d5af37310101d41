//! # Ferry Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Key-value stores for the durable queue record (file, memory)
//! - Connectivity sources (HTTP reachability probe, host-driven)
//! - The HTTP remote applier
//! - Notification sinks (tracing, channel, fan-out)
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `ferry-core`
//! - Depends on `ferry-domain` and `ferry-core`
//! - Contains all "impure" code (filesystem, HTTP)

pub mod config;
pub mod connectivity;
pub mod notify;
pub mod remote;
pub mod storage;

// Re-export commonly used items
pub use connectivity::{HttpReachabilityProbe, ManualConnectivitySource};
pub use notify::{ChannelNotificationSink, FanoutNotificationSink, TracingNotificationSink};
pub use remote::{HttpRemoteApplier, HttpRemoteApplierBuilder, RemoteError, RemoteErrorCategory};
pub use storage::{FileKeyValueStore, MemoryKeyValueStore};
