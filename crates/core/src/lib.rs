//! # Ferry Core
//!
//! Offline queue business logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for storage, connectivity, remote
//!   apply and notifications
//! - The queue manager and its durable record
//! - The connectivity monitor
//! - The sync engine and the caller-facing [`OfflineSyncService`]
//!
//! ## Architecture Principles
//! - Only depends on `ferry-common` and `ferry-domain`
//! - No filesystem, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod connectivity;
pub mod queue;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use connectivity::{
    ConnectivityMonitor, ConnectivitySource, SignalCallback, SourceSubscription, Subscription,
};
pub use queue::{DurableQueueStore, KeyValueStore, QueueManager};
pub use sync::{NotificationSink, OfflineSyncService, RemoteApplier, ServiceError, SyncEngine};
