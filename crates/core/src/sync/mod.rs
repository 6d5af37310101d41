//! Queue reconciliation against the remote system

pub mod engine;
pub mod errors;
pub mod ports;
pub mod service;

pub use engine::SyncEngine;
pub use errors::ServiceError;
pub use ports::{NotificationSink, RemoteApplier};
pub use service::OfflineSyncService;
