//! Port interfaces for sync operations

use async_trait::async_trait;
use ferry_domain::{ApplyError, Notification, QueuedOperation};

/// Applies one queued operation against the remote system.
#[async_trait]
pub trait RemoteApplier: Send + Sync {
    /// Apply `operation`. The error variant decides whether the operation
    /// is retried later or dropped.
    async fn apply(&self, operation: &QueuedOperation) -> Result<(), ApplyError>;
}

/// Receives human-readable status events. Fire-and-forget.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}
