//! Logs notifications at a level derived from their severity

use ferry_core::NotificationSink;
use ferry_domain::{Notification, Severity};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

impl TracingNotificationSink {
    pub const fn new() -> Self {
        Self
    }
}

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, notification: Notification) {
        let kind = notification.kind.as_str();
        let operation = notification.operation.map(|id| id.to_string());
        let operation = operation.as_deref();
        match notification.severity {
            Severity::Info | Severity::Success => {
                info!(kind, severity = %notification.severity, operation, "{}", notification.message);
            }
            Severity::Warning => {
                warn!(kind, operation, "{}", notification.message);
            }
            Severity::Error => {
                error!(kind, operation, "{}", notification.message);
            }
        }
    }
}
