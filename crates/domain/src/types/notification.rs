//! Status events surfaced to the UI layer

use serde::{Deserialize, Serialize};

use super::operation::OperationId;
use crate::impl_tag_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Queued,
    Syncing,
    Success,
    Failure,
    Offline,
    Online,
}

impl_tag_conversions!(NotificationKind {
    Queued => "queued",
    Syncing => "syncing",
    Success => "success",
    Failure => "failure",
    Offline => "offline",
    Online => "online",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl_tag_conversions!(Severity {
    Info => "info",
    Success => "success",
    Warning => "warning",
    Error => "error",
});

/// A human-readable status event.
///
/// Per-operation events carry the operation id; run summaries and
/// connectivity events do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<OperationId>,
}

impl Notification {
    pub fn new(kind: NotificationKind, severity: Severity, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), severity, operation: None }
    }

    pub fn info(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Info, message)
    }

    pub fn success(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Success, message)
    }

    pub fn warning(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warning, message)
    }

    pub fn error(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Error, message)
    }

    #[must_use]
    pub fn for_operation(mut self, id: OperationId) -> Self {
        self.operation = Some(id);
        self
    }
}
