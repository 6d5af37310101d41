//! Sync run reports and queue statistics

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::operation::{EntityType, OperationId, OperationKind};
use crate::impl_tag_conversions;

/// Why a sync run was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    /// Offline to online edge.
    ConnectivityRestored,
    /// Queue loaded at service start while online.
    Startup,
    /// Explicit caller request.
    Manual,
    /// Caller wrote while online.
    Enqueued,
    /// Backoff elapsed after a transient failure.
    RetryTimer,
}

impl_tag_conversions!(SyncTrigger {
    ConnectivityRestored => "connectivity_restored",
    Startup => "startup",
    Manual => "manual",
    Enqueued => "enqueued",
    RetryTimer => "retry_timer",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    NothingToSync,
    Offline,
    /// Coalesced into a run already in flight.
    AlreadyRunning,
    Completed,
}

impl_tag_conversions!(SyncOutcome {
    NothingToSync => "nothing_to_sync",
    Offline => "offline",
    AlreadyRunning => "already_running",
    Completed => "completed",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncSummary {
    FullySynced,
    PartiallySynced,
    NothingToSync,
}

/// An operation dropped because the remote rejected it for good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermanentFailure {
    pub id: OperationId,
    pub kind: OperationKind,
    pub entity_type: EntityType,
    pub reason: String,
}

/// Result of one trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub trigger: SyncTrigger,
    pub outcome: SyncOutcome,
    pub applied: usize,
    pub dropped: usize,
    /// Operations still queued from the snapshot after the run.
    pub retained: usize,
    /// Operation whose transient failure stopped the run.
    pub halted_on: Option<OperationId>,
    pub halt_reason: Option<String>,
    pub failures: Vec<PermanentFailure>,
}

impl SyncReport {
    /// Report for a trigger that did no work.
    pub const fn skipped(trigger: SyncTrigger, outcome: SyncOutcome) -> Self {
        Self {
            trigger,
            outcome,
            applied: 0,
            dropped: 0,
            retained: 0,
            halted_on: None,
            halt_reason: None,
            failures: Vec::new(),
        }
    }

    /// True when the run stopped on a transient failure.
    pub const fn halted(&self) -> bool {
        self.halted_on.is_some()
    }

    pub fn summary(&self) -> SyncSummary {
        if !matches!(self.outcome, SyncOutcome::Completed) {
            return SyncSummary::NothingToSync;
        }
        if self.halted() || !self.failures.is_empty() {
            SyncSummary::PartiallySynced
        } else if self.applied == 0 {
            SyncSummary::NothingToSync
        } else {
            SyncSummary::FullySynced
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    #[default]
    Idle,
    Running,
}

/// Observable sync status for display.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncStatus {
    pub state: EngineState,
    pub pending: usize,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_applied: usize,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

/// Queue contents summary for display.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: usize,
    pub oldest_enqueued_at: Option<DateTime<Utc>>,
    pub by_entity: BTreeMap<EntityType, usize>,
    /// Most recent durable store failure, cleared by the next successful
    /// write.
    pub last_storage_error: Option<String>,
}
