//! Sync engine
//!
//! Drains the queue against the remote system, oldest first, one operation
//! at a time. At most one run is in flight; a trigger that arrives while a
//! run is active is coalesced into it and reports
//! [`SyncOutcome::AlreadyRunning`].
//!
//! Per operation:
//! - success: marked for removal, run continues
//! - transient failure: run stops, the operation and everything after it stay
//!   queued
//! - permanent failure: marked for removal, reported as an error, run
//!   continues
//!
//! Removals are committed in one batch after the pass. A run that is
//! cancelled mid-pass commits nothing; the remote may then see some
//! operations again on the next run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ferry_common::time::{Clock, SystemClock};
use ferry_domain::constants::DEFAULT_APPLY_TIMEOUT_MS;
use ferry_domain::{
    ApplyError, EngineState, Notification, NotificationKind, OperationId, PermanentFailure,
    QueuedOperation, SyncOutcome, SyncReport, SyncStatus, SyncSummary, SyncTrigger,
};
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use super::ports::{NotificationSink, RemoteApplier};
use crate::connectivity::ConnectivityMonitor;
use crate::queue::QueueManager;

#[derive(Debug, Default)]
struct RunHistory {
    last_run_at: Option<DateTime<Utc>>,
    last_applied: usize,
    last_error: Option<String>,
    consecutive_failures: u32,
}

/// Clears the running flag when a run ends, including by cancellation.
struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(running: &'a AtomicBool) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { running })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Single-flight queue reconciliation.
pub struct SyncEngine {
    queue: Arc<QueueManager>,
    monitor: Arc<ConnectivityMonitor>,
    applier: Arc<dyn RemoteApplier>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    apply_timeout: Duration,
    running: AtomicBool,
    history: Mutex<RunHistory>,
}

impl SyncEngine {
    pub fn new(
        queue: Arc<QueueManager>,
        monitor: Arc<ConnectivityMonitor>,
        applier: Arc<dyn RemoteApplier>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            queue,
            monitor,
            applier,
            notifier,
            clock: Arc::new(SystemClock),
            apply_timeout: Duration::from_millis(DEFAULT_APPLY_TIMEOUT_MS),
            running: AtomicBool::new(false),
            history: Mutex::new(RunHistory::default()),
        }
    }

    /// Bound each remote apply; an apply that exceeds it counts as a
    /// transient failure.
    #[must_use]
    pub fn with_apply_timeout(mut self, timeout: Duration) -> Self {
        self.apply_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Transient-failure runs since the last run that had none.
    pub fn consecutive_failures(&self) -> u32 {
        self.history.lock().consecutive_failures
    }

    pub async fn status(&self) -> SyncStatus {
        let pending = self.queue.size().await;
        let history = self.history.lock();
        SyncStatus {
            state: if self.is_running() { EngineState::Running } else { EngineState::Idle },
            pending,
            last_run_at: history.last_run_at,
            last_applied: history.last_applied,
            last_error: history.last_error.clone(),
            consecutive_failures: history.consecutive_failures,
        }
    }

    /// Run one reconciliation pass.
    #[instrument(skip(self), fields(trigger = %trigger))]
    pub async fn trigger(&self, trigger: SyncTrigger) -> SyncReport {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            debug!("Sync already in flight; coalescing trigger");
            return SyncReport::skipped(trigger, SyncOutcome::AlreadyRunning);
        };

        if self.queue.is_empty().await {
            debug!("Queue empty; nothing to sync");
            if trigger == SyncTrigger::Manual {
                self.notifier.notify(Notification::info(
                    NotificationKind::Success,
                    "Nothing to sync",
                ));
            }
            return SyncReport::skipped(trigger, SyncOutcome::NothingToSync);
        }

        if !self.monitor.is_online() {
            debug!("Not online; skipping sync");
            if trigger == SyncTrigger::Manual {
                self.notifier.notify(Notification::warning(
                    NotificationKind::Offline,
                    "Offline, cannot sync",
                ));
            }
            return SyncReport::skipped(trigger, SyncOutcome::Offline);
        }

        let snapshot = self.queue.snapshot().await;
        info!(pending = snapshot.len(), "Sync started");
        self.notifier.notify(Notification::info(
            NotificationKind::Syncing,
            format!("Syncing {} pending change(s)", snapshot.len()),
        ));

        let report = self.apply_all(trigger, &snapshot).await;
        self.record(&report);
        self.notify_summary(&report);

        info!(
            applied = report.applied,
            dropped = report.dropped,
            retained = report.retained,
            halted = report.halted(),
            "Sync finished"
        );
        report
    }

    async fn apply_all(&self, trigger: SyncTrigger, snapshot: &[QueuedOperation]) -> SyncReport {
        let mut report = SyncReport::skipped(trigger, SyncOutcome::Completed);
        let mut removals: Vec<OperationId> = Vec::with_capacity(snapshot.len());

        for operation in snapshot {
            match self.apply_one(operation).await {
                Ok(()) => {
                    debug!(operation_id = %operation.id(), "Operation applied");
                    report.applied += 1;
                    removals.push(operation.id());
                    self.notifier.notify(
                        Notification::success(
                            NotificationKind::Success,
                            format!("Synced {}", describe(operation)),
                        )
                        .for_operation(operation.id()),
                    );
                }
                Err(ApplyError::Transient(reason)) => {
                    warn!(
                        operation_id = %operation.id(),
                        kind = %operation.kind(),
                        entity_type = %operation.entity_type(),
                        reason = %reason,
                        "Transient failure; pausing sync"
                    );
                    self.notifier.notify(
                        Notification::warning(
                            NotificationKind::Failure,
                            format!("Could not sync {}, will retry: {reason}", describe(operation)),
                        )
                        .for_operation(operation.id()),
                    );
                    report.halted_on = Some(operation.id());
                    report.halt_reason = Some(reason);
                    break;
                }
                Err(ApplyError::Permanent(reason)) => {
                    error!(
                        operation_id = %operation.id(),
                        kind = %operation.kind(),
                        entity_type = %operation.entity_type(),
                        reason = %reason,
                        "Permanent failure; dropping operation"
                    );
                    self.notifier.notify(
                        Notification::error(
                            NotificationKind::Failure,
                            format!(
                                "Failed to {} {}; change discarded: {reason}",
                                operation.kind(),
                                operation.entity_type()
                            ),
                        )
                        .for_operation(operation.id()),
                    );
                    report.dropped += 1;
                    removals.push(operation.id());
                    report.failures.push(PermanentFailure {
                        id: operation.id(),
                        kind: operation.kind(),
                        entity_type: operation.entity_type(),
                        reason,
                    });
                }
            }
        }

        self.queue.remove(&removals).await;
        report.retained = snapshot.len() - removals.len();
        report
    }

    async fn apply_one(&self, operation: &QueuedOperation) -> Result<(), ApplyError> {
        match tokio::time::timeout(self.apply_timeout, self.applier.apply(operation)).await {
            Ok(result) => result,
            Err(_) => Err(ApplyError::transient(format!(
                "remote apply timed out after {}ms",
                self.apply_timeout.as_millis()
            ))),
        }
    }

    fn record(&self, report: &SyncReport) {
        let mut history = self.history.lock();
        history.last_run_at = Some(self.clock.utc_now());
        history.last_applied = report.applied;
        history.last_error = report
            .halt_reason
            .clone()
            .or_else(|| report.failures.last().map(|failure| failure.reason.clone()));
        if report.halted() {
            history.consecutive_failures = history.consecutive_failures.saturating_add(1);
        } else {
            history.consecutive_failures = 0;
        }
    }

    fn notify_summary(&self, report: &SyncReport) {
        let notification = match report.summary() {
            SyncSummary::FullySynced => Notification::success(
                NotificationKind::Success,
                format!("All changes synced ({})", report.applied),
            ),
            SyncSummary::PartiallySynced => Notification::warning(
                NotificationKind::Failure,
                format!(
                    "Partially synced: {} applied, {} discarded, {} pending",
                    report.applied, report.dropped, report.retained
                ),
            ),
            SyncSummary::NothingToSync => {
                Notification::info(NotificationKind::Success, "Nothing to sync")
            }
        };
        self.notifier.notify(notification);
    }
}

fn describe(operation: &QueuedOperation) -> String {
    format!("{} {}", operation.kind(), operation.entity_type())
}
