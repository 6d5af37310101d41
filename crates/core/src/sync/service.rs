//! Caller-facing offline sync service
//!
//! Composes the queue, the connectivity monitor and the sync engine, and
//! runs the reconciliation worker that reacts to connectivity edges,
//! caller writes and the retry timer.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ferry_core::OfflineSyncService;
//! use ferry_domain::{EntryPayload, OperationInput};
//!
//! # async fn example(service: Arc<OfflineSyncService>) -> Result<(), ferry_core::ServiceError> {
//! service.start().await?;
//! service.enqueue(OperationInput::create(EntryPayload::new("entry-1"))).await;
//! // ... application runs ...
//! service.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use ferry_common::retry::Backoff;
use ferry_domain::constants::WORKER_STOP_TIMEOUT_SECS;
use ferry_domain::{
    ConnectivityState, Notification, NotificationKind, OperationId, OperationInput, QueueStats,
    SyncOutcome, SyncReport, SyncStatus, SyncTrigger,
};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::engine::SyncEngine;
use super::errors::ServiceError;
use super::ports::NotificationSink;
use crate::connectivity::{ConnectivityMonitor, Subscription};
use crate::queue::QueueManager;

#[derive(Debug, Clone, Copy)]
enum WorkerSignal {
    Connectivity(ConnectivityState),
    Sync(SyncTrigger),
}

struct WorkerRuntime {
    cancellation: CancellationToken,
    handle: JoinHandle<()>,
    signals: mpsc::UnboundedSender<WorkerSignal>,
    subscription: Subscription,
}

/// Offline queue facade with explicit start/stop lifecycle.
pub struct OfflineSyncService {
    queue: Arc<QueueManager>,
    monitor: Arc<ConnectivityMonitor>,
    engine: Arc<SyncEngine>,
    notifier: Arc<dyn NotificationSink>,
    retry: Option<Backoff>,
    stop_timeout: Duration,
    runtime: Mutex<Option<WorkerRuntime>>,
}

impl OfflineSyncService {
    pub fn new(
        queue: Arc<QueueManager>,
        monitor: Arc<ConnectivityMonitor>,
        engine: Arc<SyncEngine>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            queue,
            monitor,
            engine,
            notifier,
            retry: Some(Backoff::default()),
            stop_timeout: Duration::from_secs(WORKER_STOP_TIMEOUT_SECS),
            runtime: Mutex::new(None),
        }
    }

    /// Backoff used to schedule a retry after a transient failure. `None`
    /// disables automatic retries.
    #[must_use]
    pub fn with_retry(mut self, retry: Option<Backoff>) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Load the queue (first start only), attach the monitor and spawn the reconciliation
    /// worker. Triggers a startup sync when online.
    ///
    /// # Errors
    /// [`ServiceError::AlreadyRunning`] if the worker is active.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<(), ServiceError> {
        let mut runtime = self.runtime.lock().await;
        if runtime.is_some() {
            return Err(ServiceError::AlreadyRunning);
        }

        info!("Starting offline sync service");

        let pending = self.queue.ensure_loaded().await;
        self.monitor.start();

        let (signals, receiver) = mpsc::unbounded_channel();
        let edges = signals.clone();
        let subscription = self.monitor.subscribe(move |state| {
            let _ = edges.send(WorkerSignal::Connectivity(*state));
        });

        let state = self.monitor.refresh().await;
        if state.is_online() {
            let _ = signals.send(WorkerSignal::Sync(SyncTrigger::Startup));
        }

        let cancellation = CancellationToken::new();
        let worker = ReconciliationWorker {
            engine: Arc::clone(&self.engine),
            monitor: Arc::clone(&self.monitor),
            notifier: Arc::clone(&self.notifier),
            retry: self.retry.clone(),
            was_online: state.is_online(),
            retry_at: None,
        };
        let cancel = cancellation.clone();
        let handle = tokio::spawn(async move {
            worker.run(receiver, cancel).await;
        });

        *runtime = Some(WorkerRuntime {
            cancellation,
            handle,
            signals,
            subscription,
        });

        info!(pending, online = state.is_online(), "Offline sync service started");
        Ok(())
    }

    /// Cancel the worker and wait for it to finish.
    ///
    /// # Errors
    /// [`ServiceError::NotRunning`] if not started, [`ServiceError::StopTimeout`]
    /// or [`ServiceError::TaskJoin`] if the worker did not exit cleanly.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<(), ServiceError> {
        let Some(runtime) = self.runtime.lock().await.take() else {
            return Err(ServiceError::NotRunning);
        };

        info!("Stopping offline sync service");

        runtime.cancellation.cancel();
        drop(runtime.subscription);
        self.monitor.stop();

        match tokio::time::timeout(self.stop_timeout, runtime.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Reconciliation worker task failed: {}", e);
                return Err(ServiceError::TaskJoin(e.to_string()));
            }
            Err(_) => {
                warn!("Reconciliation worker did not complete within timeout");
                return Err(ServiceError::StopTimeout(self.stop_timeout));
            }
        }

        info!("Offline sync service stopped");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.runtime.lock().await.is_some()
    }

    /// Queue a write. Syncs right away when online and the worker runs.
    #[instrument(skip(self, input), fields(kind = %input.kind, entity_type = %input.entity_type()))]
    pub async fn enqueue(&self, input: OperationInput) -> OperationId {
        let kind = input.kind;
        let entity_type = input.entity_type();
        let id = self.queue.enqueue(input).await;
        let online = self.monitor.is_online();

        let message = if online {
            format!("Saved {kind} {entity_type}; syncing")
        } else {
            format!("Saved {kind} {entity_type} offline; it will sync when you are back online")
        };
        self.notifier.notify(Notification::info(NotificationKind::Queued, message).for_operation(id));

        if online {
            if let Some(runtime) = self.runtime.lock().await.as_ref() {
                let _ = runtime.signals.send(WorkerSignal::Sync(SyncTrigger::Enqueued));
            }
        }
        id
    }

    /// Run a manual sync on the caller's task.
    pub async fn trigger_sync(&self) -> SyncReport {
        self.engine.trigger(SyncTrigger::Manual).await
    }

    pub async fn size(&self) -> usize {
        self.queue.size().await
    }

    pub async fn clear(&self) {
        self.queue.clear().await;
    }

    pub async fn stats(&self) -> QueueStats {
        self.queue.stats().await
    }

    pub async fn status(&self) -> SyncStatus {
        self.engine.status().await
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.monitor.current()
    }
}

impl Drop for OfflineSyncService {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.get_mut().as_ref() {
            warn!("OfflineSyncService dropped while running; cancelling worker");
            runtime.cancellation.cancel();
        }
    }
}

/// Background loop reacting to connectivity edges, sync requests and the
/// retry timer.
struct ReconciliationWorker {
    engine: Arc<SyncEngine>,
    monitor: Arc<ConnectivityMonitor>,
    notifier: Arc<dyn NotificationSink>,
    retry: Option<Backoff>,
    was_online: bool,
    retry_at: Option<Instant>,
}

impl ReconciliationWorker {
    async fn run(
        mut self,
        mut receiver: mpsc::UnboundedReceiver<WorkerSignal>,
        cancel: CancellationToken,
    ) {
        loop {
            let trigger = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("Reconciliation worker cancelled");
                    break;
                }
                signal = receiver.recv() => match signal {
                    Some(WorkerSignal::Connectivity(state)) => self.on_connectivity(state),
                    Some(WorkerSignal::Sync(trigger)) => Some(trigger),
                    None => break,
                },
                () = retry_sleep(self.retry_at) => {
                    self.retry_at = None;
                    Some(SyncTrigger::RetryTimer)
                }
            };

            let Some(trigger) = trigger else {
                continue;
            };

            let engine = Arc::clone(&self.engine);
            let report = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(%trigger, "Reconciliation worker cancelled mid-sync");
                    break;
                }
                report = engine.trigger(trigger) => report,
            };
            self.after_run(&report);
        }
    }

    fn on_connectivity(&mut self, state: ConnectivityState) -> Option<SyncTrigger> {
        let online = state.is_online();
        if online == self.was_online {
            return None;
        }
        self.was_online = online;

        if online {
            self.notifier.notify(Notification::success(NotificationKind::Online, "Back online"));
            Some(SyncTrigger::ConnectivityRestored)
        } else {
            self.notifier.notify(Notification::warning(
                NotificationKind::Offline,
                "You are offline; changes will be saved and synced later",
            ));
            self.retry_at = None;
            None
        }
    }

    fn after_run(&mut self, report: &SyncReport) {
        if report.outcome != SyncOutcome::Completed {
            return;
        }
        if !report.halted() {
            self.retry_at = None;
            return;
        }

        let Some(backoff) = self.retry.as_ref() else {
            return;
        };
        if !self.monitor.is_online() {
            return;
        }

        let attempt = self.engine.consecutive_failures().saturating_sub(1);
        let delay = backoff.delay_for(attempt);
        self.retry_at = Some(Instant::now() + delay);
        info!(attempt, delay_ms = delay.as_millis() as u64, "Scheduled sync retry");
    }
}

async fn retry_sleep(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
