//! Shared test helpers for `ferry-core` integration tests.
//!
//! In-memory mocks for every core port plus a harness that wires them into
//! a queue, monitor, engine and service.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ferry_common::time::MockClock;
use ferry_core::{
    ConnectivityMonitor, ConnectivitySource, DurableQueueStore, KeyValueStore, NotificationSink,
    OfflineSyncService, QueueManager, RemoteApplier, SignalCallback, SourceSubscription,
    SyncEngine,
};
use ferry_domain::{
    ApplyError, ConnectivitySignal, EntryPayload, FerryError, Notification, NotificationKind,
    OperationInput, QueuedOperation, Result as DomainResult, Severity,
};
use parking_lot::Mutex;
use tokio::sync::Mutex as TokioMutex;

/// In-memory `KeyValueStore` that can be told to fail writes.
#[derive(Default)]
pub struct MemoryStore {
    values: TokioMutex<HashMap<String, String>>,
    fail_writes: Mutex<bool>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().await.get(key).cloned()
    }

    pub async fn set_raw(&self, key: &str, value: &str) {
        self.values.lock().await.insert(key.to_string(), value.to_string());
    }

    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> DomainResult<()> {
        if *self.fail_writes.lock() {
            return Err(FerryError::Storage("simulated write failure".into()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.values.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> DomainResult<()> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}

/// Connectivity source driven by the test.
pub struct ScriptedSource {
    reading: Mutex<DomainResult<ConnectivitySignal>>,
    callbacks: Arc<Mutex<Vec<(usize, SignalCallback)>>>,
    next_id: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(initial: ConnectivitySignal) -> Self {
        Self {
            reading: Mutex::new(Ok(initial)),
            callbacks: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Change what `fetch_once` reports without pushing a signal.
    pub fn set_reading(&self, reading: DomainResult<ConnectivitySignal>) {
        *self.reading.lock() = reading;
    }

    /// Update the reading and push it to subscribers, like a platform
    /// callback would.
    pub fn emit(&self, signal: ConnectivitySignal) {
        self.set_reading(Ok(signal));
        let callbacks: Vec<SignalCallback> =
            self.callbacks.lock().iter().map(|(_, cb)| Arc::clone(cb)).collect();
        for callback in callbacks {
            callback(signal);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.callbacks.lock().len()
    }
}

#[async_trait]
impl ConnectivitySource for ScriptedSource {
    fn subscribe(&self, callback: SignalCallback) -> SourceSubscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.callbacks.lock().push((id, callback));
        let callbacks = Arc::clone(&self.callbacks);
        SourceSubscription::new(move || callbacks.lock().retain(|(cb_id, _)| *cb_id != id))
    }

    async fn fetch_once(&self) -> DomainResult<ConnectivitySignal> {
        self.reading.lock().clone()
    }
}

/// Remote applier with per-entity scripted failures.
#[derive(Default)]
pub struct ScriptedApplier {
    failures: Mutex<HashMap<String, ApplyError>>,
    attempts: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedApplier {
    pub fn fail(&self, entity_id: &str, error: ApplyError) {
        self.failures.lock().insert(entity_id.to_string(), error);
    }

    pub fn heal(&self, entity_id: &str) {
        self.failures.lock().remove(entity_id);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Entity ids in the order they were attempted.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().clone()
    }
}

#[async_trait]
impl RemoteApplier for ScriptedApplier {
    async fn apply(&self, operation: &QueuedOperation) -> Result<(), ApplyError> {
        let entity_id = operation.payload().entity_id().to_string();
        self.attempts.lock().push(entity_id.clone());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.failures.lock().get(&entity_id) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Records every notification.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().clone()
    }

    pub fn count(&self, kind: NotificationKind, severity: Severity) -> usize {
        self.events.lock().iter().filter(|n| n.kind == kind && n.severity == severity).count()
    }

    /// Per-operation events of the given kind and severity.
    pub fn operation_count(&self, kind: NotificationKind, severity: Severity) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|n| n.kind == kind && n.severity == severity && n.operation.is_some())
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.events.lock().push(notification);
    }
}

/// Everything wired together over the mocks.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub source: Arc<ScriptedSource>,
    pub applier: Arc<ScriptedApplier>,
    pub sink: Arc<RecordingSink>,
    pub clock: MockClock,
    pub queue: Arc<QueueManager>,
    pub monitor: Arc<ConnectivityMonitor>,
    pub engine: Arc<SyncEngine>,
}

impl Harness {
    pub fn new(initial: ConnectivitySignal) -> Self {
        Self::with_store(initial, Arc::new(MemoryStore::default()))
    }

    pub fn with_store(initial: ConnectivitySignal, store: Arc<MemoryStore>) -> Self {
        let source = Arc::new(ScriptedSource::new(initial));
        let applier = Arc::new(ScriptedApplier::default());
        let sink = Arc::new(RecordingSink::default());
        let clock = MockClock::at_millis(1_700_000_000_000);

        let queue = Arc::new(
            QueueManager::new(DurableQueueStore::new(store.clone()))
                .with_clock(Arc::new(clock.clone())),
        );
        let monitor = Arc::new(ConnectivityMonitor::with_clock(
            source.clone(),
            Arc::new(clock.clone()),
        ));
        let engine = Arc::new(
            SyncEngine::new(queue.clone(), monitor.clone(), applier.clone(), sink.clone())
                .with_apply_timeout(Duration::from_secs(2))
                .with_clock(Arc::new(clock.clone())),
        );

        Self { store, source, applier, sink, clock, queue, monitor, engine }
    }

    /// Service without automatic retries unless the test opts in.
    pub fn service(&self) -> OfflineSyncService {
        OfflineSyncService::new(
            self.queue.clone(),
            self.monitor.clone(),
            self.engine.clone(),
            self.sink.clone(),
        )
        .with_retry(None)
        .with_stop_timeout(Duration::from_secs(2))
    }

    /// Enqueue a create for each entry id, one millisecond apart.
    pub async fn enqueue_entries(&self, ids: &[&str]) {
        for id in ids {
            self.queue.enqueue(OperationInput::create(EntryPayload::new(*id))).await;
            self.clock.advance(Duration::from_millis(1));
        }
    }

    pub async fn queued_entity_ids(&self) -> Vec<String> {
        self.queue
            .snapshot()
            .await
            .iter()
            .map(|op| op.payload().entity_id().to_string())
            .collect()
    }
}
