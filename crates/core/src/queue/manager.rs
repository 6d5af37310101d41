//! In-memory queue with write-through persistence
//!
//! [`QueueManager`] is the only component that mutates the queue. Every
//! mutation and its persistence write happen under one async lock, so
//! mutations never interleave and the durable record always reflects a
//! complete queue state.
//!
//! Persistence failures are absorbed: the in-memory queue stays
//! authoritative, the failure is logged and surfaced through
//! [`QueueStats::last_storage_error`], and the next successful write
//! brings the record back in line.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use ferry_common::time::{Clock, SystemClock};
use ferry_domain::{OperationId, OperationInput, QueueStats, QueuedOperation};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::store::DurableQueueStore;

#[derive(Debug, Default)]
struct QueueState {
    operations: Vec<QueuedOperation>,
    last_storage_error: Option<String>,
    loaded: bool,
}

/// Owns the ordered queue of pending operations.
pub struct QueueManager {
    store: DurableQueueStore,
    clock: Arc<dyn Clock>,
    state: Mutex<QueueState>,
}

impl QueueManager {
    pub fn new(store: DurableQueueStore) -> Self {
        Self { store, clock: Arc::new(SystemClock), state: Mutex::new(QueueState::default()) }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Append an operation to the tail and persist the queue.
    ///
    /// Never deduplicates. If the wall clock reads earlier than the current
    /// tail, the tail's timestamp is reused so the queue stays ordered.
    #[instrument(skip(self, input), fields(kind = %input.kind, entity_type = %input.entity_type()))]
    pub async fn enqueue(&self, input: OperationInput) -> OperationId {
        let mut state = self.state.lock().await;

        let mut enqueued_at = self.clock.utc_now();
        if let Some(tail) = state.operations.last() {
            if enqueued_at < tail.enqueued_at() {
                warn!(
                    now = %enqueued_at,
                    tail = %tail.enqueued_at(),
                    "Clock moved backwards; clamping enqueue timestamp to queue tail"
                );
                enqueued_at = tail.enqueued_at();
            }
        }

        let operation = QueuedOperation::new(OperationId::new(), input, enqueued_at);
        let id = operation.id();
        state.operations.push(operation);
        debug!(operation_id = %id, pending = state.operations.len(), "Operation enqueued");

        self.persist(&mut state).await;
        id
    }

    /// Replace the in-memory queue with the durable record.
    ///
    /// An absent or unreadable record yields an empty queue. Returns the
    /// resulting size.
    #[instrument(skip(self))]
    pub async fn load_from_store(&self) -> usize {
        let mut state = self.state.lock().await;
        self.load_locked(&mut state).await
    }

    /// Load the durable record the first time only. Later calls keep the
    /// in-memory queue, which may hold operations that never reached the
    /// store.
    pub async fn ensure_loaded(&self) -> usize {
        let mut state = self.state.lock().await;
        if state.loaded {
            debug!(pending = state.operations.len(), "Offline queue already loaded");
            return state.operations.len();
        }
        self.load_locked(&mut state).await
    }

    async fn load_locked(&self, state: &mut QueueState) -> usize {
        let loaded = match self.store.read().await {
            Ok(operations) => {
                state.last_storage_error = None;
                operations
            }
            Err(e) => {
                warn!(error = %e, "Durable queue record unreadable; starting with an empty queue");
                state.last_storage_error = Some(e.to_string());
                Vec::new()
            }
        };

        state.operations = normalize(loaded);
        state.loaded = true;
        info!(pending = state.operations.len(), "Offline queue loaded");
        state.operations.len()
    }

    /// Copy of the queue, oldest first.
    pub async fn snapshot(&self) -> Vec<QueuedOperation> {
        let state = self.state.lock().await;
        let mut operations = state.operations.clone();
        operations.sort_by_key(QueuedOperation::enqueued_at);
        operations
    }

    /// Remove the given operations and persist. Returns how many were
    /// present.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn remove(&self, ids: &[OperationId]) -> usize {
        if ids.is_empty() {
            return 0;
        }

        let targets: HashSet<OperationId> = ids.iter().copied().collect();
        let mut state = self.state.lock().await;

        let before = state.operations.len();
        state.operations.retain(|op| !targets.contains(&op.id()));
        let removed = before - state.operations.len();

        if removed > 0 {
            debug!(removed, pending = state.operations.len(), "Operations removed");
            self.persist(&mut state).await;
        }
        removed
    }

    /// Empty the queue and delete the durable record.
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        let discarded = state.operations.len();
        state.operations.clear();

        match self.store.erase().await {
            Ok(()) => state.last_storage_error = None,
            Err(e) => {
                warn!(error = %e, "Failed to erase durable queue record; writing an empty one");
                self.persist(&mut state).await;
            }
        }
        info!(discarded, "Offline queue cleared");
    }

    pub async fn size(&self) -> usize {
        self.state.lock().await.operations.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.size().await == 0
    }

    pub async fn stats(&self) -> QueueStats {
        let state = self.state.lock().await;

        let mut by_entity = BTreeMap::new();
        for op in &state.operations {
            *by_entity.entry(op.entity_type()).or_insert(0) += 1;
        }

        QueueStats {
            pending: state.operations.len(),
            oldest_enqueued_at: state.operations.iter().map(QueuedOperation::enqueued_at).min(),
            by_entity,
            last_storage_error: state.last_storage_error.clone(),
        }
    }

    async fn persist(&self, state: &mut QueueState) {
        match self.store.write(&state.operations).await {
            Ok(()) => state.last_storage_error = None,
            Err(e) => {
                warn!(
                    error = %e,
                    pending = state.operations.len(),
                    "Failed to persist offline queue; in-memory queue remains authoritative"
                );
                state.last_storage_error = Some(e.to_string());
            }
        }
    }
}

/// Order by `enqueued_at` (stable) and drop repeated ids, keeping the first.
fn normalize(mut operations: Vec<QueuedOperation>) -> Vec<QueuedOperation> {
    operations.sort_by_key(QueuedOperation::enqueued_at);

    let mut seen = HashSet::with_capacity(operations.len());
    let before = operations.len();
    operations.retain(|op| seen.insert(op.id()));
    if operations.len() != before {
        warn!(duplicates = before - operations.len(), "Dropped duplicate operation ids from record");
    }
    operations
}
