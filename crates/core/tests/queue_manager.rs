//! Queue manager behaviour over an in-memory key/value store.

mod support;

use std::sync::Arc;
use std::time::Duration;

use ferry_core::{DurableQueueStore, QueueManager};
use ferry_domain::constants::QUEUE_STORAGE_KEY;
use ferry_domain::{
    AttachmentPayload, CategoryPayload, ConnectivitySignal, EntryPayload, OperationInput,
    OperationKind,
};
use support::{Harness, MemoryStore};

/// Validates the enqueue ordering scenario.
///
/// Assertions:
/// - Snapshot timestamps are non-decreasing.
/// - Snapshot follows enqueue order.
#[tokio::test]
async fn snapshot_is_ordered_by_enqueue_time() {
    let h = Harness::new(ConnectivitySignal::offline());

    h.enqueue_entries(&["a", "b", "c"]).await;
    // Same-millisecond enqueues keep insertion order.
    h.queue.enqueue(OperationInput::create(EntryPayload::new("d"))).await;
    h.queue.enqueue(OperationInput::create(EntryPayload::new("e"))).await;

    let snapshot = h.queue.snapshot().await;
    assert!(snapshot.windows(2).all(|w| w[0].enqueued_at() <= w[1].enqueued_at()));
    assert_eq!(h.queued_entity_ids().await, vec!["a", "b", "c", "d", "e"]);
}

#[tokio::test]
async fn identical_enqueues_are_not_deduplicated() {
    let h = Harness::new(ConnectivitySignal::offline());
    let input = OperationInput::update(CategoryPayload::new("c-1").with_name("Work"));

    let first = h.queue.enqueue(input.clone()).await;
    let second = h.queue.enqueue(input).await;

    assert_ne!(first, second);
    assert_eq!(h.queue.size().await, 2);
}

/// Validates the persistence round-trip scenario.
///
/// Assertions:
/// - A fresh manager over the same store sees the same ids, kinds, entity
///   types, payloads and order.
#[tokio::test]
async fn round_trip_through_fresh_instance() {
    let store = Arc::new(MemoryStore::default());
    let h = Harness::with_store(ConnectivitySignal::offline(), store.clone());

    h.queue.enqueue(OperationInput::create(EntryPayload::new("e-1").with_title("Lunch"))).await;
    h.clock.advance(Duration::from_millis(3));
    h.queue.enqueue(OperationInput::create(CategoryPayload::new("c-1").with_name("Food"))).await;
    h.clock.advance(Duration::from_millis(3));
    h.queue
        .enqueue(OperationInput::delete(
            AttachmentPayload::new("att-1", "e-1").with_uri("file:///photo.jpg"),
        ))
        .await;
    let original = h.queue.snapshot().await;

    let fresh = QueueManager::new(DurableQueueStore::new(store));
    assert_eq!(fresh.load_from_store().await, 3);

    assert_eq!(fresh.snapshot().await, original);
    assert_eq!(original[2].kind(), OperationKind::Delete);
}

#[tokio::test]
async fn load_twice_yields_same_queue() {
    let store = Arc::new(MemoryStore::default());
    let h = Harness::with_store(ConnectivitySignal::offline(), store.clone());
    h.enqueue_entries(&["a", "b"]).await;

    let fresh = QueueManager::new(DurableQueueStore::new(store));
    fresh.load_from_store().await;
    let first = fresh.snapshot().await;
    fresh.load_from_store().await;

    assert_eq!(fresh.snapshot().await, first);
}

#[tokio::test]
async fn corrupt_record_loads_as_empty_queue() {
    let store = Arc::new(MemoryStore::default());
    store.set_raw(QUEUE_STORAGE_KEY, "{\"version\":1,\"operations\":[{\"id\":42}]}").await;

    let queue = QueueManager::new(DurableQueueStore::new(store));

    assert_eq!(queue.load_from_store().await, 0);
    assert!(queue.stats().await.last_storage_error.is_some());
}

/// Validates the clear scenario.
///
/// Assertions:
/// - `size()` is zero.
/// - A later `load_from_store` on a fresh instance yields empty.
#[tokio::test]
async fn clear_empties_memory_and_record() {
    let store = Arc::new(MemoryStore::default());
    let h = Harness::with_store(ConnectivitySignal::offline(), store.clone());
    h.enqueue_entries(&["a", "b"]).await;

    h.queue.clear().await;

    assert_eq!(h.queue.size().await, 0);
    assert!(store.raw(QUEUE_STORAGE_KEY).await.is_none());
    let fresh = QueueManager::new(DurableQueueStore::new(store));
    assert_eq!(fresh.load_from_store().await, 0);
}

#[tokio::test]
async fn every_mutation_rewrites_record() {
    let store = Arc::new(MemoryStore::default());
    let h = Harness::with_store(ConnectivitySignal::offline(), store.clone());

    h.enqueue_entries(&["a", "b"]).await;
    let ids: Vec<_> = h.queue.snapshot().await.iter().map(|op| op.id()).collect();
    h.queue.remove(&ids[..1]).await;

    assert_eq!(store.write_count(), 3);
    let fresh = QueueManager::new(DurableQueueStore::new(store));
    fresh.load_from_store().await;
    assert_eq!(fresh.snapshot().await, h.queue.snapshot().await);
}

#[tokio::test]
async fn failed_write_keeps_memory_authoritative() {
    let store = Arc::new(MemoryStore::default());
    let h = Harness::with_store(ConnectivitySignal::offline(), store.clone());

    store.fail_writes(true);
    h.enqueue_entries(&["a"]).await;

    assert_eq!(h.queue.size().await, 1);
    assert!(store.raw(QUEUE_STORAGE_KEY).await.is_none());

    store.fail_writes(false);
    h.enqueue_entries(&["b"]).await;
    let fresh = QueueManager::new(DurableQueueStore::new(store));
    assert_eq!(fresh.load_from_store().await, 2);
}
