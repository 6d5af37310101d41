//! Integration tests for AppContext lifecycle
//!
//! Wires the real file store, host-driven connectivity and HTTP applier
//! against a WireMock backend, and drives the offline → online replay end
//! to end.

use std::time::Duration;

use ferry_app::AppContext;
use ferry_common::testing::{poll_until, TempDir};
use ferry_domain::constants::QUEUE_STORAGE_KEY;
use ferry_domain::{
    CategoryPayload, EntryPayload, FerryConfig, FerryError, NotificationKind, OperationInput,
    RemoteConfig, StorageConfig, SyncConfig,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);
const TICK: Duration = Duration::from_millis(10);

fn test_config(dir: &TempDir, base_url: &str) -> FerryConfig {
    FerryConfig {
        storage: StorageConfig { directory: dir.path().join("store"), ..Default::default() },
        remote: RemoteConfig { base_url: base_url.to_string(), timeout_ms: 1_000 },
        sync: SyncConfig { auto_retry: false, ..Default::default() },
        ..Default::default()
    }
}

async fn accepting_backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/entries"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    server
}

/// Validates the offline enqueue then reconnect scenario.
///
/// Assertions:
/// - Offline writes are persisted and not sent.
/// - The online edge replays them in order and empties the queue.
/// - The UI channel sees queued, online and success notifications.
#[tokio::test(flavor = "multi_thread")]
async fn test_offline_writes_replay_when_back_online() {
    let dir = TempDir::new("ferry-context").unwrap();
    let server = accepting_backend().await;
    let context = AppContext::new(test_config(&dir, &server.uri())).unwrap();
    let mut notifications = context.take_notifications().expect("receiver available once");
    assert!(context.take_notifications().is_none());

    context.start().await.unwrap();
    context.enqueue(OperationInput::create(CategoryPayload::new("c-1").with_name("Work"))).await;
    context.enqueue(OperationInput::create(EntryPayload::new("e-1").with_category("c-1"))).await;

    assert_eq!(context.service.size().await, 2);
    assert!(dir.path().join("store").join(format!("{QUEUE_STORAGE_KEY}.json")).exists());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());

    context.manual_connectivity().expect("no probe configured").set_online(true);

    let service = &context.service;
    let drained = poll_until(WAIT, TICK, move || async move { service.size().await == 0 }).await;
    assert!(drained, "queue should drain after the online edge");

    let requests = server.received_requests().await.unwrap_or_default();
    let paths: Vec<_> = requests.iter().map(|r| r.url.path().to_string()).collect();
    assert_eq!(paths, vec!["/categories", "/entries"]);

    context.shutdown().await.unwrap();

    let mut kinds = Vec::new();
    while let Ok(notification) = notifications.try_recv() {
        kinds.push(notification.kind);
    }
    assert_eq!(kinds.iter().filter(|k| **k == NotificationKind::Queued).count(), 2);
    assert!(kinds.contains(&NotificationKind::Online));
    assert!(kinds.contains(&NotificationKind::Success));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_queue_survives_context_restart() {
    let dir = TempDir::new("ferry-context").unwrap();
    let config = test_config(&dir, "http://127.0.0.1:9");

    let first = AppContext::new(config.clone()).unwrap();
    first.start().await.unwrap();
    let id = first.enqueue(OperationInput::update(EntryPayload::new("e-7"))).await;
    first.shutdown().await.unwrap();
    drop(first);

    let second = AppContext::new(config).unwrap();
    second.start().await.unwrap();

    let snapshot = second.queue.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id(), id);

    second.shutdown().await.unwrap();
}

/// Validates the health snapshot scenario.
///
/// Assertions:
/// - A stopped context reports the worker as unhealthy.
/// - Running offline is healthy, with the offline state in the message.
#[tokio::test(flavor = "multi_thread")]
async fn test_health_check_reflects_lifecycle() {
    let dir = TempDir::new("ferry-context").unwrap();
    let context = AppContext::new(test_config(&dir, "http://127.0.0.1:9")).unwrap();

    let idle = context.health_check().await;
    assert!(!idle.is_healthy);
    assert_eq!(idle.message.as_deref(), Some("degraded: sync_worker"));

    context.start().await.unwrap();
    let running = context.health_check().await;
    assert!(running.is_healthy);
    let link = running.components.iter().find(|c| c.name == "connectivity").unwrap();
    assert!(link.message.as_deref().unwrap_or_default().starts_with("offline"));

    context.shutdown().await.unwrap();
    context.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_manual_sync_while_offline_is_skipped() {
    let dir = TempDir::new("ferry-context").unwrap();
    let context = AppContext::new(test_config(&dir, "http://127.0.0.1:9")).unwrap();
    context.start().await.unwrap();
    context.enqueue(OperationInput::delete(EntryPayload::new("e-1"))).await;

    let report = context.sync_now().await;

    assert_eq!(report.outcome, ferry_domain::SyncOutcome::Offline);
    assert_eq!(context.service.size().await, 1);
    context.shutdown().await.unwrap();
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new("ferry-context").unwrap();

    let missing_url = test_config(&dir, "");
    assert!(matches!(AppContext::new(missing_url), Err(FerryError::Config(_))));

    let mut bad_probe = test_config(&dir, "https://api.example.com");
    bad_probe.connectivity.probe_url = Some("not a url".into());
    assert!(matches!(AppContext::new(bad_probe), Err(FerryError::Config(_))));
}

#[tokio::test]
async fn test_double_start_is_an_error() {
    let dir = TempDir::new("ferry-context").unwrap();
    let context = AppContext::new(test_config(&dir, "https://api.example.com")).unwrap();

    context.start().await.unwrap();
    assert!(matches!(context.start().await, Err(FerryError::Internal(_))));
    context.shutdown().await.unwrap();
}
