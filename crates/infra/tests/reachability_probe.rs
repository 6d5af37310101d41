//! Integration tests for the HTTP reachability probe

use std::sync::Arc;
use std::time::Duration;

use ferry_common::testing::poll_until;
use ferry_core::ConnectivitySource;
use ferry_domain::{ConnectivitySignal, Reachability};
use ferry_infra::HttpReachabilityProbe;
use parking_lot::Mutex;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(3);
const TICK: Duration = Duration::from_millis(10);

fn probe_for(url: &str) -> HttpReachabilityProbe {
    HttpReachabilityProbe::new(
        Url::parse(url).unwrap(),
        Duration::from_millis(50),
        Duration::from_millis(500),
    )
    .unwrap()
}

async fn health_server(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_fetch_once_reads_health_status() {
    let healthy = health_server(200).await;
    let failing = health_server(503).await;

    let online = probe_for(&format!("{}/health", healthy.uri())).fetch_once().await.unwrap();
    let degraded = probe_for(&format!("{}/health", failing.uri())).fetch_once().await.unwrap();

    assert_eq!(online, ConnectivitySignal::online());
    assert!(degraded.connected);
    assert_eq!(degraded.reachable, Reachability::Unreachable);
}

#[tokio::test]
async fn test_refused_connection_reads_offline() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let signal = probe_for(&format!("http://127.0.0.1:{port}/health")).fetch_once().await.unwrap();
    assert_eq!(signal, ConnectivitySignal::offline());
}

/// Validates the polling lifecycle scenario.
///
/// Assertions:
/// - Subscribing starts polling and pushes readings.
/// - Dropping the last subscription stops polling.
#[tokio::test]
async fn test_subscription_drives_polling() {
    let server = health_server(200).await;
    let probe = probe_for(&format!("{}/health", server.uri()));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = probe.subscribe(Arc::new(move |signal| sink.lock().push(signal)));
    assert!(probe.is_polling());

    let seen_ref = &seen;
    let polled = poll_until(WAIT, TICK, move || async move { seen_ref.lock().len() >= 2 }).await;
    assert!(polled, "probe should push repeated readings");
    assert!(seen.lock().iter().all(|signal| signal.is_online()));

    drop(subscription);
    assert!(!probe.is_polling());
}

/// Validates the failing probe scenario.
///
/// Assertions:
/// - A request error is pushed as unknown reachability.
/// - The link keeps its last reading instead of being reported as up.
#[tokio::test]
async fn test_probe_error_keeps_link_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/health"))
        .mount(&server)
        .await;
    let probe = probe_for(&format!("{}/health", server.uri()));

    assert!(probe.fetch_once().await.is_err());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = probe.subscribe(Arc::new(move |signal| sink.lock().push(signal)));

    let seen_ref = &seen;
    let polled = poll_until(WAIT, TICK, move || async move { !seen_ref.lock().is_empty() }).await;
    assert!(polled);
    assert_eq!(seen.lock()[0], ConnectivitySignal::unknown(false));
}

#[test]
fn test_rejects_zero_interval() {
    let result = HttpReachabilityProbe::new(
        Url::parse("http://localhost/health").unwrap(),
        Duration::ZERO,
        Duration::from_secs(1),
    );
    assert!(result.is_err());
}
