//! HTTP reachability probe
//!
//! Treats the backend as reachable when a GET against the probe URL answers
//! with a success status. While at least one subscriber is attached the probe
//! polls on a fixed interval and pushes every reading; the polling task is
//! cancelled when the last subscriber detaches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ferry_core::{ConnectivitySource, SignalCallback, SourceSubscription};
use ferry_domain::{ConnectivityConfig, ConnectivitySignal, FerryError, Reachability, Result};
use parking_lot::Mutex;
use reqwest::Client;
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

use super::SignalSubscribers;

struct ProbeInner {
    client: Client,
    url: Url,
    timeout: Duration,
    /// Link state of the last successful reading.
    last_connected: AtomicBool,
}

impl ProbeInner {
    async fn probe(&self) -> Result<ConnectivitySignal> {
        let signal = self.classify().await?;
        self.last_connected.store(signal.connected, Ordering::Relaxed);
        Ok(signal)
    }

    /// Reading pushed when a probe fails outright: backend unknown, link as
    /// last seen.
    fn degraded(&self) -> ConnectivitySignal {
        ConnectivitySignal::unknown(self.last_connected.load(Ordering::Relaxed))
    }

    async fn classify(&self) -> Result<ConnectivitySignal> {
        let response =
            self.client.get(self.url.clone()).timeout(self.timeout).send().await;

        match response {
            Ok(response) if response.status().is_success() => Ok(ConnectivitySignal::online()),
            Ok(response) => {
                debug!(status = %response.status(), url = %self.url, "Probe answered with failure status");
                Ok(ConnectivitySignal { connected: true, reachable: Reachability::Unreachable })
            }
            Err(err) if err.is_connect() => {
                debug!(error = %err, url = %self.url, "Probe could not connect");
                Ok(ConnectivitySignal::offline())
            }
            Err(err) if err.is_timeout() => {
                debug!(error = %err, url = %self.url, "Probe timed out");
                Ok(ConnectivitySignal { connected: true, reachable: Reachability::Unreachable })
            }
            Err(err) => Err(FerryError::Connectivity(format!("probe request failed: {err}"))),
        }
    }
}

/// Connectivity source backed by periodic HTTP checks.
pub struct HttpReachabilityProbe {
    inner: Arc<ProbeInner>,
    interval: Duration,
    subscribers: SignalSubscribers,
    poller: Arc<Mutex<Option<CancellationToken>>>,
}

impl HttpReachabilityProbe {
    pub fn new(url: Url, interval: Duration, timeout: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(FerryError::Config("probe interval must be positive".into()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| FerryError::Config(format!("failed to build probe client: {err}")))?;

        Ok(Self {
            inner: Arc::new(ProbeInner {
                client,
                url,
                timeout,
                last_connected: AtomicBool::new(false),
            }),
            interval,
            subscribers: SignalSubscribers::default(),
            poller: Arc::new(Mutex::new(None)),
        })
    }

    /// Build a probe from the connectivity section; `None` when no probe URL
    /// is configured.
    pub fn from_config(config: &ConnectivityConfig) -> Result<Option<Self>> {
        let Some(raw) = config.probe_url.as_deref() else {
            return Ok(None);
        };
        let url = Url::parse(raw)
            .map_err(|err| FerryError::Config(format!("invalid probe url '{raw}': {err}")))?;
        Self::new(url, config.poll_interval(), config.probe_timeout()).map(Some)
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    pub fn is_polling(&self) -> bool {
        self.poller.lock().is_some()
    }

    fn ensure_polling(&self) {
        let mut poller = self.poller.lock();
        if poller.is_some() {
            return;
        }

        let Ok(handle) = Handle::try_current() else {
            warn!(url = %self.inner.url, "No tokio runtime; reachability polling disabled");
            return;
        };

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let inner = Arc::clone(&self.inner);
        let subscribers = self.subscribers.clone();
        let interval = self.interval;

        handle.spawn(async move {
            Self::poll_loop(inner, subscribers, interval, task_cancel).await;
        });

        *poller = Some(cancel);
        debug!(url = %self.inner.url, interval_ms = interval.as_millis() as u64, "Reachability polling started");
    }

    async fn poll_loop(
        inner: Arc<ProbeInner>,
        subscribers: SignalSubscribers,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Reachability polling cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    match inner.probe().await {
                        Ok(signal) => subscribers.broadcast(signal),
                        Err(err) => {
                            warn!(error = %err, "Reachability probe failed");
                            subscribers.broadcast(inner.degraded());
                        }
                    }
                }
            }
        }
    }
}

#[async_trait]
impl ConnectivitySource for HttpReachabilityProbe {
    fn subscribe(&self, callback: SignalCallback) -> SourceSubscription {
        let id = self.subscribers.add(callback);
        self.ensure_polling();

        let subscribers = self.subscribers.clone();
        let poller = Arc::clone(&self.poller);
        SourceSubscription::new(move || {
            if subscribers.remove(id) == 0 {
                if let Some(cancel) = poller.lock().take() {
                    cancel.cancel();
                }
            }
        })
    }

    #[instrument(skip(self), fields(url = %self.inner.url))]
    async fn fetch_once(&self) -> Result<ConnectivitySignal> {
        self.inner.probe().await
    }
}

impl Drop for HttpReachabilityProbe {
    fn drop(&mut self) {
        if let Some(cancel) = self.poller.lock().take() {
            cancel.cancel();
        }
    }
}
