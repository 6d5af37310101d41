//! Edge-triggered connectivity monitor
//!
//! Wraps a [`ConnectivitySource`] and keeps the best-known
//! [`ConnectivityState`]. Listeners hear about edges only: a signal that
//! matches the current `connected`/`reachable` pair is absorbed silently.
//! Edges are delivered in listener registration order, one edge at a time.
//!
//! Listeners run on the thread that observed the signal and must not call
//! back into [`ConnectivityMonitor::observe`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use ferry_common::time::{Clock, SystemClock};
use ferry_domain::{ConnectivitySignal, ConnectivityState};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use super::ports::{ConnectivitySource, SourceSubscription};

type Listener = Arc<dyn Fn(&ConnectivityState) + Send + Sync>;

struct MonitorInner {
    clock: Arc<dyn Clock>,
    state: RwLock<ConnectivityState>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener: AtomicU64,
    delivery: Mutex<()>,
}

impl MonitorInner {
    fn observe(&self, signal: ConnectivitySignal) -> bool {
        let _delivery = self.delivery.lock();

        let changed = {
            let mut state = self.state.write();
            if !state.is_edge(signal) {
                return false;
            }
            *state = ConnectivityState::from_signal(signal, self.clock.utc_now());
            *state
        };

        info!(
            connected = changed.connected,
            reachable = %changed.reachable,
            online = changed.is_online(),
            "Connectivity changed"
        );

        let listeners: Vec<Listener> =
            self.listeners.lock().iter().map(|(_, listener)| Arc::clone(listener)).collect();
        for listener in listeners {
            listener(&changed);
        }
        true
    }

    fn degrade(&self) -> bool {
        let connected = self.state.read().connected;
        self.observe(ConnectivitySignal::unknown(connected))
    }

    async fn refresh(&self, source: &dyn ConnectivitySource) -> ConnectivityState {
        match source.fetch_once().await {
            Ok(signal) => {
                self.observe(signal);
            }
            Err(e) => {
                warn!(error = %e, "Connectivity query failed; reachability unknown");
                self.degrade();
            }
        }
        *self.state.read()
    }
}

/// Handle for a monitor listener. Dropping it stops delivery.
pub struct Subscription {
    inner: Weak<MonitorInner>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Tracks connectivity and notifies listeners on edges.
pub struct ConnectivityMonitor {
    source: Arc<dyn ConnectivitySource>,
    inner: Arc<MonitorInner>,
    attachment: Mutex<Option<SourceSubscription>>,
}

impl ConnectivityMonitor {
    pub fn new(source: Arc<dyn ConnectivitySource>) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    pub fn with_clock(source: Arc<dyn ConnectivitySource>, clock: Arc<dyn Clock>) -> Self {
        let initial = ConnectivityState::initial(clock.utc_now());
        Self {
            source,
            inner: Arc::new(MonitorInner {
                clock,
                state: RwLock::new(initial),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(0),
                delivery: Mutex::new(()),
            }),
            attachment: Mutex::new(None),
        }
    }

    /// Best-known state. Never blocks on I/O.
    pub fn current(&self) -> ConnectivityState {
        *self.inner.state.read()
    }

    pub fn is_online(&self) -> bool {
        self.current().is_online()
    }

    /// Register `on_change` for future edges.
    ///
    /// Also schedules one background refresh against the source so the
    /// cached state catches up with the platform. Outside a Tokio runtime
    /// the refresh is skipped.
    pub fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&ConnectivityState) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(on_change)));

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(&self.inner);
                let source = Arc::clone(&self.source);
                handle.spawn(async move {
                    inner.refresh(source.as_ref()).await;
                });
            }
            Err(_) => debug!("No runtime available; skipping subscribe refresh"),
        }

        Subscription { inner: Arc::downgrade(&self.inner), id }
    }

    /// Apply a platform signal. Returns `true` when it was an edge.
    pub fn observe(&self, signal: ConnectivitySignal) -> bool {
        self.inner.observe(signal)
    }

    /// Query the source once and apply the result.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> ConnectivityState {
        self.inner.refresh(self.source.as_ref()).await
    }

    /// Attach to the source's signal stream. Idempotent.
    pub fn start(&self) {
        let mut attachment = self.attachment.lock();
        if attachment.is_some() {
            return;
        }

        let inner = Arc::downgrade(&self.inner);
        let subscription = self.source.subscribe(Arc::new(move |signal| {
            if let Some(inner) = inner.upgrade() {
                inner.observe(signal);
            }
        }));
        *attachment = Some(subscription);
        debug!("Connectivity monitor attached to source");
    }

    /// Detach from the source. Cached state and listeners are kept.
    pub fn stop(&self) {
        if self.attachment.lock().take().is_some() {
            debug!("Connectivity monitor detached from source");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.lock().is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
