//! Host-driven connectivity source
//!
//! For hosts that already receive platform reachability callbacks: forward
//! each one to [`ManualConnectivitySource::set`].

use async_trait::async_trait;
use ferry_core::{ConnectivitySource, SignalCallback, SourceSubscription};
use ferry_domain::{ConnectivitySignal, Result};
use parking_lot::RwLock;
use tracing::debug;

use super::SignalSubscribers;

pub struct ManualConnectivitySource {
    current: RwLock<ConnectivitySignal>,
    subscribers: SignalSubscribers,
}

impl ManualConnectivitySource {
    pub fn new(initial: ConnectivitySignal) -> Self {
        Self { current: RwLock::new(initial), subscribers: SignalSubscribers::default() }
    }

    /// Record a platform signal and push it to subscribers.
    pub fn set(&self, signal: ConnectivitySignal) {
        *self.current.write() = signal;
        debug!(connected = signal.connected, reachable = %signal.reachable, "Connectivity signal");
        self.subscribers.broadcast(signal);
    }

    pub fn set_online(&self, online: bool) {
        self.set(if online { ConnectivitySignal::online() } else { ConnectivitySignal::offline() });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for ManualConnectivitySource {
    fn default() -> Self {
        Self::new(ConnectivitySignal::unknown(false))
    }
}

#[async_trait]
impl ConnectivitySource for ManualConnectivitySource {
    fn subscribe(&self, callback: SignalCallback) -> SourceSubscription {
        let id = self.subscribers.add(callback);
        let subscribers = self.subscribers.clone();
        SourceSubscription::new(move || {
            subscribers.remove(id);
        })
    }

    async fn fetch_once(&self) -> Result<ConnectivitySignal> {
        Ok(*self.current.read())
    }
}
