//! Connectivity signal sources

pub mod http_probe;
pub mod manual;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ferry_core::SignalCallback;
use ferry_domain::ConnectivitySignal;
use parking_lot::Mutex;

pub use http_probe::HttpReachabilityProbe;
pub use manual::ManualConnectivitySource;

/// Callback registry shared by the sources in this module.
#[derive(Clone, Default)]
pub(crate) struct SignalSubscribers {
    callbacks: Arc<Mutex<Vec<(u64, SignalCallback)>>>,
    next_id: Arc<AtomicU64>,
}

impl SignalSubscribers {
    pub(crate) fn add(&self, callback: SignalCallback) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks.lock().push((id, callback));
        id
    }

    /// Remove a callback and return how many remain.
    pub(crate) fn remove(&self, id: u64) -> usize {
        let mut callbacks = self.callbacks.lock();
        callbacks.retain(|(cb_id, _)| *cb_id != id);
        callbacks.len()
    }

    pub(crate) fn broadcast(&self, signal: ConnectivitySignal) {
        let callbacks: Vec<SignalCallback> =
            self.callbacks.lock().iter().map(|(_, cb)| Arc::clone(cb)).collect();
        for callback in callbacks {
            callback(signal);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.lock().len()
    }
}
