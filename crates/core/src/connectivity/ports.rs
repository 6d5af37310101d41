//! Port interfaces for platform connectivity signals

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ferry_domain::{ConnectivitySignal, Result};

/// Callback invoked by a source for every platform signal, changed or not.
pub type SignalCallback = Arc<dyn Fn(ConnectivitySignal) + Send + Sync>;

/// Platform reachability signal.
#[async_trait]
pub trait ConnectivitySource: Send + Sync {
    /// Deliver every future signal to `callback` until the returned handle
    /// is dropped.
    fn subscribe(&self, callback: SignalCallback) -> SourceSubscription;

    /// Query the platform once for its current reading.
    async fn fetch_once(&self) -> Result<ConnectivitySignal>;
}

/// Detaches a source callback when dropped.
pub struct SourceSubscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SourceSubscription {
    pub fn new(detach: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self { detach: Some(Box::new(detach)) }
    }

    /// Subscription for sources that never push signals.
    pub fn detached() -> Self {
        Self { detach: None }
    }

    pub fn unsubscribe(mut self) {
        self.run_detach();
    }

    fn run_detach(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for SourceSubscription {
    fn drop(&mut self) {
        self.run_detach();
    }
}

impl fmt::Debug for SourceSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSubscription").field("attached", &self.detach.is_some()).finish()
    }
}
