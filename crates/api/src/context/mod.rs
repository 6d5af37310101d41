//! Application context - dependency injection container

use std::sync::Arc;

use ferry_common::retry::Backoff;
use ferry_core::{
    ConnectivityMonitor, ConnectivitySource, DurableQueueStore, NotificationSink,
    OfflineSyncService, QueueManager, RemoteApplier, SyncEngine,
};
use ferry_domain::{
    FerryConfig, FerryError, Notification, OperationId, OperationInput, Result, SyncConfig,
    SyncReport,
};
use ferry_infra::{
    ChannelNotificationSink, FanoutNotificationSink, FileKeyValueStore, HttpReachabilityProbe,
    HttpRemoteApplier, ManualConnectivitySource, TracingNotificationSink,
};
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, instrument};

use crate::utils::health::{ComponentHealth, HealthStatus};
use crate::utils::logging::log_sync_report;

/// Where connectivity signals come from.
pub enum ConnectivityDriver {
    /// Polls the configured health endpoint.
    Probe(Arc<HttpReachabilityProbe>),
    /// The host pushes platform signals.
    Manual(Arc<ManualConnectivitySource>),
}

impl ConnectivityDriver {
    fn from_config(config: &FerryConfig) -> Result<Self> {
        Ok(match HttpReachabilityProbe::from_config(&config.connectivity)? {
            Some(probe) => {
                info!(url = %probe.url(), "Using HTTP reachability probe");
                Self::Probe(Arc::new(probe))
            }
            None => {
                info!("No probe url configured; connectivity is host-driven");
                Self::Manual(Arc::new(ManualConnectivitySource::default()))
            }
        })
    }

    fn as_source(&self) -> Arc<dyn ConnectivitySource> {
        match self {
            Self::Probe(probe) => Arc::clone(probe) as Arc<dyn ConnectivitySource>,
            Self::Manual(manual) => Arc::clone(manual) as Arc<dyn ConnectivitySource>,
        }
    }
}

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: FerryConfig,
    pub store: Arc<FileKeyValueStore>,
    pub queue: Arc<QueueManager>,
    pub monitor: Arc<ConnectivityMonitor>,
    pub engine: Arc<SyncEngine>,
    pub service: Arc<OfflineSyncService>,
    pub connectivity: ConnectivityDriver,
    notifications: Mutex<Option<UnboundedReceiver<Notification>>>,
}

impl AppContext {
    /// Wire every component from `config`. Nothing runs until
    /// [`AppContext::start`].
    ///
    /// # Errors
    /// `FerryError::Config` when the configuration is invalid or an adapter
    /// cannot be built from it.
    pub fn new(config: FerryConfig) -> Result<Self> {
        let applier: Arc<dyn RemoteApplier> = Arc::new(HttpRemoteApplier::from_config(&config.remote)?);
        Self::with_applier(config, applier)
    }

    /// Like [`AppContext::new`] with a caller-provided remote applier.
    pub fn with_applier(config: FerryConfig, applier: Arc<dyn RemoteApplier>) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(FileKeyValueStore::new(&config.storage.directory));
        let durable = DurableQueueStore::new(store.clone()).with_key(config.storage.key.clone());
        let queue = Arc::new(QueueManager::new(durable));

        let connectivity = ConnectivityDriver::from_config(&config)?;
        let monitor = Arc::new(ConnectivityMonitor::new(connectivity.as_source()));

        let (channel, receiver) = ChannelNotificationSink::new();
        let notifier: Arc<dyn NotificationSink> = Arc::new(
            FanoutNotificationSink::new()
                .with_sink(Arc::new(TracingNotificationSink::new()))
                .with_sink(Arc::new(channel)),
        );

        let engine = Arc::new(
            SyncEngine::new(queue.clone(), monitor.clone(), applier, notifier.clone())
                .with_apply_timeout(config.sync.apply_timeout()),
        );
        let service = Arc::new(
            OfflineSyncService::new(queue.clone(), monitor.clone(), engine.clone(), notifier)
                .with_retry(retry_policy(&config.sync)?),
        );

        info!(
            storage_dir = %config.storage.directory.display(),
            remote = %config.remote.base_url,
            auto_retry = config.sync.auto_retry,
            "Application context created"
        );

        Ok(Self {
            config,
            store,
            queue,
            monitor,
            engine,
            service,
            connectivity,
            notifications: Mutex::new(Some(receiver)),
        })
    }

    /// Host-driven connectivity source, when no probe url is configured.
    pub fn manual_connectivity(&self) -> Option<&Arc<ManualConnectivitySource>> {
        match &self.connectivity {
            ConnectivityDriver::Manual(manual) => Some(manual),
            ConnectivityDriver::Probe(_) => None,
        }
    }

    /// Receiver of user-facing notifications. Yields `Some` once.
    pub fn take_notifications(&self) -> Option<UnboundedReceiver<Notification>> {
        self.notifications.lock().take()
    }

    /// Start the offline sync service.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        self.service.start().await.map_err(FerryError::from)
    }

    pub async fn enqueue(&self, input: OperationInput) -> OperationId {
        self.service.enqueue(input).await
    }

    /// Run a manual sync pass now and log its report.
    pub async fn sync_now(&self) -> SyncReport {
        let report = self.service.trigger_sync().await;
        log_sync_report(&report);
        report
    }

    pub async fn health_check(&self) -> HealthStatus {
        let stats = self.service.stats().await;
        let status = self.service.status().await;
        let connectivity = self.service.connectivity();

        let storage = match stats.last_storage_error {
            Some(error) => ComponentHealth::unhealthy("queue_storage", error),
            None => ComponentHealth::healthy_with(
                "queue_storage",
                format!("{} pending", stats.pending),
            ),
        };

        let link = if connectivity.is_online() {
            ComponentHealth::healthy("connectivity")
        } else {
            ComponentHealth::healthy_with(
                "connectivity",
                format!("offline (connected={}, reachable={})", connectivity.connected, connectivity.reachable),
            )
        };

        let worker = if self.service.is_running().await {
            ComponentHealth::healthy("sync_worker")
        } else {
            ComponentHealth::unhealthy("sync_worker", "not running")
        };

        let sync = if status.consecutive_failures == 0 {
            ComponentHealth::healthy("sync")
        } else {
            ComponentHealth::unhealthy(
                "sync",
                format!(
                    "{} consecutive halted runs: {}",
                    status.consecutive_failures,
                    status.last_error.as_deref().unwrap_or("unknown error")
                ),
            )
        };

        let mut health = HealthStatus::new()
            .add_component(storage)
            .add_component(link)
            .add_component(worker)
            .add_component(sync);
        health.calculate_score();
        health
    }

    /// Stop the worker if it runs. Idempotent.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<()> {
        if !self.service.is_running().await {
            info!("shutdown called on idle AppContext");
            return Ok(());
        }

        self.service.stop().await.map_err(FerryError::from)?;
        info!(pending = self.service.size().await, "AppContext shut down");
        Ok(())
    }
}

/// Retry backoff from the sync section; `None` when automatic retries are
/// disabled.
pub fn retry_policy(config: &SyncConfig) -> Result<Option<Backoff>> {
    if !config.auto_retry {
        return Ok(None);
    }

    Backoff::builder()
        .base_delay(config.retry_base())
        .max_delay(config.retry_max())
        .jitter_factor(config.retry_jitter)
        .build()
        .map(Some)
        .map_err(|err| FerryError::Config(format!("invalid retry policy: {err}")))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_retry_policy_follows_config() {
        let config = SyncConfig { retry_base_ms: 100, retry_max_ms: 1_000, ..SyncConfig::default() };
        let backoff = retry_policy(&config).unwrap().expect("retry enabled by default");
        assert_eq!(backoff.base_delay(), Duration::from_millis(100));
        assert_eq!(backoff.max_delay(), Duration::from_millis(1_000));

        let disabled = SyncConfig { auto_retry: false, ..SyncConfig::default() };
        assert!(retry_policy(&disabled).unwrap().is_none());

        let zero = SyncConfig { retry_base_ms: 0, ..SyncConfig::default() };
        assert!(matches!(retry_policy(&zero), Err(FerryError::Config(_))));
    }
}
