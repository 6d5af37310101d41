//! Ferry - offline operation queue daemon
//!
//! Loads configuration, starts the offline sync service and runs until
//! interrupted.

use std::sync::Arc;

use anyhow::Context;
use ferry_app::utils::logging::{init_logging, log_queue_stats};
use ferry_app::AppContext;
use ferry_domain::NotificationKind;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the config loader reads FERRY_* variables
    let dotenv = dotenvy::dotenv();

    let config = ferry_infra::config::load().context("failed to load configuration")?;
    init_logging(config.logging.format);

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env file loaded"),
    }

    let context = Arc::new(AppContext::new(config).context("failed to build application context")?);

    // Summary notifications (no operation id) mark the end of a pass
    if let Some(mut notifications) = context.take_notifications() {
        let watcher = Arc::clone(&context);
        tokio::spawn(async move {
            while let Some(notification) = notifications.recv().await {
                let end_of_pass = notification.operation.is_none()
                    && matches!(notification.kind, NotificationKind::Success | NotificationKind::Failure);
                if end_of_pass {
                    log_queue_stats(&watcher.service.stats().await);
                }
            }
        });
    }

    context.start().await.context("failed to start offline sync service")?;
    log_queue_stats(&context.service.stats().await);
    info!("Ferry running; press Ctrl+C to stop");

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    context.shutdown().await.context("failed to stop offline sync service")?;
    Ok(())
}
