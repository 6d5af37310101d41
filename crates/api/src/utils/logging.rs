//! Logging initialisation and structured log helpers

use std::sync::Once;

use ferry_domain::{LogFormat, QueueStats, SyncOutcome, SyncReport};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default `info` filter. Safe to call more than
/// once; only the first call has an effect, and an already-installed
/// subscriber is left in place.
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(filter);

        let installed = match format {
            LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
            LogFormat::Json => registry
                .with(fmt::layer().json().with_target(true).with_current_span(false))
                .try_init(),
        };

        if installed.is_err() {
            warn!("global tracing subscriber already installed");
        }
    });
}

/// Log the outcome of one sync pass with stable field names.
pub fn log_sync_report(report: &SyncReport) {
    let trigger = report.trigger.as_str();
    let outcome = report.outcome.as_str();

    if report.halted() {
        let halted_on = report.halted_on.map(|id| id.to_string());
        warn!(
            trigger,
            outcome,
            applied = report.applied,
            dropped = report.dropped,
            retained = report.retained,
            halted_on = halted_on.as_deref(),
            halt_reason = report.halt_reason.as_deref(),
            "sync_pass_halted"
        );
    } else if matches!(report.outcome, SyncOutcome::Completed) {
        info!(
            trigger,
            outcome,
            applied = report.applied,
            dropped = report.dropped,
            retained = report.retained,
            summary = ?report.summary(),
            "sync_pass_completed"
        );
    } else {
        info!(trigger, outcome, "sync_pass_skipped");
    }
}

/// Log queue depth and the age of the oldest pending operation.
pub fn log_queue_stats(stats: &QueueStats) {
    let oldest_ms = stats.oldest_enqueued_at.map(|at| at.timestamp_millis());
    if let Some(error) = stats.last_storage_error.as_deref() {
        warn!(pending = stats.pending, oldest_ms, storage_error = error, "queue_stats");
    } else {
        info!(pending = stats.pending, oldest_ms, "queue_stats");
    }
}
