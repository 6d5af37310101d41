//! Health snapshot of the offline queue components

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Overall health of the running context.
///
/// # Example
/// ```no_run
/// use ferry_app::utils::health::{ComponentHealth, HealthStatus};
///
/// let mut status = HealthStatus::new()
///     .add_component(ComponentHealth::healthy("queue_storage"))
///     .add_component(ComponentHealth::unhealthy("sync", "3 consecutive halted runs"));
/// status.calculate_score();
///
/// assert_eq!(status.score, 0.5);
/// assert!(!status.is_healthy);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub is_healthy: bool,

    /// Share of healthy components, from 0.0 to 1.0.
    pub score: f64,

    pub message: Option<String>,

    pub components: Vec<ComponentHealth>,

    /// Milliseconds since the Unix epoch when the check ran.
    pub checked_at: i64,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self {
            is_healthy: true,
            score: 1.0,
            message: None,
            components: Vec::new(),
            checked_at: Utc::now().timestamp_millis(),
        }
    }

    #[must_use]
    pub fn add_component(mut self, component: ComponentHealth) -> Self {
        self.components.push(component);
        self
    }

    /// Recompute `score` and `is_healthy` from the components.
    ///
    /// Every component must be healthy for the status to be healthy; the
    /// message lists the failing component names.
    pub fn calculate_score(&mut self) {
        if self.components.is_empty() {
            return;
        }

        let failing: Vec<&str> = self
            .components
            .iter()
            .filter(|c| !c.is_healthy)
            .map(|c| c.name.as_str())
            .collect();
        let healthy_count = self.components.len() - failing.len();

        self.score = healthy_count as f64 / self.components.len() as f64;
        self.is_healthy = failing.is_empty();
        self.message = (!failing.is_empty()).then(|| format!("degraded: {}", failing.join(", ")));
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component identifier (e.g. "queue_storage", "sync_worker")
    pub name: String,
    pub is_healthy: bool,
    pub message: Option<String>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: None }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: false, message: Some(message.into()) }
    }

    /// Healthy component that still carries an informational message.
    pub fn healthy_with(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: Some(message.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_new() {
        let status = HealthStatus::new();
        assert!(status.is_healthy);
        assert_eq!(status.score, 1.0);
        assert!(status.message.is_none());
        assert!(status.components.is_empty());
    }

    #[test]
    fn test_calculate_score_all_healthy() {
        let mut status = HealthStatus::new()
            .add_component(ComponentHealth::healthy("queue_storage"))
            .add_component(ComponentHealth::healthy_with("connectivity", "offline"));

        status.calculate_score();

        assert_eq!(status.score, 1.0);
        assert!(status.is_healthy);
        assert!(status.message.is_none());
    }

    #[test]
    fn test_single_failure_degrades_status() {
        let mut status = HealthStatus::new()
            .add_component(ComponentHealth::healthy("queue_storage"))
            .add_component(ComponentHealth::healthy("connectivity"))
            .add_component(ComponentHealth::healthy("sync"))
            .add_component(ComponentHealth::unhealthy("sync_worker", "not running"));

        status.calculate_score();

        assert_eq!(status.score, 0.75);
        assert!(!status.is_healthy);
        assert_eq!(status.message.as_deref(), Some("degraded: sync_worker"));
    }
}
