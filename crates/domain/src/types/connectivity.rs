//! Connectivity state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_tag_conversions;

/// Whether the backend answered the last reachability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    Reachable,
    Unreachable,
    #[default]
    Unknown,
}

impl_tag_conversions!(Reachability {
    Reachable => "reachable",
    Unreachable => "unreachable",
    Unknown => "unknown",
});

/// Raw reading from a platform connectivity source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivitySignal {
    pub connected: bool,
    pub reachable: Reachability,
}

impl ConnectivitySignal {
    pub const fn online() -> Self {
        Self { connected: true, reachable: Reachability::Reachable }
    }

    pub const fn offline() -> Self {
        Self { connected: false, reachable: Reachability::Unreachable }
    }

    /// Link is up but the backend could not be checked.
    pub const fn unknown(connected: bool) -> Self {
        Self { connected, reachable: Reachability::Unknown }
    }

    pub const fn is_online(&self) -> bool {
        self.connected && matches!(self.reachable, Reachability::Reachable)
    }
}

/// Best-known connectivity, replaced wholesale on every signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityState {
    pub connected: bool,
    pub reachable: Reachability,
    /// When `connected` or `reachable` last changed.
    pub changed_at: DateTime<Utc>,
}

impl ConnectivityState {
    /// State before any signal has been observed.
    pub const fn initial(at: DateTime<Utc>) -> Self {
        Self { connected: false, reachable: Reachability::Unknown, changed_at: at }
    }

    pub const fn from_signal(signal: ConnectivitySignal, at: DateTime<Utc>) -> Self {
        Self { connected: signal.connected, reachable: signal.reachable, changed_at: at }
    }

    pub const fn signal(&self) -> ConnectivitySignal {
        ConnectivitySignal { connected: self.connected, reachable: self.reachable }
    }

    /// `connected && reachable == Reachable`.
    pub const fn is_online(&self) -> bool {
        self.signal().is_online()
    }

    /// True when `signal` differs from this state in `connected` or
    /// `reachable`.
    pub fn is_edge(&self, signal: ConnectivitySignal) -> bool {
        self.signal() != signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_offline_and_unknown() {
        let state = ConnectivityState::initial(Utc::now());
        assert!(!state.connected);
        assert_eq!(state.reachable, Reachability::Unknown);
        assert!(!state.is_online());
    }

    #[test]
    fn online_requires_link_and_reachability() {
        assert!(ConnectivitySignal::online().is_online());
        assert!(!ConnectivitySignal::unknown(true).is_online());
        assert!(!ConnectivitySignal { connected: false, reachable: Reachability::Reachable }
            .is_online());
    }

    #[test]
    fn edge_detection_ignores_timestamp() {
        let state = ConnectivityState::from_signal(ConnectivitySignal::online(), Utc::now());
        assert!(!state.is_edge(ConnectivitySignal::online()));
        assert!(state.is_edge(ConnectivitySignal::unknown(true)));
        assert!(state.is_edge(ConnectivitySignal::offline()));
    }
}
