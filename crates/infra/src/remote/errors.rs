//! Remote apply error types
//!
//! Classifies backend failures so the sync engine can tell an outage (keep
//! the operation, retry later) from a rejection (drop the operation).

use std::time::Duration;

use ferry_domain::ApplyError;
use reqwest::StatusCode;
use thiserror::Error;

/// Categories of remote errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorCategory {
    /// Connection failures and timeouts - retryable
    Network,
    /// Rate limiting (429) - retryable
    RateLimit,
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (4xx) - the backend rejected the operation
    Client,
    /// The payload could not be encoded
    Serialization,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("Client error ({status}): {body}")]
    Client { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RemoteError {
    /// Classify a non-success HTTP response.
    pub fn from_status(status: StatusCode, body: impl Into<String>) -> Self {
        let body = body.into();
        match status.as_u16() {
            429 => Self::RateLimit(body),
            408 => Self::Network(format!("request timeout: {body}")),
            code if status.is_server_error() => Self::Server { status: code, body },
            code => Self::Client { status: code, body },
        }
    }

    pub const fn category(&self) -> RemoteErrorCategory {
        match self {
            Self::Network(_) | Self::Timeout(_) => RemoteErrorCategory::Network,
            Self::RateLimit(_) => RemoteErrorCategory::RateLimit,
            Self::Server { .. } => RemoteErrorCategory::Server,
            Self::Client { .. } => RemoteErrorCategory::Client,
            Self::Serialization(_) => RemoteErrorCategory::Serialization,
        }
    }

    pub const fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            RemoteErrorCategory::Network | RemoteErrorCategory::RateLimit | RemoteErrorCategory::Server
        )
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_builder() {
            Self::Serialization(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status, err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<RemoteError> for ApplyError {
    fn from(err: RemoteError) -> Self {
        if err.should_retry() {
            Self::transient(err.to_string())
        } else {
            Self::permanent(err.to_string())
        }
    }
}
