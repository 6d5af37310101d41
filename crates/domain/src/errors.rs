//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Ferry
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum FerryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for FerryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for FerryError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Result type alias for Ferry operations
pub type Result<T> = std::result::Result<T, FerryError>;

/// Outcome of a failed remote apply.
///
/// `Transient` halts the current sync pass and keeps the operation queued.
/// `Permanent` drops the operation and reports it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "reason")]
pub enum ApplyError {
    #[error("transient failure: {0}")]
    Transient(String),

    #[error("permanent failure: {0}")]
    Permanent(String),
}

impl ApplyError {
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient(reason.into())
    }

    pub fn permanent(reason: impl Into<String>) -> Self {
        Self::Permanent(reason.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Transient(reason) | Self::Permanent(reason) => reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_maps_to_serialization() {
        let err: FerryError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, FerryError::Serialization(_)));
    }

    #[test]
    fn apply_error_exposes_reason() {
        let err = ApplyError::transient("503 Service Unavailable");
        assert!(err.is_transient());
        assert_eq!(err.reason(), "503 Service Unavailable");
        assert_eq!(err.to_string(), "transient failure: 503 Service Unavailable");

        assert!(!ApplyError::permanent("422").is_transient());
    }

    #[test]
    fn error_serializes_with_type_tag() {
        let json = serde_json::to_value(FerryError::Config("missing url".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "Config", "message": "missing url" }));
    }
}
