//! Lifecycle errors for the offline sync service

use std::time::Duration;

use ferry_domain::FerryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("offline sync service already running")]
    AlreadyRunning,

    #[error("offline sync service not running")]
    NotRunning,

    #[error("reconciliation worker did not stop within {0:?}")]
    StopTimeout(Duration),

    #[error("reconciliation worker task failed: {0}")]
    TaskJoin(String),
}

impl From<ServiceError> for FerryError {
    fn from(err: ServiceError) -> Self {
        Self::Internal(err.to_string())
    }
}
