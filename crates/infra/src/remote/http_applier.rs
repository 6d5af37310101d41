//! REST adapter for replaying queued operations
//!
//! `create` posts to the entity collection, `update` and `delete` address the
//! entity by id. Every request carries the operation id as its idempotency
//! key so a pass replayed after a crash is harmless to the backend.

use std::time::Duration;

use async_trait::async_trait;
use ferry_core::RemoteApplier;
use ferry_domain::{
    ApplyError, FerryError, OperationKind, QueuedOperation, RemoteConfig, Result,
};
use reqwest::{Client, Method};
use tracing::{debug, instrument, warn};
use url::Url;

use super::errors::RemoteError;

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

const DEFAULT_USER_AGENT: &str = concat!("ferry/", env!("CARGO_PKG_VERSION"));

/// Longest response body echoed into an error reason.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone)]
pub struct HttpRemoteApplier {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpRemoteApplier {
    pub fn builder() -> HttpRemoteApplierBuilder {
        HttpRemoteApplierBuilder::default()
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        Self::builder().base_url(config.base_url.clone()).timeout(config.timeout()).build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL addressed by `operation`.
    pub fn endpoint(&self, operation: &QueuedOperation) -> std::result::Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                RemoteError::Serialization(format!("base url '{}' cannot hold a path", self.base_url))
            })?;
            segments.pop_if_empty().push(operation.entity_type().collection());
            if operation.kind() != OperationKind::Create {
                segments.push(operation.payload().entity_id());
            }
        }
        Ok(url)
    }

    async fn send(&self, operation: &QueuedOperation) -> std::result::Result<(), RemoteError> {
        let url = self.endpoint(operation)?;
        let method = match operation.kind() {
            OperationKind::Create => Method::POST,
            OperationKind::Update => Method::PUT,
            OperationKind::Delete => Method::DELETE,
        };

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(IDEMPOTENCY_HEADER, operation.id().to_string());
        if operation.kind() != OperationKind::Delete {
            let body = serde_json::to_vec(operation.payload())?;
            request = request.header(reqwest::header::CONTENT_TYPE, "application/json").body(body);
        }

        debug!(%method, %url, "Sending operation");
        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                RemoteError::Timeout(self.timeout)
            } else {
                RemoteError::from(err)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(%method, %url, %status, "Operation accepted");
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(RemoteError::from_status(status, body))
    }
}

#[async_trait]
impl RemoteApplier for HttpRemoteApplier {
    #[instrument(skip(self, operation), fields(op_id = %operation.id(), op = %operation))]
    async fn apply(&self, operation: &QueuedOperation) -> std::result::Result<(), ApplyError> {
        self.send(operation).await.map_err(|err| {
            warn!(
                error = %err,
                category = ?err.category(),
                retry = err.should_retry(),
                "Remote apply failed"
            );
            ApplyError::from(err)
        })
    }
}

/// Builder for [`HttpRemoteApplier`].
#[derive(Debug)]
pub struct HttpRemoteApplierBuilder {
    base_url: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for HttpRemoteApplierBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_millis(ferry_domain::constants::DEFAULT_REMOTE_TIMEOUT_MS),
            user_agent: None,
        }
    }
}

impl HttpRemoteApplierBuilder {
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<HttpRemoteApplier> {
        let raw = self
            .base_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| FerryError::Config("remote base url is required".into()))?;
        let base_url = Url::parse(&raw)
            .map_err(|err| FerryError::Config(format!("invalid remote base url '{raw}': {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(FerryError::Config(format!("remote base url '{raw}' cannot hold a path")));
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()))
            .build()
            .map_err(|err| FerryError::Config(format!("failed to build http client: {err}")))?;

        Ok(HttpRemoteApplier { client, base_url, timeout: self.timeout })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ferry_domain::{EntryPayload, OperationId, OperationInput};

    use super::*;

    fn operation(input: OperationInput) -> QueuedOperation {
        QueuedOperation::new(OperationId::new(), input, Utc::now())
    }

    #[test]
    fn test_endpoint_per_kind() {
        let applier = HttpRemoteApplier::builder().base_url("https://api.test/v1").build().unwrap();

        let create = operation(OperationInput::create(EntryPayload::new("e-1")));
        let update = operation(OperationInput::update(EntryPayload::new("e-1")));
        let delete = operation(OperationInput::delete(EntryPayload::new("e 2")));

        assert_eq!(applier.endpoint(&create).unwrap().as_str(), "https://api.test/v1/entries");
        assert_eq!(applier.endpoint(&update).unwrap().as_str(), "https://api.test/v1/entries/e-1");
        assert_eq!(
            applier.endpoint(&delete).unwrap().as_str(),
            "https://api.test/v1/entries/e%202"
        );
    }

    #[test]
    fn test_trailing_slash_base() {
        let applier = HttpRemoteApplier::builder().base_url("https://api.test/v1/").build().unwrap();
        let create = operation(OperationInput::create(EntryPayload::new("e-1")));
        assert_eq!(applier.endpoint(&create).unwrap().as_str(), "https://api.test/v1/entries");
    }

    #[test]
    fn test_builder_rejects_missing_or_invalid_url() {
        assert!(matches!(HttpRemoteApplier::builder().build(), Err(FerryError::Config(_))));
        assert!(matches!(
            HttpRemoteApplier::builder().base_url("not a url").build(),
            Err(FerryError::Config(_))
        ));
        assert!(matches!(
            HttpRemoteApplier::builder().base_url("mailto:ops@example.com").build(),
            Err(FerryError::Config(_))
        ));
    }
}
