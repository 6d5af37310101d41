//! Durable queue record
//!
//! The whole queue lives under one key as a versioned JSON envelope:
//!
//! ```json
//! { "version": 1, "savedAt": 1700000000000, "operations": [ ... ] }
//! ```
//!
//! A bare JSON array of operations is accepted on read.

use std::sync::Arc;

use ferry_common::time::{Clock, SystemClock};
use ferry_domain::constants::{QUEUE_RECORD_VERSION, QUEUE_STORAGE_KEY};
use ferry_domain::{FerryError, QueuedOperation, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use super::ports::KeyValueStore;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueueEnvelopeRef<'a> {
    version: u32,
    saved_at: i64,
    operations: &'a [QueuedOperation],
}

#[derive(Deserialize)]
struct QueueEnvelope {
    version: u32,
    operations: Vec<QueuedOperation>,
}

/// Reads and writes the queue record through a [`KeyValueStore`].
#[derive(Clone)]
pub struct DurableQueueStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    clock: Arc<dyn Clock>,
}

impl DurableQueueStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store, key: QUEUE_STORAGE_KEY.to_string(), clock: Arc::new(SystemClock) }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored queue. An absent record reads as empty.
    ///
    /// # Errors
    /// `Storage` when the backing store fails, `Serialization` when the
    /// record cannot be decoded.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn read(&self) -> Result<Vec<QueuedOperation>> {
        let Some(raw) = self.store.get(&self.key).await? else {
            debug!("No durable queue record");
            return Ok(Vec::new());
        };

        let operations = decode(&raw)?;
        debug!(count = operations.len(), "Read durable queue record");
        Ok(operations)
    }

    /// Replace the stored queue with `operations`.
    #[instrument(skip(self, operations), fields(key = %self.key, count = operations.len()))]
    pub async fn write(&self, operations: &[QueuedOperation]) -> Result<()> {
        let envelope = QueueEnvelopeRef {
            version: QUEUE_RECORD_VERSION,
            saved_at: self.clock.millis_since_epoch(),
            operations,
        };
        let raw = serde_json::to_string(&envelope)?;
        self.store.put(&self.key, &raw).await
    }

    /// Delete the stored record.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn erase(&self) -> Result<()> {
        self.store.remove(&self.key).await
    }
}

fn decode(raw: &str) -> Result<Vec<QueuedOperation>> {
    let value: Value = serde_json::from_str(raw)?;

    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(_) => {
            let envelope: QueueEnvelope = serde_json::from_value(value)?;
            if envelope.version > QUEUE_RECORD_VERSION {
                return Err(FerryError::Serialization(format!(
                    "Queue record version {} is newer than supported version {}",
                    envelope.version, QUEUE_RECORD_VERSION
                )));
            }
            Ok(envelope.operations)
        }
        other => Err(FerryError::Serialization(format!(
            "Queue record must be an object or array, found {}",
            json_type_name(&other)
        ))),
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
