//! Queued operations and their payloads

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::errors::FerryError;
use crate::impl_tag_conversions;

/// Identifier assigned to an operation at enqueue time.
///
/// Backed by a UUID v7, so lexical order of ids tracks creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Uuid);

impl OperationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for OperationId {
    type Err = FerryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| FerryError::InvalidInput(format!("invalid operation id '{s}': {e}")))
    }
}

/// Mutation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl_tag_conversions!(OperationKind {
    Create => "create",
    Update => "update",
    Delete => "delete",
});

/// Remote collection an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Entry,
    Category,
    Attachment,
}

impl_tag_conversions!(EntityType {
    Entry => "entry",
    Category => "category",
    Attachment => "attachment",
});

impl EntityType {
    pub const ALL: [Self; 3] = [Self::Entry, Self::Category, Self::Attachment];

    /// Remote collection name used in resource paths.
    pub const fn collection(&self) -> &'static str {
        match self {
            Self::Entry => "entries",
            Self::Category => "categories",
            Self::Attachment => "attachments",
        }
    }
}

/// A journal entry as written by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPayload {
    pub entry_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl EntryPayload {
    pub fn new(entry_id: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            title: None,
            body: None,
            category_id: None,
            occurred_at: None,
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CategoryPayload {
    pub fn new(category_id: impl Into<String>) -> Self {
        Self { category_id: category_id.into(), name: None, color: None }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Metadata for a media file attached to an entry. The binary itself is
/// uploaded out of band; `uri` points at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPayload {
    pub attachment_id: String,
    pub entry_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl AttachmentPayload {
    pub fn new(attachment_id: impl Into<String>, entry_id: impl Into<String>) -> Self {
        Self {
            attachment_id: attachment_id.into(),
            entry_id: entry_id.into(),
            file_name: None,
            mime_type: None,
            uri: None,
            size_bytes: None,
        }
    }

    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}

/// Operation payload, one variant per entity type.
///
/// Serializes as the bare variant object; the tag travels separately as
/// `entityType` in [`OperationRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OperationPayload {
    Entry(EntryPayload),
    Category(CategoryPayload),
    Attachment(AttachmentPayload),
}

impl OperationPayload {
    pub const fn entity_type(&self) -> EntityType {
        match self {
            Self::Entry(_) => EntityType::Entry,
            Self::Category(_) => EntityType::Category,
            Self::Attachment(_) => EntityType::Attachment,
        }
    }

    /// Identifier of the remote entity this payload describes.
    pub fn entity_id(&self) -> &str {
        match self {
            Self::Entry(entry) => &entry.entry_id,
            Self::Category(category) => &category.category_id,
            Self::Attachment(attachment) => &attachment.attachment_id,
        }
    }

    /// Decode a raw payload object for the given tag.
    pub fn from_value(entity_type: EntityType, value: serde_json::Value) -> crate::Result<Self> {
        let payload = match entity_type {
            EntityType::Entry => Self::Entry(serde_json::from_value(value)?),
            EntityType::Category => Self::Category(serde_json::from_value(value)?),
            EntityType::Attachment => Self::Attachment(serde_json::from_value(value)?),
        };
        Ok(payload)
    }
}

impl From<EntryPayload> for OperationPayload {
    fn from(payload: EntryPayload) -> Self {
        Self::Entry(payload)
    }
}

impl From<CategoryPayload> for OperationPayload {
    fn from(payload: CategoryPayload) -> Self {
        Self::Category(payload)
    }
}

impl From<AttachmentPayload> for OperationPayload {
    fn from(payload: AttachmentPayload) -> Self {
        Self::Attachment(payload)
    }
}

/// What a caller hands to the queue. Id and timestamp are assigned on
/// enqueue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationInput {
    pub kind: OperationKind,
    pub payload: OperationPayload,
}

impl OperationInput {
    pub fn new(kind: OperationKind, payload: impl Into<OperationPayload>) -> Self {
        Self { kind, payload: payload.into() }
    }

    pub fn create(payload: impl Into<OperationPayload>) -> Self {
        Self::new(OperationKind::Create, payload)
    }

    pub fn update(payload: impl Into<OperationPayload>) -> Self {
        Self::new(OperationKind::Update, payload)
    }

    pub fn delete(payload: impl Into<OperationPayload>) -> Self {
        Self::new(OperationKind::Delete, payload)
    }

    pub const fn entity_type(&self) -> EntityType {
        self.payload.entity_type()
    }
}

/// One pending mutation. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "OperationRecord")]
pub struct QueuedOperation {
    id: OperationId,
    kind: OperationKind,
    payload: OperationPayload,
    enqueued_at: DateTime<Utc>,
}

impl QueuedOperation {
    /// Build an operation. `enqueued_at` is truncated to millisecond
    /// precision so it survives the durable record unchanged.
    pub fn new(id: OperationId, input: OperationInput, enqueued_at: DateTime<Utc>) -> Self {
        let enqueued_at = DateTime::from_timestamp_millis(enqueued_at.timestamp_millis())
            .unwrap_or(enqueued_at);
        Self { id, kind: input.kind, payload: input.payload, enqueued_at }
    }

    pub const fn id(&self) -> OperationId {
        self.id
    }

    pub const fn kind(&self) -> OperationKind {
        self.kind
    }

    pub const fn entity_type(&self) -> EntityType {
        self.payload.entity_type()
    }

    pub const fn payload(&self) -> &OperationPayload {
        &self.payload
    }

    pub const fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }
}

impl fmt::Display for QueuedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind, self.entity_type(), self.payload.entity_id())
    }
}

/// Serialized shape of one queued operation in the durable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    pub id: OperationId,
    pub kind: OperationKind,
    pub entity_type: EntityType,
    pub payload: serde_json::Value,
    /// Epoch milliseconds.
    pub enqueued_at: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OperationRecordRef<'a> {
    id: OperationId,
    kind: OperationKind,
    entity_type: EntityType,
    payload: &'a OperationPayload,
    enqueued_at: i64,
}

impl Serialize for QueuedOperation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OperationRecordRef {
            id: self.id,
            kind: self.kind,
            entity_type: self.entity_type(),
            payload: &self.payload,
            enqueued_at: self.enqueued_at.timestamp_millis(),
        }
        .serialize(serializer)
    }
}

impl TryFrom<OperationRecord> for QueuedOperation {
    type Error = FerryError;

    fn try_from(record: OperationRecord) -> Result<Self, Self::Error> {
        let payload = OperationPayload::from_value(record.entity_type, record.payload).map_err(
            |e| {
                FerryError::Serialization(format!(
                    "payload of operation {} does not match entity type '{}': {e}",
                    record.id, record.entity_type
                ))
            },
        )?;
        let enqueued_at = DateTime::from_timestamp_millis(record.enqueued_at).ok_or_else(|| {
            FerryError::Serialization(format!(
                "operation {} has out-of-range enqueuedAt {}",
                record.id, record.enqueued_at
            ))
        })?;

        Ok(Self { id: record.id, kind: record.kind, payload, enqueued_at })
    }
}
