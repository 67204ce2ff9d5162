//! History record entity

use crate::identity::session::IdentityId;
use crate::prediction::result::{Confidence, PredictionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned record identifier, unique within one identity's collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Opaque reference to a stored preview of the submitted image
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewRef(String);

impl PreviewRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields of a record before the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHistoryRecord {
    pub label: String,
    pub confidence: Option<Confidence>,
    pub text: Option<String>,
    pub explanation: Option<String>,
    pub image_preview_ref: Option<PreviewRef>,
}

impl NewHistoryRecord {
    /// Build the record persisted after a successful classification.
    ///
    /// Blank text is stored as absent.
    pub fn from_prediction(
        result: &PredictionResult,
        text: Option<&str>,
        image_preview_ref: Option<PreviewRef>,
    ) -> Self {
        Self {
            label: result.label.clone(),
            confidence: result.confidence,
            text: crate::core::text::non_blank(text).map(str::to_string),
            explanation: result.explanation.clone(),
            image_preview_ref,
        }
    }
}

/// A persisted classification result (Entity)
///
/// Records are immutable once created; the only mutation a collection
/// supports is deleting a whole record by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    id: RecordId,
    label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<Confidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_preview_ref: Option<PreviewRef>,
    created_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Materialize a record. Only history stores call this.
    pub fn create(id: RecordId, fields: NewHistoryRecord, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            label: fields.label,
            confidence: fields.confidence,
            text: fields.text,
            explanation: fields.explanation,
            image_preview_ref: fields.image_preview_ref,
            created_at,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn confidence(&self) -> Option<Confidence> {
        self.confidence
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn image_preview_ref(&self) -> Option<&PreviewRef> {
        self.image_preview_ref.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Logical path of an identity's history collection.
pub fn collection_path(namespace: &str, identity: &IdentityId) -> String {
    format!("artifacts/{}/users/{}/pest_predictions", namespace, identity)
}
