//! Annotation types
//!
//! The JSON shape matches what browser clients already keep in local
//! storage: camelCase keys, epoch-millisecond timestamps, optional range.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::TextRange;

/// A positional comment on the flattened document text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Unique identifier (UUID)
    pub id: String,
    /// The quoted span at creation time
    pub selected_text: String,
    /// Free-form comment; the only field edited after creation
    pub comment: String,
    /// Creation instant
    #[serde(with = "chrono::serde::ts_milliseconds", default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Interval captured at creation time. Never rewritten, even after drift.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<TextRange>,
}

impl Annotation {
    /// Create a new annotation with a fresh id
    pub fn new(selected_text: &str, comment: &str, range: Option<TextRange>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            selected_text: selected_text.to_string(),
            comment: comment.to_string(),
            timestamp: Utc::now(),
            range,
        }
    }

    /// Copy with a replaced comment
    pub fn with_comment(&self, comment: &str) -> Self {
        Self {
            comment: comment.to_string(),
            ..self.clone()
        }
    }
}

/// Which screen the user was on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Annotate,
    #[default]
    #[serde(other)]
    Input,
}

/// Last working document, restored on the next visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub markdown: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_code: Option<String>,
    #[serde(default)]
    pub view: View,
}
