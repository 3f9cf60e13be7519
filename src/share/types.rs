//! Share API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored shared document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRecord {
    pub code: String,
    pub markdown: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ShareRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Response to a successful share creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareResponse {
    pub code: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Response to a successful share lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetShareResponse {
    pub markdown: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<ShareRecord> for GetShareResponse {
    fn from(record: ShareRecord) -> Self {
        Self {
            markdown: record.markdown,
            created_at: record.created_at,
            expires_at: record.expires_at,
        }
    }
}
