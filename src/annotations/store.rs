//! SQLite storage for annotation sets
//!
//! A small key-value table standing in for browser local storage. Values
//! are JSON in the same shape clients write, so sets can move between the
//! two without conversion.

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

use super::storage_key::{StorageKey, SESSION_KEY};
use super::types::{Annotation, SessionSnapshot};

/// Repository for locally persisted annotation state
pub struct LocalStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LocalStore<'a> {
    /// Create a new repository
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the local entries table
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS local_entries (
                storage_key TEXT PRIMARY KEY,
                value_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Load the annotation set for a document. Missing or unreadable
    /// entries load as an empty set.
    pub async fn load_annotations(&self, key: &StorageKey) -> Result<Vec<Annotation>> {
        let Some(value) = self.get_raw(key.as_str()).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&value) {
            Ok(annotations) => Ok(annotations),
            Err(e) => {
                tracing::warn!("Failed to parse stored annotations under {}: {}", key, e);
                Ok(Vec::new())
            }
        }
    }

    /// Replace the annotation set for a document
    pub async fn save_annotations(&self, key: &StorageKey, annotations: &[Annotation]) -> Result<()> {
        let value = serde_json::to_string(annotations)?;
        self.put_raw(key.as_str(), &value).await
    }

    /// Remove a document's annotation set
    pub async fn remove(&self, key: &StorageKey) -> Result<bool> {
        self.delete_raw(key.as_str()).await
    }

    /// Load the last session, ignoring entries without markdown
    pub async fn load_session(&self) -> Result<Option<SessionSnapshot>> {
        let Some(value) = self.get_raw(SESSION_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<SessionSnapshot>(&value) {
            Ok(snapshot) if !snapshot.markdown.is_empty() => Ok(Some(snapshot)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::warn!("Failed to read session snapshot: {}", e);
                Ok(None)
            }
        }
    }

    /// Save the current session
    pub async fn save_session(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let value = serde_json::to_string(snapshot)?;
        self.put_raw(SESSION_KEY, &value).await
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value_json FROM local_entries WHERE storage_key = ?")
                .bind(key)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(|r| r.0))
    }

    async fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO local_entries (storage_key, value_json, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(storage_key) DO UPDATE SET
                value_json = excluded.value_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    async fn delete_raw(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM local_entries WHERE storage_key = ?")
            .bind(key)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
