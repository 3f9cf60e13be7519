//! SQLite storage for shared documents

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

use super::types::ShareRecord;

/// Repository for shared documents
pub struct ShareRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ShareRepository<'a> {
    /// Create a new repository
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the shares table
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS shares (
                code TEXT PRIMARY KEY,
                markdown TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_shares_expires ON shares(expires_at);
            "#,
        )
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Whether a live (unexpired) share holds `code`
    pub async fn exists(&self, code: &str, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.get(code, now).await?.is_some())
    }

    /// Store a share. Returns false if the code is already taken.
    pub async fn insert(&self, record: &ShareRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO shares (code, markdown, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(code) DO NOTHING
            "#,
        )
        .bind(&record.code)
        .bind(&record.markdown)
        .bind(timestamp(record.created_at))
        .bind(timestamp(record.expires_at))
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a share by code. Expired rows are deleted and reported as absent.
    pub async fn get(&self, code: &str, now: DateTime<Utc>) -> Result<Option<ShareRecord>> {
        let row = sqlx::query_as::<_, ShareRow>(
            r#"
            SELECT code, markdown, created_at, expires_at
            FROM shares
            WHERE code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        let Some(record) = row.map(|r| r.into_record()).transpose()? else {
            return Ok(None);
        };

        if record.is_expired(now) {
            tracing::debug!("Share {} expired at {}", record.code, record.expires_at);
            sqlx::query("DELETE FROM shares WHERE code = ?")
                .bind(code)
                .execute(self.pool)
                .await?;
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Delete every expired share
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM shares WHERE expires_at <= ?")
            .bind(timestamp(now))
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Fixed-width UTC RFC 3339, so stored timestamps order correctly as text
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Internal row type for SQLite queries
#[derive(sqlx::FromRow)]
struct ShareRow {
    code: String,
    markdown: String,
    created_at: String,
    expires_at: String,
}

impl ShareRow {
    fn into_record(self) -> Result<ShareRecord> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)?.with_timezone(&Utc);
        let expires_at = DateTime::parse_from_rfc3339(&self.expires_at)?.with_timezone(&Utc);

        Ok(ShareRecord {
            code: self.code,
            markdown: self.markdown,
            created_at,
            expires_at,
        })
    }
}
