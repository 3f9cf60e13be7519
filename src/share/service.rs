//! Share creation and lookup
//!
//! Holds the request validation rules; the HTTP layer only extracts and
//! serializes.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::SqlitePool;

use super::codes::{generate_code, is_valid_code, normalize_code};
use super::store::ShareRepository;
use super::types::{CreateShareResponse, GetShareResponse, ShareRecord};
use crate::config::ShareConfig;
use crate::error::{AppError, Result};

/// Share operations over one pool and configuration
pub struct ShareService<'a> {
    pool: &'a SqlitePool,
    config: &'a ShareConfig,
}

impl<'a> ShareService<'a> {
    pub fn new(pool: &'a SqlitePool, config: &'a ShareConfig) -> Self {
        Self { pool, config }
    }

    /// Store `markdown` under a fresh code
    pub async fn create<R: Rng + ?Sized>(
        &self,
        markdown: String,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<CreateShareResponse> {
        if markdown.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "Request body must contain markdown".to_string(),
            ));
        }

        if markdown.len() > self.config.max_bytes {
            return Err(AppError::ContentTooLarge(format!(
                "Markdown content exceeds {}KB limit",
                self.config.max_bytes / 1024
            )));
        }

        let repo = ShareRepository::new(self.pool);
        let record = ShareRecord {
            code: String::new(),
            markdown,
            created_at: now,
            expires_at: now + Duration::days(self.config.ttl_days),
        };

        for attempt in 1..=self.config.code_attempts {
            let code = generate_code(rng);
            if repo.exists(&code, now).await? {
                tracing::debug!("Share code collision on attempt {}: {}", attempt, code);
                continue;
            }

            let record = ShareRecord {
                code: code.clone(),
                ..record.clone()
            };
            if !repo.insert(&record).await? {
                tracing::debug!("Share code taken during insert: {}", code);
                continue;
            }

            tracing::info!("Created share {} ({} bytes)", code, record.markdown.len());
            return Ok(CreateShareResponse {
                url: format!("{}?c={}", self.config.frontend_url, code),
                code,
                expires_at: record.expires_at,
            });
        }

        Err(AppError::Server("Failed to generate unique code".to_string()))
    }

    /// Look up a share by a user-entered code
    pub async fn get(&self, raw_code: &str, now: DateTime<Utc>) -> Result<GetShareResponse> {
        let code = normalize_code(raw_code);
        if !is_valid_code(&code) {
            return Err(AppError::InvalidCode(
                "Share code must be 6 characters from [2-9A-HJKMNP-Z]".to_string(),
            ));
        }

        ShareRepository::new(self.pool)
            .get(&code, now)
            .await?
            .map(GetShareResponse::from)
            .ok_or_else(|| AppError::NotFound("Share code not found".to_string()))
    }
}
