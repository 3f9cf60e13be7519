//! Share service client
//!
//! Talks to the share backend and turns failures into user-facing messages
//! that depend on whether the user was creating or loading a share.
//! Nothing is retried automatically.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use thiserror::Error;

use super::codes::normalize_code;
use super::types::CreateShareResponse;

/// What the user was doing when the request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareContext {
    Create,
    Load,
}

/// A share request failure with a message fit for display
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ShareError {
    /// Wire error code, or `network` / `unknown`
    pub code: String,
    pub message: String,
}

impl ShareError {
    pub fn new(code: &str, context: Option<ShareContext>) -> Self {
        Self {
            code: code.to_string(),
            message: error_message(code, context).to_string(),
        }
    }

    pub fn network(context: ShareContext) -> Self {
        Self::new("network", Some(context))
    }

    /// Interpret an error response body and status
    pub fn from_response(body: Option<&ErrorBody>, status: u16, context: ShareContext) -> Self {
        if let Some(code) = body.and_then(|b| b.error.as_deref().or(b.code.as_deref())) {
            return Self::new(code, Some(context));
        }
        if status >= 500 {
            return Self::new("server_error", Some(context));
        }
        Self::new("unknown", Some(context))
    }
}

/// User-facing text for an error code
pub fn error_message(code: &str, context: Option<ShareContext>) -> &'static str {
    let contextual = match (context, code) {
        (Some(ShareContext::Create), "invalid_request") => {
            Some("Add some markdown before creating a share.")
        }
        (Some(ShareContext::Create), "content_too_large") => Some(
            "This document is too large to share (max 500KB). Try trimming it or use a Share URL instead.",
        ),
        (Some(ShareContext::Create), "server_error") => {
            Some("The share service had a problem creating your code. Please try again.")
        }
        (Some(ShareContext::Load), "invalid_code") => {
            Some("That share code looks invalid. Use a 6-character code like X7KM3P.")
        }
        (Some(ShareContext::Load), "not_found") => {
            Some("We couldn't find that share code. It may have expired after 7 days.")
        }
        (Some(ShareContext::Load), "server_error") => {
            Some("The share service is having trouble loading that code. Please try again.")
        }
        _ => None,
    };

    contextual.unwrap_or(match code {
        "network" => "Network error. Check your connection and try again.",
        "server_error" => "The share service is having trouble. Please try again.",
        _ => "Something went wrong. Please try again.",
    })
}

/// Error body as returned by the share backend
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub code: Option<String>,
}

/// A document loaded from a share code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedDocument {
    pub markdown: String,
    /// Canonical (uppercase) share code
    pub share_code: String,
}

#[derive(Deserialize)]
struct FetchBody {
    markdown: Option<String>,
}

/// HTTP client for the share backend
#[derive(Clone)]
pub struct ShareClient {
    http: reqwest::Client,
    base_url: String,
}

impl ShareClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Upload a document and get its share code
    pub async fn create(&self, markdown: &str) -> Result<CreateShareResponse, ShareError> {
        let response = self
            .http
            .post(format!("{}/api/share", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(markdown.to_string())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Share create request failed: {}", e);
                ShareError::network(ShareContext::Create)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ErrorBody>().await.ok();
            return Err(ShareError::from_response(
                body.as_ref(),
                status.as_u16(),
                ShareContext::Create,
            ));
        }

        response
            .json::<CreateShareResponse>()
            .await
            .map_err(|_| ShareError::new("server_error", Some(ShareContext::Create)))
    }

    /// Fetch a shared document by code
    pub async fn fetch(&self, code: &str) -> Result<SharedDocument, ShareError> {
        let response = self
            .http
            .get(format!(
                "{}/api/share/{}",
                self.base_url,
                urlencoding::encode(code.trim())
            ))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Share fetch request failed: {}", e);
                ShareError::network(ShareContext::Load)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ErrorBody>().await.ok();
            return Err(ShareError::from_response(
                body.as_ref(),
                status.as_u16(),
                ShareContext::Load,
            ));
        }

        let body = response.json::<FetchBody>().await.ok();
        match body.and_then(|b| b.markdown) {
            Some(markdown) => Ok(SharedDocument {
                markdown,
                share_code: normalize_code(code),
            }),
            None => Err(ShareError {
                code: "server_error".to_string(),
                message: "Unexpected response from share service.".to_string(),
            }),
        }
    }
}

/// Outcome of a load that may have been overtaken by a newer one
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(SharedDocument),
    Failed(ShareError),
    /// A newer load started before this one resolved; ignore it
    Superseded,
}

/// Latest-request-wins loader for shared documents.
///
/// There is no cancellation: an older request runs to completion and its
/// result is discarded.
pub struct SharedDocumentLoader {
    client: ShareClient,
    generation: AtomicU64,
}

impl SharedDocumentLoader {
    pub fn new(client: ShareClient) -> Self {
        Self {
            client,
            generation: AtomicU64::new(0),
        }
    }

    pub async fn load(&self, code: &str) -> LoadOutcome {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.client.fetch(code).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            tracing::debug!("Discarding superseded share load for {}", code);
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(document) => LoadOutcome::Loaded(document),
            Err(e) => LoadOutcome::Failed(e),
        }
    }
}
