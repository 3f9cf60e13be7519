//! Error types for the Marginalia server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Content too large: {0}")]
    ContentTooLarge(String),

    #[error("Invalid code: {0}")]
    InvalidCode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] anyhow::Error),
}

impl AppError {
    /// Wire error code, shared with the share client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::ContentTooLarge(_) => "content_too_large",
            AppError::InvalidCode(_) => "invalid_code",
            AppError::NotFound(_) => "not_found",
            AppError::Server(_)
            | AppError::Database(_)
            | AppError::Repository(_) => "server_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) | AppError::InvalidCode(_) => StatusCode::BAD_REQUEST,
            AppError::ContentTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Server(_)
            | AppError::Database(_)
            | AppError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::InvalidRequest(msg)
            | AppError::ContentTooLarge(msg)
            | AppError::InvalidCode(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::Server(msg) => {
                tracing::error!("Server error: {}", msg);
                msg.clone()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            AppError::Repository(e) => {
                tracing::error!("Repository error: {:#}", e);
                "An internal error occurred".to_string()
            }
        };

        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.code().to_string(),
            message,
            details: if cfg!(debug_assertions) && status.is_server_error() {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST, "invalid_request"),
            (AppError::ContentTooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE, "content_too_large"),
            (AppError::InvalidCode("x".into()), StatusCode::BAD_REQUEST, "invalid_code"),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "not_found"),
            (AppError::Server("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
        ];

        for (error, status, code) in cases {
            assert_eq!(error.status(), status);
            assert_eq!(error.code(), code);
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_internal_errors_hide_details_behind_server_error() {
        let from_db: AppError = sqlx::Error::RowNotFound.into();
        let from_repo: AppError = anyhow::anyhow!("bad timestamp").into();

        for error in [from_db, from_repo] {
            assert_eq!(error.code(), "server_error");
            assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
