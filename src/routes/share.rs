//! Share API routes

use axum::{
    extract::{
        rejection::{FailedToBufferBody, StringRejection},
        DefaultBodyLimit, Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::ShareConfig;
use crate::error::{AppError, Result};
use crate::share::{CreateShareResponse, GetShareResponse, ShareService};
use crate::state::AppState;

/// Create the share router. Request bodies are capped at the share size
/// limit; anything longer is answered as `content_too_large`.
pub fn router(config: &ShareConfig) -> Router<AppState> {
    Router::new()
        .route("/", post(create_share))
        .route("/:code", get(get_share))
        .layer(DefaultBodyLimit::max(config.max_bytes))
}

/// Store a raw markdown body under a new code
async fn create_share(
    State(state): State<AppState>,
    body: std::result::Result<String, StringRejection>,
) -> Result<(StatusCode, Json<CreateShareResponse>)> {
    let body = body.map_err(|rejection| body_error(rejection, &state.config().share))?;
    let service = ShareService::new(state.db(), &state.config().share);
    let mut rng = StdRng::from_entropy();
    let created = service.create(body, &mut rng, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Fetch a shared document
async fn get_share(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<GetShareResponse>> {
    let service = ShareService::new(state.db(), &state.config().share);
    let share = service.get(&code, Utc::now()).await?;
    Ok(Json(share))
}

fn body_error(rejection: StringRejection, config: &ShareConfig) -> AppError {
    match rejection {
        StringRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
            AppError::ContentTooLarge(format!(
                "Markdown content exceeds {}KB limit",
                config.max_bytes / 1024
            ))
        }
        other => AppError::InvalidRequest(other.body_text()),
    }
}
