//! Route modules for the Marginalia server

pub mod health;
pub mod share;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let share = share::router(&state.config().share);

    Router::new()
        .nest("/health", health::router())
        .nest("/api/v1/health", health::router())
        .nest("/api/share", share)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;

    async fn test_app() -> Router {
        let pool = crate::db::memory_pool().await.unwrap();
        let mut config = Config::default();
        config.share.frontend_url = "https://notes.example".to_string();
        app(AppState::new(config, pool))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_share(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/share")
            .header("content-type", "text/plain")
            .body(body.into())
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_routes() {
        let app = test_app().await;

        for uri in ["/health", "/api/v1/health"] {
            let (status, body) = send(&app, get(uri)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "healthy");
            assert_eq!(body["service"], "marginalia");
        }
    }

    #[tokio::test]
    async fn test_share_round_trip() {
        let app = test_app().await;

        let (status, created) = send(&app, post_share("# Notes\n\nShip it.")).await;
        assert_eq!(status, StatusCode::CREATED);
        let code = created["code"].as_str().unwrap().to_string();
        assert_eq!(
            created["url"],
            format!("https://notes.example?c={}", code)
        );
        assert!(created["expiresAt"].is_string());

        let uri = format!("/api/share/{}", code.to_lowercase());
        let (status, fetched) = send(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["markdown"], "# Notes\n\nShip it.");
        assert!(fetched["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_body_limit_follows_config() {
        let pool = crate::db::memory_pool().await.unwrap();
        let mut config = Config::default();
        config.share.max_bytes = 3 * 1024 * 1024;
        let app = app(AppState::new(config, pool));

        // Above axum's default 2 MiB limit but within the configured one
        let (status, _) = send(&app, post_share("x".repeat(5 * 1024 * 512))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_share_errors() {
        let app = test_app().await;

        let (status, body) = send(&app, post_share("  \n\t")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
        assert!(body["message"].is_string());

        let (status, body) = send(&app, post_share("x".repeat(500 * 1024 + 1))).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "content_too_large");

        // Past the body limit as well as the share limit
        let (status, body) = send(&app, post_share("x".repeat(3 * 1024 * 1024))).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "content_too_large");
        assert!(body["message"].as_str().unwrap().contains("500KB"));

        let (status, body) = send(&app, post_share(vec![0xffu8, 0xfe])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");

        let (status, body) = send(&app, get("/api/share/AB0DEF")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_code");

        let (status, body) = send(&app, get("/api/share/ABCDEF")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }
}
