//! API route handlers.

pub mod auth;

use crate::auth::middleware::AppState;
use crate::middleware::rate_limit_auth;
use axum::{middleware, routing::get, routing::post, Json, Router};
use serde_json::{json, Value};

/// GET /health — Liveness probe
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Build the API router with all endpoints.
///
/// Every `/api/auth/*` route sits behind the per-IP, per-route rate limiter.
pub fn api_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/nonce", get(auth::request_nonce))
        .route("/wallet", post(auth::wallet_login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth_routes)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::MemoryStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_config(rate_limit: u32) -> Config {
        Config {
            redis_url: "redis://unused".to_string(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            public_scheme: "http".to_string(),
            max_body_bytes: 65_536,
            cors_allowed_origins: Vec::new(),
            sign_in_statement: "Sign in to Spectra Market".to_string(),
            chain_id: 1,
            nonce_ttl_secs: 300,
            session_ttl_secs: 3600,
            rate_limit_auth_per_min: rate_limit,
        }
    }

    fn app(rate_limit: u32) -> Router {
        api_router(AppState::new(Arc::new(MemoryStore::new()), test_config(rate_limit)))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(30)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["ok"], true);
    }

    #[tokio::test]
    async fn test_nonce_uses_host_header() {
        let response = app(30)
            .oneshot(
                Request::builder()
                    .uri("/api/auth/nonce?address=0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")
                    .header("host", "market.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["domain"], "market.example");
        assert_eq!(body["uri"], "http://market.example");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("market.example wants you to sign in"));
    }

    #[tokio::test]
    async fn test_nonce_rejects_bad_address() {
        let response = app(30)
            .oneshot(
                Request::builder()
                    .uri("/api/auth/nonce?address=bob")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Invalid address");
    }

    #[tokio::test]
    async fn test_me_requires_bearer() {
        let response = app(30)
            .oneshot(Request::builder().uri("/api/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_rate_limit_applies_to_auth_routes() {
        let app = app(2);
        let request = || {
            Request::builder()
                .uri("/api/auth/me")
                .body(Body::empty())
                .unwrap()
        };

        for _ in 0..2 {
            let response = app.clone().oneshot(request()).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
        let response = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().get("retry-after").is_some());

        // Other auth routes keep their own budget
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/nonce?address=0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Health is not rate limited
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
