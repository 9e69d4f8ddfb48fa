//! HTTP middleware: security headers, CORS policy and auth rate limiting.

use crate::auth::middleware::AppState;
use crate::config::Config;
use crate::error::AppError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Length of a rate-limit window in seconds.
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Middleware that adds security headers to all responses.
///
/// The API only serves JSON, so the policy is as tight as it gets:
///
/// - **Cache-Control: no-store** — challenges and session tokens must never
///   be cached by intermediaries.
/// - **Referrer-Policy: no-referrer**
/// - **X-Content-Type-Options: nosniff**
/// - **X-Frame-Options: DENY** and `frame-ancestors 'none'`
/// - **Content-Security-Policy: default-src 'none'** — nothing served here
///   is meant to load sub-resources.
///
/// # Usage
///
/// ```rust,no_run
/// use axum::Router;
/// use axum::middleware;
/// use walletgate::middleware::security_headers;
///
/// let app: Router = Router::new()
///     .layer(middleware::from_fn(security_headers));
/// ```
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    response
}

/// CORS policy from config.
///
/// With no allowed origins every cross-origin request is refused (the
/// sign-in page is expected on the same origin). Listed origins may call
/// the API with a bearer token.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Hash an IP for logging so raw client addresses never reach the logs.
fn ip_hash(ip: &str) -> String {
    let mut hasher = std::hash::DefaultHasher::new();
    ip.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// Fixed-window rate limit for the auth endpoints, per client IP and route.
///
/// Independent of nonce state: a throttled request never reaches the
/// challenge or verification services. Requests without connection info
/// (in-process tests) share the `unknown` bucket.
pub async fn rate_limit_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    // Route layers only run for matched routes, so the path set is bounded
    let key = format!("ratelimit:auth:{}:{}", ip, request.uri().path());
    let window = state.limiter.hit(&key, RATE_LIMIT_WINDOW_SECS).await?;

    if window.count > state.config.rate_limit_auth_per_min {
        tracing::warn!(action = "rate_limited", endpoint = %request.uri().path(), ip_hash = %ip_hash(&ip), "Rate limit exceeded");
        return Err(AppError::RateLimited {
            retry_after_secs: window.resets_in_secs.max(1),
        });
    }

    Ok(next.run(request).await)
}
