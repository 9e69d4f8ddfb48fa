//! Walletgate application entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Connect to Redis
//! 3. Build router with API routes
//! 4. Apply body limit, CORS and security headers
//! 5. Start Axum server

use std::net::SocketAddr;
use std::sync::Arc;
use walletgate::{
    auth::middleware::AppState,
    config::Config,
    middleware::{cors_layer, security_headers},
    routes,
    storage::RedisStore,
};

#[tokio::main]
async fn main() {
    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config from environment
    let config = Config::from_env().expect("Failed to load config");
    tracing::info!("Starting walletgate on {}", config.bind_addr);

    // Connect to Redis
    let store = RedisStore::connect(&config.redis_url)
        .await
        .expect("Failed to connect to Redis");

    let state = AppState::new(Arc::new(store), config.clone());

    let app = routes::api_router(state)
        .layer(axum::extract::DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config))
        .layer(axum::middleware::from_fn(security_headers));

    // Bind to configured address
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", config.bind_addr);

    // Start server (with_connect_info required for the per-IP rate limiter)
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
