//! Shared application state and the bearer-session extractor.

use crate::auth::challenge::ChallengeService;
use crate::auth::verify::VerificationService;
use crate::config::Config;
use crate::error::AppError;
use crate::storage::{RateLimiter, SessionStore, UserDirectory};
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub challenges: ChallengeService,
    pub verifier: VerificationService,
    pub directory: Arc<dyn UserDirectory>,
    pub sessions: Arc<dyn SessionStore>,
    pub limiter: Arc<dyn RateLimiter>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire every collaborator to one backend.
    pub fn new<S>(store: Arc<S>, config: Config) -> Self
    where
        S: UserDirectory + SessionStore + RateLimiter + 'static,
    {
        let directory: Arc<dyn UserDirectory> = store.clone();
        let sessions: Arc<dyn SessionStore> = store.clone();
        let limiter: Arc<dyn RateLimiter> = store;
        let auth_config = Arc::new(config.auth_config());

        AppState {
            challenges: ChallengeService::new(directory.clone(), auth_config.clone()),
            verifier: VerificationService::new(directory.clone(), auth_config),
            directory,
            sessions,
            limiter,
            config: Arc::new(config),
        }
    }
}

/// Authenticated session extractor.
///
/// Extracts session from `Authorization: Bearer {token}` header.
/// Returns 401 Unauthorized if missing or invalid.
pub struct AuthSession {
    pub user_id: String,
    pub token: String,
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid authorization format".to_string()))?
            .to_string();

        let session = state
            .sessions
            .get_session(&token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired session".to_string()))?;

        Ok(AuthSession {
            user_id: session.user_id,
            token,
        })
    }
}
