//! Auth API endpoints.

use crate::auth::middleware::{AppState, AuthSession};
use crate::auth::session::generate_session_token;
use crate::error::AppError;
use crate::models::{
    unix_now, ChallengeResponse, NonceQuery, StoredSession, UserInfo, WalletLoginRequest,
    WalletLoginResponse,
};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

/// Domain and origin URI the client is signing for.
///
/// The domain is the `Host` the request arrived on; the URI is that host
/// under the configured public scheme. Both are recomputed identically at
/// verification, so a signature obtained for another site fails there.
fn request_origin(headers: &HeaderMap, scheme: &str) -> (String, String) {
    let domain = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .unwrap_or("localhost")
        .to_string();
    let uri = format!("{}://{}", scheme, domain);
    (domain, uri)
}

/// GET /api/auth/nonce?address=0x.. — Issue a sign-in challenge
pub async fn request_nonce(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NonceQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (domain, uri) = request_origin(&headers, &state.config.public_scheme);

    let issued = state
        .challenges
        .issue_challenge(&query.address, &domain, &uri)
        .await?;

    Ok(Json(ChallengeResponse {
        nonce: issued.nonce,
        statement: issued.statement,
        domain: issued.domain,
        uri: issued.uri,
        message: issued.message,
    }))
}

/// POST /api/auth/wallet — Verify a signed challenge and create a session
pub async fn wallet_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<WalletLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (domain, uri) = request_origin(&headers, &state.config.public_scheme);

    let identity = state
        .verifier
        .verify(&req.address, &req.signature, &domain, &uri)
        .await?;

    let user = state
        .directory
        .get_user(&identity.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!("Account {} has no user profile", identity.user_id))
        })?;

    let token = generate_session_token();
    let session = StoredSession {
        token: token.clone(),
        user_id: identity.user_id.clone(),
        created_at: unix_now(),
    };
    state
        .sessions
        .store_session(&session, state.config.session_ttl_secs)
        .await?;

    tracing::info!(action = "auth_success", user_id = %identity.user_id, address = %identity.address, "Wallet authenticated");

    Ok(Json(WalletLoginResponse {
        token,
        user: UserInfo::from(user),
    }))
}

/// GET /api/auth/me — Current user profile
pub async fn me(
    session: AuthSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .directory
        .get_user(&session.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;

    Ok(Json(UserInfo::from(user)))
}

/// POST /api/auth/logout — Invalidate current session
pub async fn logout(
    session: AuthSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    state
        .sessions
        .delete_session(&session.token, &session.user_id)
        .await?;

    tracing::info!(action = "logout", user_id = %session.user_id, "User logged out");

    Ok(StatusCode::NO_CONTENT)
}
