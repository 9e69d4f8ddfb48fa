//! Error types and Axum response conversions.

use crate::auth::error::AuthError;
use crate::storage::StorageError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application error types.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited")]
    RateLimited { retry_after_secs: u64 },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Internal(msg) => {
                // Log detailed error server-side, return generic message to client
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Unavailable(msg) => {
                tracing::error!(error = %msg, "Storage unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests. Please try again later.".to_string(),
            ),
        };

        let body = Json(json!({
            "error": message
        }));

        let mut response = (status, body).into_response();
        if let AppError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Unavailable(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidAddress | AuthError::InvalidSignature => {
                AppError::BadRequest(err.to_string())
            }
            // Recovery details stay in the server log
            AuthError::RecoveryFailed(_) => AppError::Unauthorized("Invalid signature".to_string()),
            AuthError::NoPendingChallenge
            | AuthError::ChallengeExpired
            | AuthError::SignatureMismatch => AppError::Unauthorized(err.to_string()),
            AuthError::Storage(inner) => AppError::from(inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::recover::RecoveryError;
    use axum::http::StatusCode;

    /// Extract status code and JSON body from an AppError response.
    async fn error_response(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn test_internal_hides_details() {
        let (status, body) = error_response(AppError::Internal(
            "user record missing for id abc123".to_string(),
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert!(!body["error"].as_str().unwrap().contains("abc123"));
    }

    #[tokio::test]
    async fn test_storage_failure_is_503_without_details() {
        let storage_err = StorageError::from(redis::RedisError::from((
            redis::ErrorKind::IoError,
            "connection refused",
            "10.0.0.5:6379".to_string(),
        )));
        let (status, body) = error_response(AppError::from(AuthError::from(storage_err))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body["error"].as_str().unwrap().contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_format_errors_are_400() {
        let (status, body) = error_response(AppError::from(AuthError::InvalidAddress)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid address");

        let (status, _) = error_response(AppError::from(AuthError::InvalidSignature)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejections_are_401() {
        for err in [
            AuthError::NoPendingChallenge,
            AuthError::ChallengeExpired,
            AuthError::SignatureMismatch,
            AuthError::RecoveryFailed(RecoveryError::Malformed("r is zero".to_string())),
        ] {
            let (status, body) = error_response(AppError::from(err)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert!(!body["error"].as_str().unwrap().contains("r is zero"));
        }
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited {
            retry_after_secs: 42,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("retry-after").unwrap(), "42");
    }
}
