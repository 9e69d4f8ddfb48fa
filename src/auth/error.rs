//! Wallet sign-in error taxonomy.

use crate::auth::recover::RecoveryError;
use crate::storage::StorageError;

/// Why a challenge could not be issued or a signature was rejected.
///
/// Every variant except `Storage` is a client fault: the attempt is
/// rejected and the client has to request a fresh challenge. `Storage`
/// is a transient service failure the caller may retry.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid address")]
    InvalidAddress,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("No pending challenge for address")]
    NoPendingChallenge,

    #[error("Challenge expired, request a new one")]
    ChallengeExpired,

    #[error("Signature recovery failed: {0}")]
    RecoveryFailed(#[from] RecoveryError),

    #[error("Signature does not match address")]
    SignatureMismatch,

    #[error("Storage unavailable: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Short machine-friendly label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidAddress => "invalid_address",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::NoPendingChallenge => "no_pending_challenge",
            AuthError::ChallengeExpired => "challenge_expired",
            AuthError::RecoveryFailed(_) => "recovery_failed",
            AuthError::SignatureMismatch => "signature_mismatch",
            AuthError::Storage(_) => "storage",
        }
    }
}
