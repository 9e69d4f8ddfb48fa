//! Request and response models for the API.
//!
//! All models use serde for serialization/deserialization.
//! Storage models represent what the user directory and session store hold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Auth Models
// ============================================================================

/// Query for `GET /api/auth/nonce`.
#[derive(Debug, Deserialize)]
pub struct NonceQuery {
    #[serde(default)]
    pub address: String,
}

/// Challenge the client must sign.
#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub nonce: String, // hex
    pub statement: String,
    pub domain: String,
    pub uri: String,
    pub message: String,
}

/// Request to exchange a signed challenge for a session.
#[derive(Debug, Deserialize)]
pub struct WalletLoginRequest {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub signature: String, // 0x-prefixed hex, 65 bytes
}

/// Response after successful wallet sign-in.
#[derive(Debug, Serialize)]
pub struct WalletLoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// Public view of a user profile.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub wallet_address: String,
    pub created_at: u64,
}

impl From<StoredUser> for UserInfo {
    fn from(user: StoredUser) -> Self {
        UserInfo {
            id: user.id,
            username: user.username,
            wallet_address: user.wallet_address,
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Storage Models
// ============================================================================

/// User profile as stored in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: String,
    pub wallet_address: String,
    pub username: String,
    pub created_at: u64,
}

impl StoredUser {
    /// Profile provisioned on a wallet's first challenge.
    pub fn provisioned(id: String, wallet_address: &str, created_at: u64) -> Self {
        let digits = wallet_address.trim_start_matches("0x");
        let tag: String = digits.chars().take(6).collect();
        StoredUser {
            id,
            wallet_address: wallet_address.to_string(),
            username: format!("user_{}", tag),
            created_at,
        }
    }
}

/// The one live nonce of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceChallenge {
    pub nonce: String, // hex
    pub issued_at: DateTime<Utc>,
}

/// A live nonce together with the account that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNonce {
    pub user_id: String,
    pub challenge: NonceChallenge,
}

/// Session data as stored in the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub user_id: String,
    pub created_at: u64,
}

/// Current state of a fixed rate-limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    /// Requests seen in this window, including the current one.
    pub count: u32,
    /// Seconds until the window resets.
    pub resets_in_secs: u64,
}

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
