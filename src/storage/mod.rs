//! Storage collaborators for accounts, nonces, sessions and rate limits.
//!
//! The auth core only talks to the traits below. `RedisStore` is the
//! production backend (command helpers live in `user`, `session` and
//! `ratelimit`, generic over `redis::AsyncCommands`); `MemoryStore` keeps
//! everything in process.

pub mod memory;
pub mod ratelimit;
pub mod redis_store;
pub mod session;
pub mod user;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use crate::auth::address::WalletAddress;
use crate::models::{NonceChallenge, PendingNonce, RateWindow, StoredSession, StoredUser};
use async_trait::async_trait;

/// Backend failure. Always transient from the caller's point of view.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Account directory keyed by normalized wallet address.
///
/// Each account holds at most one live nonce. `consume_nonce` must read and
/// clear it atomically: of two concurrent consumers for the same address,
/// exactly one observes the nonce.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find or create the account for `address` and make `challenge` its only
    /// live nonce, replacing any previous one. Returns the account id.
    async fn issue_nonce(
        &self,
        address: &WalletAddress,
        challenge: &NonceChallenge,
    ) -> Result<String, StorageError>;

    /// Read the live nonce without consuming it.
    async fn peek_nonce(&self, address: &WalletAddress)
        -> Result<Option<PendingNonce>, StorageError>;

    /// Atomically read and clear the live nonce.
    async fn consume_nonce(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<PendingNonce>, StorageError>;

    async fn get_user(&self, id: &str) -> Result<Option<StoredUser>, StorageError>;
}

/// Opaque bearer sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn store_session(&self, session: &StoredSession, ttl_secs: u64)
        -> Result<(), StorageError>;

    async fn get_session(&self, token: &str) -> Result<Option<StoredSession>, StorageError>;

    /// Returns true if the session existed.
    async fn delete_session(&self, token: &str, user_id: &str) -> Result<bool, StorageError>;
}

/// Fixed-window request counters.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request against `key` and report the window state.
    async fn hit(&self, key: &str, window_secs: u64) -> Result<RateWindow, StorageError>;
}
