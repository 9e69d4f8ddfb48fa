//! Redis-backed implementation of the storage traits.

use crate::auth::address::WalletAddress;
use crate::models::{NonceChallenge, PendingNonce, RateWindow, StoredSession, StoredUser};
use crate::storage::{
    ratelimit, session, user, RateLimiter, SessionStore, StorageError, UserDirectory,
};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

/// Production store. Cloning shares the underlying multiplexed connection.
#[derive(Clone)]
pub struct RedisStore {
    con: MultiplexedConnection,
}

impl RedisStore {
    /// Open a multiplexed connection to `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(redis_url)?;
        let con = client.get_multiplexed_async_connection().await?;
        Ok(RedisStore { con })
    }

    fn connection(&self) -> MultiplexedConnection {
        self.con.clone()
    }
}

#[async_trait]
impl UserDirectory for RedisStore {
    async fn issue_nonce(
        &self,
        address: &WalletAddress,
        challenge: &NonceChallenge,
    ) -> Result<String, StorageError> {
        let mut con = self.connection();
        let created_at = challenge.issued_at.timestamp().max(0) as u64;
        let candidate =
            StoredUser::provisioned(nanoid::nanoid!(12), address.as_str(), created_at);

        let (user_id, created) =
            user::issue_nonce(&mut con, address.as_str(), &candidate, challenge).await?;

        if created {
            tracing::info!(action = "account_provisioned", user_id = %user_id, address = %address, "New wallet account");
        } else {
            // Repair accounts whose profile write was lost
            let profile = StoredUser::provisioned(user_id.clone(), address.as_str(), created_at);
            if user::store_user_if_absent(&mut con, &profile).await? {
                tracing::warn!(action = "profile_restored", user_id = %user_id, address = %address, "Re-created missing user profile");
            }
        }

        Ok(user_id)
    }

    async fn peek_nonce(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<PendingNonce>, StorageError> {
        let mut con = self.connection();
        user::peek_nonce(&mut con, address.as_str()).await
    }

    async fn consume_nonce(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<PendingNonce>, StorageError> {
        let mut con = self.connection();
        user::consume_nonce(&mut con, address.as_str()).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<StoredUser>, StorageError> {
        let mut con = self.connection();
        user::get_user(&mut con, id).await
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn store_session(
        &self,
        session: &StoredSession,
        ttl_secs: u64,
    ) -> Result<(), StorageError> {
        let mut con = self.connection();
        session::store_session(&mut con, session, ttl_secs).await
    }

    async fn get_session(&self, token: &str) -> Result<Option<StoredSession>, StorageError> {
        let mut con = self.connection();
        session::get_session(&mut con, token).await
    }

    async fn delete_session(&self, token: &str, user_id: &str) -> Result<bool, StorageError> {
        let mut con = self.connection();
        session::delete_session(&mut con, token, user_id).await
    }
}

#[async_trait]
impl RateLimiter for RedisStore {
    async fn hit(&self, key: &str, window_secs: u64) -> Result<RateWindow, StorageError> {
        let mut con = self.connection();
        ratelimit::hit_window(&mut con, key, window_secs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::generate_challenge_nonce;
    use chrono::{SubsecRound, Utc};
    use redis::AsyncCommands;

    // These tests require a running Redis instance.
    // Skip if REDIS_URL is not set and the default is unreachable.
    async fn test_store() -> Option<RedisStore> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        match RedisStore::connect(&redis_url).await {
            Ok(store) => Some(store),
            Err(_) => {
                eprintln!("Skipping test: Redis not available");
                None
            }
        }
    }

    fn random_address() -> WalletAddress {
        let mut bytes = [0u8; 20];
        rand::fill(&mut bytes);
        WalletAddress::from_bytes(&bytes)
    }

    fn fresh_challenge() -> NonceChallenge {
        NonceChallenge {
            nonce: generate_challenge_nonce(),
            issued_at: Utc::now().trunc_subsecs(3),
        }
    }

    async fn cleanup(store: &RedisStore, address: &WalletAddress, user_id: &str) {
        let mut con = store.connection();
        let _: Result<(), _> = con.del(format!("account:{}", address)).await;
        let _: Result<(), _> = con.del(format!("user:{}", user_id)).await;
    }

    #[tokio::test]
    async fn test_issue_provisions_account_once() {
        let Some(store) = test_store().await else {
            return;
        };
        let address = random_address();

        let first_id = store.issue_nonce(&address, &fresh_challenge()).await.unwrap();
        let second = fresh_challenge();
        let second_id = store.issue_nonce(&address, &second).await.unwrap();
        assert_eq!(first_id, second_id);

        let user = store.get_user(&first_id).await.unwrap().unwrap();
        assert_eq!(user.wallet_address, address.as_str());

        // Only the latest nonce is live
        let peeked = store.peek_nonce(&address).await.unwrap().unwrap();
        assert_eq!(peeked.challenge, second);

        cleanup(&store, &address, &first_id).await;
    }

    #[tokio::test]
    async fn test_issue_provisions_profile_with_account() {
        let Some(store) = test_store().await else {
            return;
        };
        let address = random_address();

        let user_id = store.issue_nonce(&address, &fresh_challenge()).await.unwrap();

        let mut con = store.connection();
        let stored: Option<String> = con.get(format!("user:{}", user_id)).await.unwrap();
        let user: StoredUser = serde_json::from_str(&stored.unwrap()).unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.wallet_address, address.as_str());

        cleanup(&store, &address, &user_id).await;
    }

    #[tokio::test]
    async fn test_account_without_profile_recovers_on_next_issue() {
        let Some(store) = test_store().await else {
            return;
        };
        let address = random_address();
        let orphan_id = format!("orphan{}", nanoid::nanoid!(6));

        // Account hash written, profile write lost
        let mut con = store.connection();
        let _: () = con
            .hset(format!("account:{}", address), "user_id", &orphan_id)
            .await
            .unwrap();
        assert!(store.get_user(&orphan_id).await.unwrap().is_none());

        let user_id = store.issue_nonce(&address, &fresh_challenge()).await.unwrap();
        assert_eq!(user_id, orphan_id);

        let user = store.get_user(&orphan_id).await.unwrap().unwrap();
        assert_eq!(user.wallet_address, address.as_str());

        cleanup(&store, &address, &orphan_id).await;
    }

    #[tokio::test]
    async fn test_consume_is_single_use() {
        let Some(store) = test_store().await else {
            return;
        };
        let address = random_address();
        let challenge = fresh_challenge();
        let user_id = store.issue_nonce(&address, &challenge).await.unwrap();

        let consumed = store.consume_nonce(&address).await.unwrap().unwrap();
        assert_eq!(consumed.user_id, user_id);
        assert_eq!(consumed.challenge, challenge);

        assert!(store.consume_nonce(&address).await.unwrap().is_none());
        assert!(store.peek_nonce(&address).await.unwrap().is_none());
        // Account survives consumption
        assert!(store.get_user(&user_id).await.unwrap().is_some());

        cleanup(&store, &address, &user_id).await;
    }

    #[tokio::test]
    async fn test_concurrent_consume_has_one_winner() {
        let Some(store) = test_store().await else {
            return;
        };
        let address = random_address();
        let user_id = store.issue_nonce(&address, &fresh_challenge()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let address = address.clone();
            handles.push(tokio::spawn(async move {
                store.consume_nonce(&address).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);

        cleanup(&store, &address, &user_id).await;
    }

    #[tokio::test]
    async fn test_rate_limit_window() {
        let Some(store) = test_store().await else {
            return;
        };
        let key = format!("ratelimit:test:{}", nanoid::nanoid!(8));

        for expected in 1..=3 {
            let window = store.hit(&key, 60).await.unwrap();
            assert_eq!(window.count, expected);
            assert!(window.resets_in_secs <= 60);
        }

        let mut con = store.connection();
        let _: Result<(), _> = con.del(&key).await;
    }
}
