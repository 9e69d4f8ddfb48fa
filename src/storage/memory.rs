//! In-process implementation of the storage traits.
//!
//! One mutex guards all state, so `consume_nonce` is trivially atomic.
//! Expired sessions and rate windows are dropped when next touched.

use crate::auth::address::WalletAddress;
use crate::models::{NonceChallenge, PendingNonce, RateWindow, StoredSession, StoredUser};
use crate::storage::{RateLimiter, SessionStore, StorageError, UserDirectory};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

struct Account {
    user_id: String,
    nonce: Option<NonceChallenge>,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    users: HashMap<String, StoredUser>,
    sessions: HashMap<String, (StoredSession, Instant)>,
    windows: HashMap<String, (u32, Instant)>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Poisoning is ignored: every critical section is a single map update
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn issue_nonce(
        &self,
        address: &WalletAddress,
        challenge: &NonceChallenge,
    ) -> Result<String, StorageError> {
        let mut inner = self.lock();
        let Inner {
            accounts, users, ..
        } = &mut *inner;

        let account = accounts.entry(address.as_str().to_string()).or_insert_with(|| {
            let user_id = nanoid::nanoid!(12);
            let profile = StoredUser::provisioned(
                user_id.clone(),
                address.as_str(),
                challenge.issued_at.timestamp().max(0) as u64,
            );
            users.insert(user_id.clone(), profile);
            tracing::info!(action = "account_provisioned", user_id = %user_id, address = %address, "New wallet account");
            Account {
                user_id,
                nonce: None,
            }
        });

        account.nonce = Some(challenge.clone());
        Ok(account.user_id.clone())
    }

    async fn peek_nonce(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<PendingNonce>, StorageError> {
        let inner = self.lock();
        Ok(inner.accounts.get(address.as_str()).and_then(|account| {
            account.nonce.clone().map(|challenge| PendingNonce {
                user_id: account.user_id.clone(),
                challenge,
            })
        }))
    }

    async fn consume_nonce(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<PendingNonce>, StorageError> {
        let mut inner = self.lock();
        Ok(inner.accounts.get_mut(address.as_str()).and_then(|account| {
            account.nonce.take().map(|challenge| PendingNonce {
                user_id: account.user_id.clone(),
                challenge,
            })
        }))
    }

    async fn get_user(&self, id: &str) -> Result<Option<StoredUser>, StorageError> {
        Ok(self.lock().users.get(id).cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn store_session(
        &self,
        session: &StoredSession,
        ttl_secs: u64,
    ) -> Result<(), StorageError> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_secs);
        self.lock()
            .sessions
            .insert(session.token.clone(), (session.clone(), expires_at));
        Ok(())
    }

    async fn get_session(&self, token: &str) -> Result<Option<StoredSession>, StorageError> {
        let mut inner = self.lock();
        match inner.sessions.get(token) {
            Some((session, expires_at)) if *expires_at > Instant::now() => {
                Ok(Some(session.clone()))
            }
            Some(_) => {
                inner.sessions.remove(token);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete_session(&self, token: &str, _user_id: &str) -> Result<bool, StorageError> {
        Ok(self.lock().sessions.remove(token).is_some())
    }
}

#[async_trait]
impl RateLimiter for MemoryStore {
    async fn hit(&self, key: &str, window_secs: u64) -> Result<RateWindow, StorageError> {
        let now = Instant::now();
        let mut inner = self.lock();

        let entry = inner
            .windows
            .entry(key.to_string())
            .or_insert((0, now + Duration::from_secs(window_secs)));
        if entry.1 <= now {
            *entry = (0, now + Duration::from_secs(window_secs));
        }
        entry.0 = entry.0.saturating_add(1);

        let remaining = entry.1.saturating_duration_since(now);
        Ok(RateWindow {
            count: entry.0,
            resets_in_secs: remaining.as_secs_f64().ceil() as u64,
        })
    }
}
