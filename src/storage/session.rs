//! Bearer session Redis operations.
//!
//! Redis key patterns:
//! - `session:{token}` — `StoredSession` JSON, expires with the session
//! - `user_sessions:{user_id}` — SET of the account's live tokens
//!
//! Writes touching both keys go through a MULTI/EXEC pipeline so the index
//! never names a token whose session write failed. Session JSON read back
//! from Redis carries the bearer token and is held in a `Zeroizing` buffer.

use crate::models::StoredSession;
use crate::storage::StorageError;
use redis::AsyncCommands;
use zeroize::Zeroizing;

fn session_key(token: &str) -> String {
    format!("session:{}", token)
}

fn user_sessions_key(user_id: &str) -> String {
    format!("user_sessions:{}", user_id)
}

/// Persist a freshly issued session for `ttl_secs` and index it under its
/// account. The index lives at least as long as the newest session.
pub async fn store_session<C>(
    con: &mut C,
    session: &StoredSession,
    ttl_secs: u64,
) -> Result<(), StorageError>
where
    C: AsyncCommands,
{
    let json = Zeroizing::new(serde_json::to_string(session)?);
    let index = user_sessions_key(&session.user_id);

    let _: () = redis::pipe()
        .atomic()
        .set_ex(session_key(&session.token), json.as_str(), ttl_secs)
        .ignore()
        .sadd(&index, &session.token)
        .ignore()
        .expire(&index, ttl_secs as i64)
        .ignore()
        .query_async(con)
        .await?;

    Ok(())
}

/// Resolve a bearer token. Expired tokens are gone from Redis and read as
/// `None`.
pub async fn get_session<C>(
    con: &mut C,
    token: &str,
) -> Result<Option<StoredSession>, StorageError>
where
    C: AsyncCommands,
{
    let json: Option<String> = con.get(session_key(token)).await?;

    json.map(|data| {
        let data = Zeroizing::new(data);
        serde_json::from_str(&data).map_err(StorageError::from)
    })
    .transpose()
}

/// Revoke one session (logout). Returns true if it was still live.
pub async fn delete_session<C>(
    con: &mut C,
    token: &str,
    user_id: &str,
) -> Result<bool, StorageError>
where
    C: AsyncCommands,
{
    let (deleted, _): (i64, i64) = redis::pipe()
        .atomic()
        .del(session_key(token))
        .srem(user_sessions_key(user_id), token)
        .query_async(con)
        .await?;

    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(session_key("abc+/="), "session:abc+/=");
        assert_eq!(user_sessions_key("V1StGXR8_Z5j"), "user_sessions:V1StGXR8_Z5j");
    }
}
