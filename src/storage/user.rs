//! Account, nonce and user profile Redis operations.
//!
//! Redis key patterns:
//! - `account:{address}` — HASH with `user_id`, `nonce`, `issued_at`
//! - `user:{id}` — user profile (JSON)
//!
//! The nonce lives on the account hash so that issuing and consuming it are
//! single-key Lua scripts, atomic with respect to each other.
//!
//! ## Security: Zeroizing Sensitive Data
//!
//! Nonce values read back from Redis are held in `Zeroizing` buffers until
//! they are copied into the returned challenge.

use crate::auth::message::format_issued_at;
use crate::models::{NonceChallenge, PendingNonce, StoredUser};
use crate::storage::StorageError;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use zeroize::Zeroizing;

fn account_key(address: &str) -> String {
    format!("account:{}", address)
}

fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

/// Provision-or-update the account and set its live nonce in one step.
///
/// `candidate` is only used when the account does not exist yet: the account
/// hash and the candidate's `user:{id}` profile are then written by the same
/// script, so a new account never exists without its profile.
/// Returns the account's user id (the existing one, or the candidate's) and
/// whether the account was created by this call.
pub async fn issue_nonce<C>(
    con: &mut C,
    address: &str,
    candidate: &StoredUser,
    challenge: &NonceChallenge,
) -> Result<(String, bool), StorageError>
where
    C: AsyncCommands,
{
    let script = redis::Script::new(
        r"
        local created = redis.call('HSETNX', KEYS[1], 'user_id', ARGV[1])
        if created == 1 then
            redis.call('SET', KEYS[2], ARGV[4], 'NX')
        end
        redis.call('HSET', KEYS[1], 'nonce', ARGV[2], 'issued_at', ARGV[3])
        return {redis.call('HGET', KEYS[1], 'user_id'), created}
        ",
    );

    let profile = serde_json::to_string(candidate)?;
    let (user_id, created): (String, i64) = script
        .key(account_key(address))
        .key(user_key(&candidate.id))
        .arg(&candidate.id)
        .arg(&challenge.nonce)
        .arg(format_issued_at(&challenge.issued_at))
        .arg(profile)
        .invoke_async(con)
        .await?;

    Ok((user_id, created == 1))
}

/// Read the live nonce without clearing it.
pub async fn peek_nonce<C>(con: &mut C, address: &str) -> Result<Option<PendingNonce>, StorageError>
where
    C: AsyncCommands,
{
    let fields: (Option<String>, Option<String>, Option<String>) = redis::cmd("HMGET")
        .arg(account_key(address))
        .arg("user_id")
        .arg("nonce")
        .arg("issued_at")
        .query_async(con)
        .await?;

    pending_from_fields(fields)
}

/// Read and clear the live nonce atomically (single-use).
///
/// Uses a Lua script so that two concurrent consumers cannot both observe
/// the same nonce. The account itself is kept.
pub async fn consume_nonce<C>(
    con: &mut C,
    address: &str,
) -> Result<Option<PendingNonce>, StorageError>
where
    C: AsyncCommands,
{
    let script = redis::Script::new(
        r"
        local v = redis.call('HMGET', KEYS[1], 'user_id', 'nonce', 'issued_at')
        if v[2] then
            redis.call('HDEL', KEYS[1], 'nonce', 'issued_at')
        end
        return v
        ",
    );

    let fields: (Option<String>, Option<String>, Option<String>) =
        script.key(account_key(address)).invoke_async(con).await?;

    pending_from_fields(fields)
}

fn pending_from_fields(
    fields: (Option<String>, Option<String>, Option<String>),
) -> Result<Option<PendingNonce>, StorageError> {
    let (user_id, nonce, issued_at) = fields;
    let (user_id, nonce, issued_at) = match (user_id, nonce, issued_at) {
        (Some(u), Some(n), Some(t)) => (u, Zeroizing::new(n), t),
        (_, None, _) => return Ok(None),
        _ => {
            return Err(StorageError::Corrupt(
                "account nonce without owner or timestamp".to_string(),
            ))
        }
    };

    let issued_at = DateTime::parse_from_rfc3339(&issued_at)
        .map_err(|e| StorageError::Corrupt(format!("issued_at: {}", e)))?
        .with_timezone(&Utc);

    Ok(Some(PendingNonce {
        user_id,
        challenge: NonceChallenge {
            nonce: nonce.to_string(),
            issued_at,
        },
    }))
}

/// Store a user profile if none exists under its id.
pub async fn store_user_if_absent<C>(con: &mut C, user: &StoredUser) -> Result<bool, StorageError>
where
    C: AsyncCommands,
{
    let json = serde_json::to_string(user)?;
    let created: bool = con.set_nx(user_key(&user.id), json).await?;
    Ok(created)
}

/// Get a user by ID.
pub async fn get_user<C>(con: &mut C, id: &str) -> Result<Option<StoredUser>, StorageError>
where
    C: AsyncCommands,
{
    let json: Option<String> = con.get(user_key(id)).await?;

    match json {
        Some(data) => Ok(Some(serde_json::from_str(&data)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pending_from_fields_absent() {
        assert_eq!(pending_from_fields((None, None, None)).unwrap(), None);
        // Account exists but nonce already consumed
        assert_eq!(
            pending_from_fields((Some("u1".to_string()), None, None)).unwrap(),
            None
        );
    }

    #[test]
    fn test_pending_from_fields_present() {
        let pending = pending_from_fields((
            Some("u1".to_string()),
            Some("abcd".to_string()),
            Some("2024-05-01T12:30:00.125Z".to_string()),
        ))
        .unwrap()
        .unwrap();

        assert_eq!(pending.user_id, "u1");
        assert_eq!(pending.challenge.nonce, "abcd");
        assert_eq!(
            pending.challenge.issued_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
                + chrono::Duration::milliseconds(125)
        );
    }

    #[test]
    fn test_pending_from_fields_corrupt() {
        let result = pending_from_fields((
            Some("u1".to_string()),
            Some("abcd".to_string()),
            Some("yesterday".to_string()),
        ));
        assert!(matches!(result, Err(StorageError::Corrupt(_))));

        let result = pending_from_fields((None, Some("abcd".to_string()), None));
        assert!(matches!(result, Err(StorageError::Corrupt(_))));
    }
}
