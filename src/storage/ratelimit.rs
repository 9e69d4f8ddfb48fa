//! Fixed-window rate limit counters in Redis.
//!
//! Redis key pattern: `ratelimit:{scope}:{client}` — counter with TTL.

use crate::models::RateWindow;
use crate::storage::StorageError;
use redis::AsyncCommands;

/// Count one request using Redis INCR with TTL.
///
/// The first request of a window sets the TTL; later requests only read it.
pub async fn hit_window<C>(con: &mut C, key: &str, window_secs: u64) -> Result<RateWindow, StorageError>
where
    C: AsyncCommands,
{
    let count: u32 = con.incr(key, 1).await?;

    if count == 1 {
        con.expire::<_, ()>(key, window_secs as i64).await?;
        return Ok(RateWindow {
            count,
            resets_in_secs: window_secs,
        });
    }

    let ttl: i64 = con.ttl(key).await?;
    let resets_in_secs = if ttl > 0 {
        ttl as u64
    } else {
        // Counter lost its TTL (e.g. EXPIRE never ran); start the window now
        con.expire::<_, ()>(key, window_secs as i64).await?;
        window_secs
    };

    Ok(RateWindow {
        count,
        resets_in_secs,
    })
}
