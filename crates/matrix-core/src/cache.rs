//! `api_cache`: a keyed, TTL-expiring cache for third-party HTTP lookups
//! (package vulnerability/size/registry queries). Callers must treat a
//! cache miss the same as an upstream miss — never as an error (§6).

use chrono::{DateTime, Duration, Utc};

use crate::store::Store;

/// Default TTL for a cached response, per §6.
pub const DEFAULT_TTL_SECS: i64 = 24 * 60 * 60;

/// Read a cached response by key, ignoring it if older than `ttl`.
pub async fn get(store: &Store, key: &str, ttl_secs: i64) -> crate::Result<Option<String>> {
    let row: Option<(String, DateTime<Utc>)> =
        sqlx::query_as("SELECT response, created_at FROM api_cache WHERE cache_key = ?")
            .bind(key)
            .fetch_optional(store.pool())
            .await?;

    let Some((response, created_at)) = row else {
        return Ok(None);
    };

    let age = Utc::now().signed_duration_since(created_at);
    if age > Duration::seconds(ttl_secs) {
        return Ok(None);
    }
    Ok(Some(response))
}

/// Insert or replace a cached response, stamped with the current time.
pub async fn put(store: &Store, key: &str, response: &str) -> crate::Result<()> {
    sqlx::query(
        "INSERT INTO api_cache (cache_key, response, created_at) VALUES (?, ?, ?)
         ON CONFLICT(cache_key) DO UPDATE SET response = excluded.response, created_at = excluded.created_at",
    )
    .bind(key)
    .bind(response)
    .bind(Utc::now())
    .execute(store.pool())
    .await?;
    Ok(())
}

/// Delete every row older than `ttl_secs`. Called opportunistically on
/// writes rather than on a background timer (§5).
pub async fn reap_expired(store: &Store, ttl_secs: i64) -> crate::Result<u64> {
    let cutoff = Utc::now() - Duration::seconds(ttl_secs);
    let result = sqlx::query("DELETE FROM api_cache WHERE created_at < ?")
        .bind(cutoff)
        .execute(store.pool())
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = Store::open_in_memory().await.unwrap();
        put(&store, "pkg:lodash", "{\"vulnerable\":false}")
            .await
            .unwrap();
        let hit = get(&store, "pkg:lodash", DEFAULT_TTL_SECS).await.unwrap();
        assert_eq!(hit, Some("{\"vulnerable\":false}".to_string()));
    }

    #[tokio::test]
    async fn get_misses_cleanly_for_unknown_key() {
        let store = Store::open_in_memory().await.unwrap();
        assert_eq!(get(&store, "pkg:nope", DEFAULT_TTL_SECS).await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_overwrites_existing_entry() {
        let store = Store::open_in_memory().await.unwrap();
        put(&store, "pkg:lodash", "old").await.unwrap();
        put(&store, "pkg:lodash", "new").await.unwrap();
        assert_eq!(
            get(&store, "pkg:lodash", DEFAULT_TTL_SECS).await.unwrap(),
            Some("new".to_string())
        );
    }

    #[tokio::test]
    async fn expired_entries_are_invisible_to_get() {
        let store = Store::open_in_memory().await.unwrap();
        sqlx::query("INSERT INTO api_cache (cache_key, response, created_at) VALUES (?, ?, ?)")
            .bind("pkg:stale")
            .bind("stale")
            .bind(Utc::now() - Duration::seconds(DEFAULT_TTL_SECS + 60))
            .execute(store.pool())
            .await
            .unwrap();
        assert_eq!(get(&store, "pkg:stale", DEFAULT_TTL_SECS).await.unwrap(), None);
    }

    #[tokio::test]
    async fn reap_expired_deletes_only_stale_rows() {
        let store = Store::open_in_memory().await.unwrap();
        put(&store, "pkg:fresh", "fresh").await.unwrap();
        sqlx::query("INSERT INTO api_cache (cache_key, response, created_at) VALUES (?, ?, ?)")
            .bind("pkg:stale")
            .bind("stale")
            .bind(Utc::now() - Duration::seconds(DEFAULT_TTL_SECS + 60))
            .execute(store.pool())
            .await
            .unwrap();

        let reaped = reap_expired(&store, DEFAULT_TTL_SECS).await.unwrap();
        assert_eq!(reaped, 1);
        assert_eq!(
            get(&store, "pkg:fresh", DEFAULT_TTL_SECS).await.unwrap(),
            Some("fresh".to_string())
        );
    }
}
