//! Scan cache and preference store.
//!
//! Both live in the SQLite database opened by `storage::open_database`.
//! Every operation here is best-effort: a storage failure is logged at warn
//! and turned into "no cached data" (reads) or silently dropped (writes), so
//! the live scan always decides what is shown.

mod preferences;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::canonical::page_identity;
use crate::config::CACHE_RETENTION;
use crate::error_handling::DatabaseError;
use crate::models::MediaCandidate;

// Re-export public API
pub use preferences::PreferenceStore;

/// The last scan result recorded for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCacheEntry {
    /// Canonical page identity (fragment stripped)
    pub page_url: String,
    pub media: Vec<MediaCandidate>,
    /// Unix epoch milliseconds
    pub cached_at_ms: i64,
}

impl ScanCacheEntry {
    /// Whether the entry is younger than `ttl` at `now_ms`.
    ///
    /// Advisory: a stale entry is still shown while the live scan runs.
    pub fn is_fresh(&self, ttl: Duration, now_ms: i64) -> bool {
        let age_ms = now_ms.saturating_sub(self.cached_at_ms);
        age_ms >= 0 && (age_ms as u128) < ttl.as_millis()
    }
}

/// Last-known media list per page.
#[derive(Debug, Clone)]
pub struct ScanCache {
    pool: Arc<SqlitePool>,
}

impl ScanCache {
    /// Wraps `pool` and evicts entries older than the retention ceiling.
    pub async fn open(pool: Arc<SqlitePool>) -> Self {
        let cache = Self { pool };
        let cutoff = Utc::now().timestamp_millis() - CACHE_RETENTION.as_millis() as i64;
        match cache.evict_older_than(cutoff).await {
            Ok(0) => {}
            Ok(n) => debug!("Evicted {} expired scan cache entries", n),
            Err(e) => warn!("Scan cache eviction failed: {}", e),
        }
        cache
    }

    /// Deletes entries cached before `cutoff_ms`; returns how many were removed.
    pub async fn evict_older_than(&self, cutoff_ms: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM scan_cache WHERE cached_at_ms < ?")
            .bind(cutoff_ms)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected())
    }

    /// Cached entry for `page_url`, if any. Storage errors read as a miss.
    pub async fn get(&self, page_url: &str) -> Option<ScanCacheEntry> {
        match self.try_get(&page_identity(page_url)).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Scan cache read failed for {}: {}", page_url, e);
                None
            }
        }
    }

    /// Records `media` as the latest result for `page_url`. Last write wins.
    pub async fn put(&self, page_url: &str, media: &[MediaCandidate]) {
        let key = page_identity(page_url);
        if let Err(e) = self.try_put(&key, media, Utc::now().timestamp_millis()).await {
            warn!("Scan cache write failed for {}: {}", key, e);
        }
    }

    async fn try_get(&self, key: &str) -> Result<Option<ScanCacheEntry>, DatabaseError> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT media_json, cached_at_ms FROM scan_cache WHERE page_url = ?")
                .bind(key)
                .fetch_optional(self.pool.as_ref())
                .await?;

        let Some((media_json, cached_at_ms)) = row else {
            return Ok(None);
        };
        let media: Vec<MediaCandidate> = serde_json::from_str(&media_json)?;
        Ok(Some(ScanCacheEntry {
            page_url: key.to_string(),
            media,
            cached_at_ms,
        }))
    }

    pub(crate) async fn try_put(
        &self,
        key: &str,
        media: &[MediaCandidate],
        cached_at_ms: i64,
    ) -> Result<(), DatabaseError> {
        let media_json = serde_json::to_string(media)?;
        sqlx::query(
            "INSERT INTO scan_cache (page_url, media_json, cached_at_ms) VALUES (?, ?, ?)
             ON CONFLICT(page_url) DO UPDATE SET
                media_json = excluded.media_json,
                cached_at_ms = excluded.cached_at_ms",
        )
        .bind(key)
        .bind(media_json)
        .bind(cached_at_ms)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }
}
