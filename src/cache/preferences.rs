//! Key / JSON-value preference storage.

use std::sync::Arc;

use chrono::Utc;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::config::Preferences;
use crate::error_handling::DatabaseError;

const PREFERENCES_KEY: &str = "preferences";
const SAVED_URLS_KEY: &str = "savedUrls";

/// Persistent user settings.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    pool: Arc<SqlitePool>,
}

impl PreferenceStore {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Stored preferences, or defaults when missing or unreadable.
    pub async fn load(&self) -> Preferences {
        self.get_or_default(PREFERENCES_KEY).await
    }

    /// # Errors
    ///
    /// Fails when the value cannot be written; callers decide whether that matters.
    pub async fn save(&self, preferences: &Preferences) -> Result<(), DatabaseError> {
        self.set_json(PREFERENCES_KEY, preferences).await
    }

    /// URLs the user already downloaded, in the order they were saved.
    pub async fn saved_urls(&self) -> Vec<String> {
        self.get_or_default(SAVED_URLS_KEY).await
    }

    /// Best-effort: a failed write is logged and dropped.
    pub async fn save_urls(&self, urls: &[String]) {
        if let Err(e) = self.set_json(SAVED_URLS_KEY, urls).await {
            warn!("Failed to persist saved URLs: {}", e);
        }
    }

    async fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.get_json(key).await {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                warn!("Failed to read preference '{}', using defaults: {}", key, e);
                T::default()
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value_json FROM preferences WHERE key = ?")
                .bind(key)
                .fetch_optional(self.pool.as_ref())
                .await?;
        match row {
            Some((json,)) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(value)?;
        sqlx::query(
            "INSERT INTO preferences (key, value_json, updated_at_ms) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                value_json = excluded.value_json,
                updated_at_ms = excluded.updated_at_ms",
        )
        .bind(key)
        .bind(json)
        .bind(Utc::now().timestamp_millis())
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }
}
