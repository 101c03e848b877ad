//! User-configurable preferences.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::constants::{DEFAULT_MAX_CONCURRENT, MAX_CONCURRENT, MIN_CONCURRENT};

/// Options the user can change between sessions.
///
/// Missing keys deserialize to their defaults so older stored values keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    /// How long a cache hit counts as fresh, in minutes. Advisory only.
    pub cache_ttl_minutes: u64,
    /// Requested batch window size; clamped before use
    pub max_concurrent: usize,
    /// Newline-separated, case-insensitive URL substrings hidden from the list
    pub exclude_patterns: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: 5,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            exclude_patterns: String::new(),
        }
    }
}

impl Preferences {
    /// Window size actually used for batch downloads.
    pub fn effective_concurrency(&self) -> usize {
        clamp_concurrency(Some(self.max_concurrent))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes.saturating_mul(60))
    }

    /// Exclusion patterns, lowercased, blank lines dropped.
    pub fn exclusions(&self) -> Vec<String> {
        self.exclude_patterns
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Clamps a requested window size into `MIN_CONCURRENT..=MAX_CONCURRENT`,
/// using the default when none (or zero) is requested.
pub fn clamp_concurrency(requested: Option<usize>) -> usize {
    let requested = requested
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_MAX_CONCURRENT);
    requested.clamp(MIN_CONCURRENT, MAX_CONCURRENT)
}
