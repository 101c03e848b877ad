//! Configuration constants.
//!
//! This module defines the fixed thresholds used by extraction, deduplication,
//! caching and download orchestration.

use std::time::Duration;

// Extraction thresholds
/// Data URIs shorter than this (in characters) are treated as tracking pixels
/// or placeholder icons and rejected. Roughly 750 bytes of real content.
pub const DATA_URI_MIN_LENGTH: usize = 1000;
/// Canvases narrower or shorter than this are decorative and skipped
pub const MIN_CANVAS_SIZE: u32 = 50;
/// Canvases wider or taller than this are not snapshotted
pub const MAX_CANVAS_SIZE: u32 = 4096;

// Live updates
/// Delay between a reported DOM mutation and the rescan it triggers
pub const RESCAN_DEBOUNCE: Duration = Duration::from_millis(80);

// Scan cache
/// Hard retention ceiling: entries older than this are deleted whenever the
/// cache is opened, regardless of the user's freshness window
pub const CACHE_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

// Batch downloads
/// Window size used when the caller does not supply one
pub const DEFAULT_MAX_CONCURRENT: usize = 4;
/// Lower clamp for the batch window size
pub const MIN_CONCURRENT: usize = 2;
/// Upper clamp for the batch window size
pub const MAX_CONCURRENT: usize = 8;
/// Filename of archives produced by ZIP batch downloads
pub const ZIP_ARCHIVE_NAME: &str = "media-harvest.zip";

// Timeouts
/// Upper bound for a single page-context call (fetch, convert, build ZIP).
/// Expiry is reported as a per-item failure.
pub const PAGE_CALL_TIMEOUT: Duration = Duration::from_secs(300);
/// HTTP client request timeout in seconds
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent string for HTTP requests made by the native host.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default SQLite database path for the scan cache and preferences
pub const DB_PATH: &str = "./media_harvest.db";
/// Default directory receiving downloaded files
pub const DOWNLOAD_DIR: &str = "./downloads";
