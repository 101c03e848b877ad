//! Application initialization and resource setup.
//!
//! This module provides functions to initialize all shared resources:
//! - Logger (plain or JSON)
//! - HTTP client
//! - Download directory
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

use std::path::Path;

use crate::error_handling::InitializationError;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;

/// Creates the download directory (and parents) if it does not exist yet.
///
/// # Errors
///
/// Returns `InitializationError::DownloadDirError` when the path exists but is
/// not a directory, or cannot be created.
pub fn init_download_dir(dir: &Path) -> Result<(), InitializationError> {
    if dir.exists() && !dir.is_dir() {
        return Err(InitializationError::DownloadDirError(format!(
            "{} exists and is not a directory",
            dir.display()
        )));
    }
    std::fs::create_dir_all(dir)
        .map_err(|e| InitializationError::DownloadDirError(format!("{}: {}", dir.display(), e)))
}
