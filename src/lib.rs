//! media_harvest library: page media discovery and bulk downloading
//!
//! This library scans a page (document, shadow roots, frames and canvases) for
//! downloadable images, video and audio, deduplicates CDN size variants, caches
//! results per page, and downloads the selection one by one, in bounded
//! batches, re-encoded as JPEG/PNG, or packed into a stored-mode ZIP archive.
//!
//! The browser side is reached through two collaborator traits,
//! [`host::DownloadHost`] and [`host::PageBridge`]. The [`native`] module
//! implements both on top of `reqwest` and a download directory.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use media_harvest::native::{DownloadDirectory, LocalBridge, NativePage};
//! use media_harvest::{init_client, Config, Orchestrator};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let client = init_client(&config)?;
//! let downloads = Arc::new(DownloadDirectory::new(Arc::clone(&client), &config.download_dir));
//!
//! let page = NativePage::load(Arc::clone(&client), "https://example.com/", Arc::clone(&downloads)).await?;
//! let bridge = Arc::new(LocalBridge::<NativePage>::new());
//! let tab = bridge.open_tab(page, Vec::new());
//!
//! let orchestrator = Orchestrator::new(downloads, bridge);
//! let media = orchestrator.collect_media(tab).await?;
//! println!("Found {} media items", media.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod archive;
pub mod cache;
pub mod canonical;
pub mod config;
pub mod dispatch;
pub mod error_handling;
pub mod extract;
pub mod host;
pub mod initialization;
pub mod models;
pub mod naming;
pub mod native;
pub mod orchestrator;
pub mod page;
pub mod session;
pub mod storage;
mod utils;

// Re-export public API
pub use cache::{PreferenceStore, ScanCache, ScanCacheEntry};
pub use config::{Config, LogFormat, LogLevel, Preferences};
pub use dispatch::{Command, Dispatcher, Reply};
pub use error_handling::HostError;
pub use initialization::{init_client, init_download_dir, init_logger_with};
pub use models::{
    BatchSummary, ConvertFormat, DownloadProgress, DownloadRequest, DownloadResult,
    MediaCandidate, MediaSource, MediaType, TabId, ZipOutcome,
};
pub use orchestrator::Orchestrator;
pub use session::AppState;
pub use storage::{open_database, run_migrations};
