//! Page-context side of the extension.
//!
//! This module provides:
//! - The versioned RPC types exchanged with the background orchestrator
//! - [`PageAgent`], which executes those operations inside one document
//! - [`MediaWatcher`], which keeps a page's media list current as the DOM changes
//! - Bitmap re-encoding for converted downloads
//!
//! Everything that touches the live document goes through [`PageRuntime`], so
//! the same agent runs against a browser page or the native host.

mod agent;
mod convert;
mod protocol;
mod watcher;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error_handling::HostError;
use crate::extract::PageSnapshot;

// Re-export public API
pub use agent::PageAgent;
pub use convert::{convert_image, convert_image_blocking, is_decodable_image};
pub use protocol::{PageCall, PageOperation, PageReply, ZipItem, PAGE_PROTOCOL_VERSION};
pub use watcher::{DomMutation, MediaWatcher, PendingSlot, WATCHED_ATTRIBUTES};

/// Capabilities a document offers to page operations.
#[async_trait]
pub trait PageRuntime: Send + Sync {
    /// Fetches `url` from inside the page, with its origin and credentials.
    /// This is the only way to read `blob:` URLs.
    async fn fetch(&self, url: &str) -> Result<Bytes, HostError>;

    /// Saves `bytes` as `filename` through a synthetic anchor download.
    async fn save_via_anchor(&self, filename: &str, bytes: Bytes) -> Result<(), HostError>;

    /// Captures the document for extraction.
    async fn snapshot(&self) -> Result<PageSnapshot, HostError>;
}
