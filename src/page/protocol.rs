//! Versioned RPC between the background orchestrator and page contexts.
//!
//! The set of operations is closed: a page only executes the variants of
//! [`PageOperation`], never arbitrary code shipped by the caller.

use serde::{Deserialize, Serialize};

use crate::models::{ConvertFormat, MediaCandidate, MediaType, ZipOutcome};

/// Protocol revision implemented by this build. Bumped on any breaking change
/// to [`PageOperation`] or [`PageReply`].
pub const PAGE_PROTOCOL_VERSION: u32 = 1;

/// One request sent into a page context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCall {
    pub version: u32,
    pub op: PageOperation,
}

impl PageCall {
    /// Wraps `op` with the current protocol version.
    pub fn new(op: PageOperation) -> Self {
        Self {
            version: PAGE_PROTOCOL_VERSION,
            op,
        }
    }
}

/// A file to fetch into a ZIP archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipItem {
    pub url: String,
    pub filename: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
}

/// Operations a page context knows how to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PageOperation {
    /// Scan the document and return its deduplicated media list.
    CollectMedia,
    /// Fetch `url` with the page's credentials and save it through an anchor.
    FetchAndTrigger { url: String, filename: String },
    /// Fetch an image, re-encode it as `format`, and save the result.
    ConvertAndTrigger {
        url: String,
        filename: String,
        format: ConvertFormat,
    },
    /// Fetch every item, pack them into a stored-mode ZIP, and save it.
    BuildZipAndTrigger {
        items: Vec<ZipItem>,
        #[serde(default)]
        format: ConvertFormat,
        archive_name: String,
    },
}

impl PageOperation {
    pub fn name(&self) -> &'static str {
        match self {
            PageOperation::CollectMedia => "collect-media",
            PageOperation::FetchAndTrigger { .. } => "fetch-and-trigger",
            PageOperation::ConvertAndTrigger { .. } => "convert-and-trigger",
            PageOperation::BuildZipAndTrigger { .. } => "build-zip-and-trigger",
        }
    }
}

/// Result of one [`PageOperation`] in one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PageReply {
    Media { media: Vec<MediaCandidate> },
    /// The page handed the bytes to its anchor download.
    Saved,
    /// The page could not complete the operation.
    Failed { error: String },
    Zip(ZipOutcome),
}

impl PageReply {
    pub fn is_saved(&self) -> bool {
        matches!(self, PageReply::Saved)
    }
}
