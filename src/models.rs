//! Shared data model: media candidates, download requests and their results.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter};

/// Broad media category of a candidate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaType {
    /// Raster or vector image
    Image,
    /// Video file, stream manifest or embedded player
    Video,
    /// Audio file
    Audio,
}

/// Where on the page a candidate was discovered.
///
/// Used for labelling only; no scan or download logic branches on it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MediaSource {
    Link,
    Img,
    ImgSrcset,
    Lazy,
    LazySrcset,
    Video,
    VideoPoster,
    Source,
    Audio,
    PictureSource,
    #[serde(rename = "css-bg")]
    #[strum(serialize = "css-bg")]
    CssBackground,
    Meta,
    Noscript,
    Preload,
    JsonLd,
    Embed,
    Canvas,
}

/// A single piece of downloadable (or linkable) media found on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCandidate {
    /// Absolute URL, `blob:` reference or `data:` URI
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub source: MediaSource,
    /// Only reachable from inside the page's script context
    #[serde(default, skip_serializing_if = "is_false")]
    pub blob: bool,
    /// Adaptive-streaming manifest rather than a single file
    #[serde(default, skip_serializing_if = "is_false")]
    pub stream: bool,
    /// Third-party player page; linkable but not downloadable
    #[serde(default, skip_serializing_if = "is_false")]
    pub embed: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl MediaCandidate {
    pub fn new(url: impl Into<String>, media_type: MediaType, source: MediaSource) -> Self {
        Self {
            url: url.into(),
            media_type,
            source,
            blob: false,
            stream: false,
            embed: false,
        }
    }

    /// Whether the candidate can be handed to a download operation at all.
    pub fn is_downloadable(&self) -> bool {
        !self.embed
    }
}

/// Opaque identifier of a browser tab / page context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

/// Identifier returned by the host's download primitive. Passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadId(pub u64);

/// Output raster format for converted downloads.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConvertFormat {
    /// Keep the bytes as fetched
    #[default]
    Original,
    Jpg,
    Png,
}

/// One item the user asked to download. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub filename: String,
    #[serde(default)]
    pub blob: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<TabId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ConvertFormat>,
    /// Media type of the originating candidate; conversion only applies to images
    #[serde(rename = "type", default = "default_request_type")]
    pub media_type: MediaType,
}

fn default_request_type() -> MediaType {
    MediaType::Image
}

impl DownloadRequest {
    /// Builds a request from a candidate, deriving the filename from its URL.
    pub fn from_candidate(candidate: &MediaCandidate, tab: Option<TabId>) -> Self {
        Self {
            url: candidate.url.clone(),
            filename: crate::naming::filename_from_url(&candidate.url),
            blob: candidate.blob,
            tab,
            format: None,
            media_type: candidate.media_type,
        }
    }

    /// Asks for this item re-encoded as `format`, renaming it to match.
    ///
    /// Only plain images convert; blob items and other media are returned
    /// unchanged, as is every item for [`ConvertFormat::Original`].
    pub fn with_format(mut self, format: ConvertFormat) -> Self {
        if format == ConvertFormat::Original || self.blob || self.media_type != MediaType::Image {
            return self;
        }
        self.filename = crate::naming::with_format_extension(&self.filename, format);
        self.format = Some(format);
        self
    }
}

/// Outcome of a single-item download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_id: Option<DownloadId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadResult {
    /// Success reported by the host download primitive.
    pub fn started(download_id: DownloadId) -> Self {
        Self {
            success: true,
            download_id: Some(download_id),
            error: None,
        }
    }

    /// Success of an in-page anchor download, which has no host identifier.
    pub fn triggered() -> Self {
        Self {
            success: true,
            download_id: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            download_id: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregate outcome of a plain batch download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub failed: usize,
    /// Literal URLs of the failed items, in request order
    pub failed_urls: Vec<String>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.total - self.failed
    }
}

/// Outcome of a ZIP batch download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipOutcome {
    pub success: bool,
    /// Number of entries written to the archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ZipOutcome {
    pub fn archived(count: usize) -> Self {
        Self {
            success: true,
            count: Some(count),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            count: None,
            error: Some(error.into()),
        }
    }
}

/// Progress notification emitted after each batch window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub completed: usize,
    pub total: usize,
}
