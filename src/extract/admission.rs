//! Candidate admission filters.
//!
//! Every extraction source funnels through [`Collector`], which applies the
//! same rejection rules regardless of where a URL was found. Duplicates are
//! kept here and collapsed later by `canonical::dedup_candidates`.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::DATA_URI_MIN_LENGTH;
use crate::extract::classify::is_stream_url;
use crate::models::{MediaCandidate, MediaSource, MediaType};

const TRACKING_PATTERN: &str = r"(?i)/pixel[./?]|/tr[./?]|1x1|spacer";

static TRACKING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(TRACKING_PATTERN).expect("Failed to compile tracking pattern - this is a bug")
});

/// Whether a URL may enter the candidate list.
///
/// - `javascript:` URLs are rejected outright
/// - `data:` URIs must be at least `DATA_URI_MIN_LENGTH` characters
/// - anything matching the tracking-pixel heuristic is rejected, unless it is
///   admitted as a blob reference
pub fn is_admissible(url: &str, blob: bool) -> bool {
    if url.is_empty() || has_scheme(url, "javascript:") {
        return false;
    }
    if has_scheme(url, "data:") {
        return url.len() >= DATA_URI_MIN_LENGTH;
    }
    blob || !TRACKING_RE.is_match(url)
}

pub(crate) fn has_scheme(url: &str, scheme: &str) -> bool {
    url.get(..scheme.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
}

/// Accumulates admitted candidates in discovery order.
#[derive(Debug, Default)]
pub(crate) struct Collector {
    items: Vec<MediaCandidate>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directly fetchable URL.
    pub fn add(&mut self, url: &str, media_type: MediaType, source: MediaSource) {
        self.push(url, media_type, source, false);
    }

    /// Adds a page-scoped blob reference that must be fetched in-page.
    pub fn add_blob(&mut self, url: &str, media_type: MediaType, source: MediaSource) {
        self.push(url, media_type, source, true);
    }

    /// Adds a third-party player URL, already rewritten to its watch page.
    pub fn add_embed(&mut self, url: &str) {
        if !is_admissible(url, false) {
            return;
        }
        let mut candidate = MediaCandidate::new(url, MediaType::Video, MediaSource::Embed);
        candidate.embed = true;
        self.items.push(candidate);
    }

    fn push(&mut self, url: &str, media_type: MediaType, source: MediaSource, blob: bool) {
        if !is_admissible(url, blob) {
            log::trace!("Rejected {} candidate: {}", source, truncate(url));
            return;
        }
        let mut candidate = MediaCandidate::new(url, media_type, source);
        candidate.blob = blob;
        candidate.stream = is_stream_url(url);
        self.items.push(candidate);
    }

    pub fn extend(&mut self, other: Collector) {
        self.items.extend(other.items);
    }

    pub fn into_items(self) -> Vec<MediaCandidate> {
        self.items
    }
}

fn truncate(url: &str) -> &str {
    match url.char_indices().nth(120) {
        Some((idx, _)) => &url[..idx],
        None => url,
    }
}
