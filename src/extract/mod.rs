//! Media extraction engine.
//!
//! Turns a [`PageSnapshot`] into a flat, ordered list of media candidates.
//! Each source category contributes independently:
//! - element sources (links, images, video/audio, picture, inline CSS
//!   backgrounds, iframe embeds, canvases) queried across the document and
//!   every shadow root
//! - document sources (Open Graph / Twitter meta, `<noscript>` fallbacks,
//!   preload hints, JSON-LD) queried on the document only
//!
//! Frames are scanned recursively, each against its own base URL. The output
//! is raw: the same asset may appear several times and is collapsed by
//! `canonical::dedup_candidates`.
//!
//! All parsing is done with CSS selectors via the `scraper` crate. One bad
//! element (unresolvable URL, tainted canvas, malformed JSON-LD) is skipped
//! without affecting the rest of the scan.

mod admission;
pub mod classify;
mod elements;
mod embeds;
mod metadata;
mod snapshot;

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::canonical::dedup_candidates;
use crate::models::MediaCandidate;

use admission::{has_scheme, Collector};

// Re-export public API
pub use admission::is_admissible;
pub use embeds::rewrite_embed_url;
pub use snapshot::{CanvasSnapshot, PageSnapshot, ShadowRootSnapshot};

const BASE_SELECTOR_STR: &str = "base[href]";

static BASE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| crate::utils::parse_selector_unsafe(BASE_SELECTOR_STR, "BASE_SELECTOR"));

/// Parsed document plus the shadow-root fragments reachable from it.
pub(crate) struct Scope {
    pub base: Url,
    pub document: Html,
    shadow_roots: Vec<Html>,
}

impl Scope {
    fn new(snapshot: &PageSnapshot) -> Self {
        let document = Html::parse_document(&snapshot.html);
        let page_url = Url::parse(&snapshot.url)
            .or_else(|_| Url::parse("about:blank"))
            .expect("about:blank always parses");
        let base = document
            .select(&BASE_SELECTOR)
            .next()
            .and_then(|base| base.value().attr("href"))
            .and_then(|href| page_url.join(href.trim()).ok())
            .unwrap_or(page_url);

        let mut shadow_roots = Vec::new();
        collect_shadow_roots(&snapshot.shadow_roots, &mut shadow_roots);

        Self {
            base,
            document,
            shadow_roots,
        }
    }

    /// Runs `selector` against the document and every shadow root.
    pub fn deep_select<'a>(
        &'a self,
        selector: &'a Selector,
    ) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        std::iter::once(&self.document)
            .chain(self.shadow_roots.iter())
            .flat_map(move |root| root.select(selector))
    }

    /// Resolves an attribute value against the base URL.
    pub fn resolve(&self, raw: &str) -> Option<String> {
        resolve_against(&self.base, raw)
    }
}

/// Flattens nested shadow roots depth-first before any query runs.
fn collect_shadow_roots(roots: &[ShadowRootSnapshot], out: &mut Vec<Html>) {
    for root in roots {
        out.push(Html::parse_fragment(&root.html));
        collect_shadow_roots(&root.shadow_roots, out);
    }
}

/// Resolves `raw` against `base`. `blob:` and `data:` references are returned
/// as-is (trimmed); empty or unresolvable values yield `None`.
pub(crate) fn resolve_against(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if has_scheme(raw, "blob:") || has_scheme(raw, "data:") {
        return Some(raw.to_string());
    }
    base.join(raw).ok().map(String::from)
}

pub(crate) fn is_blob(url: &str) -> bool {
    has_scheme(url, "blob:")
}

/// Extracts every media candidate from a page and its frames, without
/// deduplication.
pub fn extract_media(snapshot: &PageSnapshot) -> Vec<MediaCandidate> {
    let mut collector = Collector::new();
    extract_into(snapshot, &mut collector);
    collector.into_items()
}

/// Extracts and deduplicates: the list a scan reports.
pub fn scan_page(snapshot: &PageSnapshot) -> Vec<MediaCandidate> {
    let raw = extract_media(snapshot);
    let total = raw.len();
    let media = dedup_candidates(raw);
    log::debug!(
        "Scanned {}: {} raw candidates, {} after dedup",
        snapshot.url,
        total,
        media.len()
    );
    media
}

fn extract_into(snapshot: &PageSnapshot, collector: &mut Collector) {
    let scope = Scope::new(snapshot);

    elements::collect_links(&scope, collector);
    elements::collect_images(&scope, collector);
    elements::collect_videos(&scope, collector);
    elements::collect_sources(&scope, collector);
    elements::collect_audio(&scope, collector);
    elements::collect_picture_sources(&scope, collector);
    elements::collect_css_backgrounds(&scope, collector);
    metadata::collect_meta_tags(&scope, collector);
    metadata::collect_noscript_images(&scope, collector);
    metadata::collect_preload_hints(&scope, collector);
    metadata::collect_json_ld(&scope, collector);
    embeds::collect_embeds(&scope, collector);
    elements::collect_canvases(&snapshot.canvases, collector);

    for frame in &snapshot.frames {
        let mut frame_collector = Collector::new();
        extract_into(frame, &mut frame_collector);
        collector.extend(frame_collector);
    }
}

#[cfg(test)]
mod tests;
