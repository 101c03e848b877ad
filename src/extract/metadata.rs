//! Document-level media hints.
//!
//! These sources are only queried on the document itself, never inside
//! shadow roots:
//! - Open Graph (`og:*`) and Twitter Card (`twitter:*`) meta tags
//! - `<noscript>` fallback images
//! - `<link rel="preload">` hints
//! - JSON-LD (`application/ld+json`) payloads

use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;

use super::admission::Collector;
use super::classify::classify_url;
use super::Scope;
use crate::models::{MediaSource, MediaType};
use crate::utils::parse_selector_unsafe;

/// JSON-LD properties whose string values may name a media file
const JSON_LD_MEDIA_KEYS: &[&str] = &[
    "image",
    "thumbnailUrl",
    "contentUrl",
    "embedUrl",
    "logo",
    "photo",
    "video",
    "audio",
];

static SOCIAL_META_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector_unsafe(
        r#"meta[property^="og:"], meta[name^="twitter:"]"#,
        "SOCIAL_META_SELECTOR",
    )
});
static NOSCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("noscript", "NOSCRIPT_SELECTOR"));
static IMG_SRC_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("img[src]", "IMG_SRC_SELECTOR"));
static PRELOAD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe(r#"link[rel="preload"]"#, "PRELOAD_SELECTOR"));
static JSON_LD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector_unsafe(r#"script[type="application/ld+json"]"#, "JSON_LD_SELECTOR")
});

/// Open Graph / Twitter Card tags.
///
/// The property name decides the type by substring: a property mentioning
/// several of image/video/audio contributes one candidate per type.
pub(crate) fn collect_meta_tags(scope: &Scope, collector: &mut Collector) {
    for meta in scope.document.select(&SOCIAL_META_SELECTOR) {
        let element = meta.value();
        let property = element
            .attr("property")
            .or_else(|| element.attr("name"))
            .unwrap_or_default()
            .to_lowercase();
        let Some(content) = element.attr("content").and_then(|c| scope.resolve(c)) else {
            continue;
        };

        if property.contains("image") {
            collector.add(&content, MediaType::Image, MediaSource::Meta);
        }
        if property.contains("video") {
            collector.add(&content, MediaType::Video, MediaSource::Meta);
        }
        if property.contains("audio") {
            collector.add(&content, MediaType::Audio, MediaSource::Meta);
        }
    }
}

/// `<img src>` inside `<noscript>` text, reparsed as an inert fragment.
pub(crate) fn collect_noscript_images(scope: &Scope, collector: &mut Collector) {
    for noscript in scope.document.select(&NOSCRIPT_SELECTOR) {
        let markup: String = noscript.text().collect();
        if markup.trim().is_empty() {
            continue;
        }
        let fragment = Html::parse_fragment(&markup);
        for img in fragment.select(&IMG_SRC_SELECTOR) {
            if let Some(src) = img.value().attr("src").and_then(|s| scope.resolve(s)) {
                collector.add(&src, MediaType::Image, MediaSource::Noscript);
            }
        }
    }
}

/// `<link rel="preload" as="image|video|audio">`.
pub(crate) fn collect_preload_hints(scope: &Scope, collector: &mut Collector) {
    for link in scope.document.select(&PRELOAD_SELECTOR) {
        let media_type = match link.value().attr("as") {
            Some("image") => MediaType::Image,
            Some("video") => MediaType::Video,
            Some("audio") => MediaType::Audio,
            _ => continue,
        };
        if let Some(href) = link.value().attr("href").and_then(|h| scope.resolve(h)) {
            collector.add(&href, media_type, MediaSource::Preload);
        }
    }
}

/// JSON-LD payloads, walked recursively for media-bearing keys.
///
/// A malformed payload is skipped; the other scripts still contribute.
pub(crate) fn collect_json_ld(scope: &Scope, collector: &mut Collector) {
    for script in scope.document.select(&JSON_LD_SELECTOR) {
        let payload: String = script.text().collect();
        match serde_json::from_str::<Value>(payload.trim()) {
            Ok(value) => walk_json_ld(&value, scope, collector),
            Err(e) => log::debug!("Skipping malformed JSON-LD: {}", e),
        }
    }
}

fn walk_json_ld(value: &Value, scope: &Scope, collector: &mut Collector) {
    match value {
        Value::Array(items) => {
            for item in items {
                walk_json_ld(item, scope, collector);
            }
        }
        Value::Object(map) => {
            for (key, val) in map {
                let is_media_key = JSON_LD_MEDIA_KEYS.contains(&key.as_str());
                match val {
                    Value::String(s) if is_media_key => add_json_ld_url(s, scope, collector),
                    Value::Array(items) if is_media_key => {
                        for item in items {
                            match item {
                                Value::String(s) => add_json_ld_url(s, scope, collector),
                                other => walk_json_ld(other, scope, collector),
                            }
                        }
                    }
                    Value::Array(_) | Value::Object(_) => walk_json_ld(val, scope, collector),
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

fn add_json_ld_url(raw: &str, scope: &Scope, collector: &mut Collector) {
    let Some(url) = scope.resolve(raw) else {
        return;
    };
    if let Some(media_type) = classify_url(&url) {
        collector.add(&url, media_type, MediaSource::JsonLd);
    }
}
