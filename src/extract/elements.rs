//! Element-level sources: links, images, video/audio, picture sources, inline
//! CSS backgrounds and canvases.

use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

use super::admission::Collector;
use super::classify::{classify_mime, classify_url};
use super::snapshot::CanvasSnapshot;
use super::{is_blob, Scope};
use crate::config::{DATA_URI_MIN_LENGTH, MAX_CANVAS_SIZE, MIN_CANVAS_SIZE};
use crate::models::{MediaSource, MediaType};
use crate::utils::parse_selector_unsafe;

/// Attributes lazy-load libraries use to park the real image URL
pub const LAZY_ATTRS: &[&str] = &[
    "data-src",
    "data-lazy",
    "data-original",
    "data-lazy-src",
    "data-hi-res-src",
];

/// Attributes players use to expose the real file behind a blob source
const MEDIA_DATA_ATTRS: &[&str] = &["data-src", "data-video-url", "data-hd-url", "data-file-url"];

const BG_URL_PATTERN: &str =
    r#"(?i)(?:^|;)\s*background(?:-image)?\s*:[^;]*?url\(\s*["']?([^"')]+)["']?\s*\)"#;

static BG_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(BG_URL_PATTERN).expect("Failed to compile background pattern - this is a bug")
});

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("a[href]", "ANCHOR_SELECTOR"));
static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("img", "IMG_SELECTOR"));
static VIDEO_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("video", "VIDEO_SELECTOR"));
static AUDIO_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("audio", "AUDIO_SELECTOR"));
static MEDIA_SOURCE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector_unsafe("video source, audio source", "MEDIA_SOURCE_SELECTOR")
});
static SOURCE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("source", "SOURCE_SELECTOR"));
static PICTURE_SOURCE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("picture source", "PICTURE_SOURCE_SELECTOR"));
static BACKGROUND_STYLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector_unsafe(r#"[style*="background"]"#, "BACKGROUND_STYLE_SELECTOR")
});

/// Splits a `srcset` value into its URLs, dropping width/density descriptors.
pub fn parse_srcset(srcset: &str) -> Vec<&str> {
    srcset
        .split(',')
        .filter_map(|entry| entry.split_whitespace().next())
        .collect()
}

/// `<a href>` pointing at a file with a known media extension.
pub(crate) fn collect_links(scope: &Scope, collector: &mut Collector) {
    for anchor in scope.deep_select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href").and_then(|h| scope.resolve(h)) else {
            continue;
        };
        if let Some(media_type) = classify_url(&href) {
            collector.add(&href, media_type, MediaSource::Link);
        }
    }
}

/// `<img>`: current source, `srcset` variants, lazy-load attributes.
pub(crate) fn collect_images(scope: &Scope, collector: &mut Collector) {
    for img in scope.deep_select(&IMG_SELECTOR) {
        let element = img.value();

        if let Some(src) = element.attr("src").and_then(|s| scope.resolve(s)) {
            if is_blob(&src) {
                add_blob(scope, img, &src, MediaType::Image, MediaSource::Img, collector);
            } else {
                collector.add(&src, MediaType::Image, MediaSource::Img);
            }
        }

        if let Some(srcset) = element.attr("srcset") {
            for url in parse_srcset(srcset) {
                if let Some(url) = scope.resolve(url) {
                    collector.add(&url, MediaType::Image, MediaSource::ImgSrcset);
                }
            }
        }

        for attr in LAZY_ATTRS {
            let Some(value) = element.attr(attr) else {
                continue;
            };
            if is_inline_reference(value) {
                continue;
            }
            if let Some(url) = scope.resolve(value) {
                collector.add(&url, MediaType::Image, MediaSource::Lazy);
            }
        }

        if let Some(lazy_srcset) = element.attr("data-srcset") {
            for url in parse_srcset(lazy_srcset) {
                if let Some(url) = scope.resolve(url) {
                    collector.add(&url, MediaType::Image, MediaSource::LazySrcset);
                }
            }
        }
    }
}

/// `<video>`: `src` (with blob resolution) and `poster`.
pub(crate) fn collect_videos(scope: &Scope, collector: &mut Collector) {
    for video in scope.deep_select(&VIDEO_SELECTOR) {
        if let Some(src) = video.value().attr("src").and_then(|s| scope.resolve(s)) {
            if is_blob(&src) {
                add_blob(scope, video, &src, MediaType::Video, MediaSource::Video, collector);
            } else {
                collector.add(&src, MediaType::Video, MediaSource::Video);
            }
        }
        if let Some(poster) = video.value().attr("poster").and_then(|p| scope.resolve(p)) {
            collector.add(&poster, MediaType::Image, MediaSource::VideoPoster);
        }
    }
}

/// `<source>` children of `<video>` / `<audio>`.
pub(crate) fn collect_sources(scope: &Scope, collector: &mut Collector) {
    for source in scope.deep_select(&MEDIA_SOURCE_SELECTOR) {
        let Some(src) = source.value().attr("src").and_then(|s| scope.resolve(s)) else {
            continue;
        };

        if is_blob(&src) {
            let player = closest(source, |e| matches!(e.value().name(), "video" | "audio"));
            let media_type = match closest(source, |e| e.value().name() == "audio") {
                Some(_) => MediaType::Audio,
                None => MediaType::Video,
            };
            let owner = player.or_else(|| source.parent().and_then(ElementRef::wrap));
            match owner {
                Some(owner) => {
                    add_blob(scope, owner, &src, media_type, MediaSource::Source, collector)
                }
                None => collector.add_blob(&src, media_type, MediaSource::Source),
            }
            continue;
        }

        let media_type = source
            .value()
            .attr("type")
            .and_then(classify_mime)
            .or_else(|| classify_url(&src));
        if let Some(media_type) = media_type {
            collector.add(&src, media_type, MediaSource::Source);
        }
    }
}

/// `<audio src>`.
pub(crate) fn collect_audio(scope: &Scope, collector: &mut Collector) {
    for audio in scope.deep_select(&AUDIO_SELECTOR) {
        if let Some(src) = audio.value().attr("src").and_then(|s| scope.resolve(s)) {
            if is_blob(&src) {
                add_blob(scope, audio, &src, MediaType::Audio, MediaSource::Audio, collector);
            } else {
                collector.add(&src, MediaType::Audio, MediaSource::Audio);
            }
        }
    }
}

/// `<picture><source srcset>` variants.
pub(crate) fn collect_picture_sources(scope: &Scope, collector: &mut Collector) {
    for source in scope.deep_select(&PICTURE_SOURCE_SELECTOR) {
        let Some(srcset) = source.value().attr("srcset") else {
            continue;
        };
        for url in parse_srcset(srcset) {
            if let Some(url) = scope.resolve(url) {
                collector.add(&url, MediaType::Image, MediaSource::PictureSource);
            }
        }
    }
}

/// Inline `style="background(-image): url(...)"`.
pub(crate) fn collect_css_backgrounds(scope: &Scope, collector: &mut Collector) {
    for element in scope.deep_select(&BACKGROUND_STYLE_SELECTOR) {
        let Some(style) = element.value().attr("style") else {
            continue;
        };
        let Some(raw) = background_image_url(style) else {
            continue;
        };
        if let Some(url) = scope.resolve(raw) {
            let media_type = classify_url(&url).unwrap_or(MediaType::Image);
            collector.add(&url, media_type, MediaSource::CssBackground);
        }
    }
}

/// First `url(...)` of a `background` or `background-image` declaration.
pub fn background_image_url(style: &str) -> Option<&str> {
    BG_URL_RE
        .captures(style)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|url| !url.is_empty())
}

/// Canvas snapshots within the size band, serialized to PNG data URIs.
pub(crate) fn collect_canvases(canvases: &[CanvasSnapshot], collector: &mut Collector) {
    let band = MIN_CANVAS_SIZE..=MAX_CANVAS_SIZE;
    for canvas in canvases {
        if !band.contains(&canvas.width) || !band.contains(&canvas.height) {
            continue;
        }
        match canvas.to_data_url() {
            Ok(data_url) if data_url.len() > DATA_URI_MIN_LENGTH => {
                collector.add(&data_url, MediaType::Image, MediaSource::Canvas);
            }
            Ok(_) => {}
            Err(e) => log::debug!("Skipping {}x{} canvas: {}", canvas.width, canvas.height, e),
        }
    }
}

/// Adds a blob reference, preferring a real URL found near the element.
///
/// The lookup order is a heuristic that covers common player markup; it is
/// not exhaustive for every lazy-loading library.
fn add_blob(
    scope: &Scope,
    element: ElementRef<'_>,
    blob_url: &str,
    media_type: MediaType,
    source: MediaSource,
    collector: &mut Collector,
) {
    match resolve_blob(scope, element) {
        Some(real_url) => collector.add(&real_url, media_type, source),
        None => collector.add_blob(blob_url, media_type, source),
    }
}

/// Looks for a directly fetchable URL standing in for a blob source:
/// 1. media data attributes on the element
/// 2. a non-blob `<source>` child
/// 3. an enclosing link to a media file
pub(crate) fn resolve_blob(scope: &Scope, element: ElementRef<'_>) -> Option<String> {
    for attr in MEDIA_DATA_ATTRS {
        if let Some(value) = element.value().attr(attr) {
            if is_inline_reference(value) {
                continue;
            }
            if let Some(url) = scope.resolve(value) {
                return Some(url);
            }
        }
    }

    for source in element.select(&SOURCE_SELECTOR) {
        if let Some(src) = source.value().attr("src").and_then(|s| scope.resolve(s)) {
            if !is_blob(&src) {
                return Some(src);
            }
        }
    }

    closest(element, |e| {
        e.value().name() == "a" && e.value().attr("href").is_some()
    })
    .and_then(|anchor| anchor.value().attr("href"))
    .and_then(|href| scope.resolve(href))
    .filter(|href| classify_url(href).is_some())
}

/// Nearest ancestor-or-self element matching `pred`.
fn closest<'a>(
    element: ElementRef<'a>,
    pred: impl Fn(&ElementRef<'a>) -> bool,
) -> Option<ElementRef<'a>> {
    if pred(&element) {
        return Some(element);
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| pred(ancestor))
}

fn is_inline_reference(value: &str) -> bool {
    let value = value.trim_start();
    value.starts_with("blob:") || value.starts_with("data:")
}
