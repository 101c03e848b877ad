//! Third-party video player embeds.
//!
//! An `<iframe>` whose source matches a known player is reported as the
//! provider's public watch page, flagged as an embed (not directly
//! downloadable).

use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

use super::admission::Collector;
use super::Scope;
use crate::utils::{compile_regex_unsafe, parse_selector_unsafe};

const YOUTUBE_EMBED_PATTERN: &str = r"youtube\.com/embed/([a-zA-Z0-9_-]+)";
const YOUTUBE_NOCOOKIE_EMBED_PATTERN: &str = r"youtube-nocookie\.com/embed/([a-zA-Z0-9_-]+)";
const VIMEO_EMBED_PATTERN: &str = r"player\.vimeo\.com/video/(\d+)";
const DAILYMOTION_EMBED_PATTERN: &str = r"dailymotion\.com/embed/video/([a-zA-Z0-9]+)";

const IFRAME_SELECTOR_STR: &str = "iframe[src]";

static YOUTUBE_EMBED_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(YOUTUBE_EMBED_PATTERN, "YOUTUBE_EMBED_RE"));
static YOUTUBE_NOCOOKIE_EMBED_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(YOUTUBE_NOCOOKIE_EMBED_PATTERN, "YOUTUBE_NOCOOKIE_EMBED_RE")
});
static VIMEO_EMBED_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(VIMEO_EMBED_PATTERN, "VIMEO_EMBED_RE"));
static DAILYMOTION_EMBED_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(DAILYMOTION_EMBED_PATTERN, "DAILYMOTION_EMBED_RE"));

static IFRAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe(IFRAME_SELECTOR_STR, "IFRAME_SELECTOR"));

/// Known players in match order, each with its watch-page prefix.
fn embed_patterns() -> [(&'static Regex, &'static str); 4] {
    [
        (&*YOUTUBE_EMBED_RE, "https://www.youtube.com/watch?v="),
        (&*YOUTUBE_NOCOOKIE_EMBED_RE, "https://www.youtube.com/watch?v="),
        (&*VIMEO_EMBED_RE, "https://vimeo.com/"),
        (&*DAILYMOTION_EMBED_RE, "https://www.dailymotion.com/video/"),
    ]
}

/// Rewrites a player iframe URL to the provider's watch page.
///
/// Returns `None` for sources that match no known player. The first matching
/// pattern wins.
///
/// # Examples
///
/// ```
/// use media_harvest::extract::rewrite_embed_url;
///
/// assert_eq!(
///     rewrite_embed_url("https://player.vimeo.com/video/76979871?h=8272103f6e").as_deref(),
///     Some("https://vimeo.com/76979871")
/// );
/// ```
pub fn rewrite_embed_url(src: &str) -> Option<String> {
    embed_patterns().into_iter().find_map(|(re, watch_prefix)| {
        re.captures(src)
            .and_then(|caps| caps.get(1))
            .map(|id| format!("{}{}", watch_prefix, id.as_str()))
    })
}

pub(crate) fn collect_embeds(scope: &Scope, collector: &mut Collector) {
    for iframe in scope.deep_select(&IFRAME_SELECTOR) {
        let Some(src) = iframe.value().attr("src").and_then(|s| scope.resolve(s)) else {
            continue;
        };
        if let Some(watch_url) = rewrite_embed_url(&src) {
            collector.add_embed(&watch_url);
        }
    }
}
