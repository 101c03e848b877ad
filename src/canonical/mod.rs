//! URL canonicalization and candidate deduplication.
//!
//! Two tiers:
//! 1. exact literal URL
//! 2. identity key: the URL with resolution/format-only query parameters
//!    removed, so CDN size variants of one asset collapse into one entry
//!
//! Page identity (the scan cache key) is a separate notion that strips only
//! the fragment.

use std::collections::{HashMap, HashSet};

use url::Url;

use crate::models::MediaCandidate;

/// Query parameters that only select size, quality or encoding of an asset.
pub const RESOLUTION_PARAMS: &[&str] = &[
    "width", "height", "w", "h", "size", "resize", "quality", "q", "dpr", "fit", "crop", "auto",
    "format", "fm", "fl", "s",
];

/// Query parameters read as the asset's requested width.
const WIDTH_PARAMS: &[&str] = &["width", "w"];

/// Canonical identity key of a media URL.
///
/// `data:` and `blob:` URIs, and strings that do not parse as URLs, are their
/// own identity.
pub fn identity_key(url: &str) -> String {
    if url.starts_with("data:") || url.starts_with("blob:") {
        return url.to_string();
    }
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if parsed.query().is_none() {
        return parsed.into();
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !RESOLUTION_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }
    parsed.into()
}

/// Width requested by the URL's `width` / `w` query parameter, if numeric.
pub fn width_hint(url: &str) -> Option<u64> {
    if url.starts_with("data:") || url.starts_with("blob:") {
        return None;
    }
    let parsed = Url::parse(url).ok()?;
    let hint = parsed
        .query_pairs()
        .filter(|(key, _)| WIDTH_PARAMS.contains(&key.as_ref()))
        .find_map(|(_, value)| value.trim().parse::<u64>().ok());
    hint
}

/// Canonical page identity used as the scan cache key: the URL without its
/// fragment. Query parameters are kept.
pub fn page_identity(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => url.split('#').next().unwrap_or(url).to_string(),
    }
}

/// Collapses a raw candidate stream into a list with unique identity keys.
///
/// Order follows first discovery. When two literal URLs share an identity
/// key, the later one replaces the kept entry (in place) only if both carry a
/// width hint and the later hint is strictly larger.
pub fn dedup_candidates(candidates: impl IntoIterator<Item = MediaCandidate>) -> Vec<MediaCandidate> {
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut by_identity: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<MediaCandidate> = Vec::new();

    for candidate in candidates {
        if !seen_urls.insert(candidate.url.clone()) {
            continue;
        }

        let key = identity_key(&candidate.url);
        match by_identity.get(&key) {
            None => {
                by_identity.insert(key, out.len());
                out.push(candidate);
            }
            Some(&index) => {
                let kept = width_hint(&out[index].url);
                let incoming = width_hint(&candidate.url);
                if let (Some(kept), Some(incoming)) = (kept, incoming) {
                    if incoming > kept {
                        log::trace!(
                            "Replacing {} with wider variant {}",
                            out[index].url,
                            candidate.url
                        );
                        out[index] = candidate;
                    }
                }
            }
        }
    }

    out
}

/// Cheap list equality over `(url, type)` pairs, in order.
pub fn same_media(a: &[MediaCandidate], b: &[MediaCandidate]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| x.url == y.url && x.media_type == y.media_type)
}
