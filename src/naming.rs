//! Download filename derivation.

use url::Url;

use crate::models::ConvertFormat;

/// Longest filename (in characters) derived from a URL path.
const MAX_FILENAME_CHARS: usize = 80;
const FALLBACK_FILENAME: &str = "file";

/// Derives a download filename from a media URL.
///
/// - `data:` URIs become `data.<subtype>` (`data:image/svg+xml;...` -> `data.svg`)
/// - other URLs use their last non-empty path segment, percent-decoded and
///   capped at 80 characters
/// - anything unparsable falls back to `file`
pub fn filename_from_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("data:") {
        let mime = rest.split([';', ',']).next().unwrap_or_default();
        let ext = mime
            .split('/')
            .nth(1)
            .and_then(|subtype| subtype.split('+').next())
            .filter(|ext| !ext.is_empty())
            .unwrap_or("bin");
        return format!("data.{}", ext);
    }

    let Ok(parsed) = Url::parse(url) else {
        return FALLBACK_FILENAME.to_string();
    };

    // blob:https://host/uuid keeps the inner URL as its path
    let path = if parsed.scheme() == "blob" {
        Url::parse(parsed.path())
            .map(|inner| inner.path().to_string())
            .unwrap_or_else(|_| parsed.path().to_string())
    } else {
        parsed.path().to_string()
    };

    let last = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .unwrap_or(FALLBACK_FILENAME);

    let decoded = urlencoding::decode(last)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| last.to_string());

    decoded.chars().take(MAX_FILENAME_CHARS).collect()
}

/// Makes `name` safe to use as a single path component.
///
/// Path separators, characters reserved on common filesystems and control
/// characters become `_`; leading dots are dropped so the result is never
/// hidden or a parent reference.
pub fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Replaces the extension of `filename` with the one matching `format`.
/// [`ConvertFormat::Original`] leaves the name untouched.
pub fn with_format_extension(filename: &str, format: ConvertFormat) -> String {
    let ext = match format {
        ConvertFormat::Original => return filename.to_string(),
        ConvertFormat::Jpg => "jpg",
        ConvertFormat::Png => "png",
    };
    let stem = match filename.rfind('.') {
        Some(dot) if dot > 0 => &filename[..dot],
        _ => filename,
    };
    format!("{}.{}", stem, ext)
}
