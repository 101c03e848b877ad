//! Extension-based media classification.

use url::Url;

use crate::models::MediaType;

const IMAGE_EXT: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".bmp", ".ico", ".avif", ".tiff", ".tif",
];

const VIDEO_EXT: &[&str] = &[
    ".mp4", ".webm", ".ogg", ".ogv", ".mov", ".avi", ".mkv", ".m4v", ".flv", ".wmv",
];

const AUDIO_EXT: &[&str] = &[".mp3", ".wav", ".flac", ".aac", ".m4a", ".wma", ".opus", ".oga"];

/// Adaptive-streaming manifests (HLS, DASH)
const STREAM_EXT: &[&str] = &[".m3u8", ".mpd"];

/// Lowercased extension of the URL path, including the dot.
///
/// Query and fragment are ignored; a dot in a directory name yields a value
/// that matches no table.
pub fn extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let path = parsed.path().to_lowercase();
    let dot = path.rfind('.')?;
    Some(path[dot..].to_string())
}

/// Media type implied by the URL's extension. Stream manifests count as video.
pub fn classify_url(url: &str) -> Option<MediaType> {
    let ext = extension(url)?;
    let ext = ext.as_str();
    if IMAGE_EXT.contains(&ext) {
        Some(MediaType::Image)
    } else if VIDEO_EXT.contains(&ext) || STREAM_EXT.contains(&ext) {
        Some(MediaType::Video)
    } else if AUDIO_EXT.contains(&ext) {
        Some(MediaType::Audio)
    } else {
        None
    }
}

pub fn is_stream_url(url: &str) -> bool {
    extension(url).is_some_and(|ext| STREAM_EXT.contains(&ext.as_str()))
}

/// Media type named by a `<source type="...">` MIME attribute.
pub fn classify_mime(mime: &str) -> Option<MediaType> {
    if mime.starts_with("audio") {
        Some(MediaType::Audio)
    } else if mime.starts_with("video") {
        Some(MediaType::Video)
    } else {
        None
    }
}
