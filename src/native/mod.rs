//! Native host: the collaborators the CLI runs the orchestrator against.
//!
//! - [`DownloadDirectory`]: the download primitive, writing into a folder
//! - [`NativePage`]: a page runtime for a document fetched over HTTP, with an
//!   in-memory `blob:` registry
//! - [`LocalBridge`]: routes page calls to per-frame agents of open tabs

mod bridge;
mod downloads;
mod page;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;

use crate::error_handling::{categorize_status, HostError};

// Re-export public API
pub use bridge::LocalBridge;
pub use downloads::DownloadDirectory;
pub use page::{NativePage, MAX_FRAMES};

/// GETs `url` and returns its body, treating non-2xx statuses as failures.
pub(crate) async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Bytes, HostError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(HostError::Fetch {
            kind: categorize_status(status.as_u16()),
            message: format!("HTTP {} for {}", status.as_u16(), url),
        });
    }
    Ok(response.bytes().await?)
}

/// Decodes the payload of a `data:` URI.
///
/// Base64 payloads (`;base64` in the header) are decoded as such, ignoring
/// embedded whitespace; anything else is percent-decoded.
pub fn decode_data_url(url: &str) -> Result<Bytes, HostError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| HostError::InvalidUrl(truncate_for_error(url)))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| HostError::InvalidUrl(truncate_for_error(url)))?;

    let is_base64 = header
        .split(';')
        .any(|param| param.trim().eq_ignore_ascii_case("base64"));
    if is_base64 {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(compact.as_bytes())
            .map(Bytes::from)
            .map_err(|e| HostError::InvalidUrl(format!("bad base64 data URI: {}", e)))
    } else {
        Ok(Bytes::from(urlencoding::decode_binary(payload.as_bytes()).into_owned()))
    }
}

fn truncate_for_error(url: &str) -> String {
    url.chars().take(64).collect()
}
