//! Page runtime for documents fetched over HTTP.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use super::{decode_data_url, fetch_bytes, DownloadDirectory};
use crate::error_handling::HostError;
use crate::extract::{is_blob, rewrite_embed_url, PageSnapshot};
use crate::page::PageRuntime;
use crate::utils::parse_selector_unsafe;

/// Child frames loaded alongside a page.
pub const MAX_FRAMES: usize = 8;

static IFRAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("iframe[src]", "IFRAME_SELECTOR"));

/// One document: its markup, a `blob:` registry and the download folder that
/// receives anchor saves.
pub struct NativePage {
    client: Arc<reqwest::Client>,
    url: String,
    html: String,
    downloads: Arc<DownloadDirectory>,
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl NativePage {
    /// Fetches `url` and wraps the returned markup.
    pub async fn load(
        client: Arc<reqwest::Client>,
        url: &str,
        downloads: Arc<DownloadDirectory>,
    ) -> Result<Self, HostError> {
        let body = fetch_bytes(&client, url).await?;
        let html = String::from_utf8_lossy(&body).into_owned();
        Ok(Self::from_html(client, url, html, downloads))
    }

    pub fn from_html(
        client: Arc<reqwest::Client>,
        url: impl Into<String>,
        html: impl Into<String>,
        downloads: Arc<DownloadDirectory>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            html: html.into(),
            downloads,
            blobs: RwLock::new(HashMap::new()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Makes `bytes` readable at `blob_url` from inside this page.
    pub fn register_blob(&self, blob_url: impl Into<String>, bytes: impl Into<Bytes>) {
        if let Ok(mut blobs) = self.blobs.write() {
            blobs.insert(blob_url.into(), bytes.into());
        }
    }

    /// Absolute `http(s)` iframe sources worth loading as frames. Known
    /// player embeds are skipped: they are reported as embeds instead.
    pub fn frame_urls(&self) -> Vec<String> {
        let Ok(base) = Url::parse(&self.url) else {
            return Vec::new();
        };
        let document = Html::parse_document(&self.html);
        let mut urls: Vec<String> = Vec::new();
        for iframe in document.select(&IFRAME_SELECTOR) {
            let Some(src) = iframe.value().attr("src") else {
                continue;
            };
            let Ok(resolved) = base.join(src.trim()) else {
                continue;
            };
            if !matches!(resolved.scheme(), "http" | "https") {
                continue;
            }
            let resolved = String::from(resolved);
            if rewrite_embed_url(&resolved).is_some() || urls.contains(&resolved) {
                continue;
            }
            urls.push(resolved);
            if urls.len() == MAX_FRAMES {
                break;
            }
        }
        urls
    }

    fn lookup_blob(&self, url: &str) -> Option<Bytes> {
        self.blobs.read().ok()?.get(url).cloned()
    }
}

#[async_trait]
impl PageRuntime for NativePage {
    async fn fetch(&self, url: &str) -> Result<Bytes, HostError> {
        if is_blob(url) {
            return self
                .lookup_blob(url)
                .ok_or_else(|| HostError::InvalidUrl(format!("{} has been revoked", url)));
        }
        if url.starts_with("data:") {
            return decode_data_url(url);
        }
        let absolute = Url::parse(&self.url)
            .and_then(|base| base.join(url))
            .map_err(|e| HostError::InvalidUrl(format!("{}: {}", url, e)))?;
        fetch_bytes(&self.client, absolute.as_str()).await
    }

    async fn save_via_anchor(&self, filename: &str, bytes: Bytes) -> Result<(), HostError> {
        self.downloads.write_file(filename, &bytes).await.map(|_| ())
    }

    async fn snapshot(&self) -> Result<PageSnapshot, HostError> {
        Ok(PageSnapshot::new(self.url.clone(), self.html.clone()))
    }
}
