//! Download orchestration.
//!
//! This module provides:
//! - Single-file downloads through the host download primitive
//! - Blob-sourced and converted downloads executed inside the page
//! - Windowed batch downloads with progress notifications
//! - ZIP batch downloads built inside the page
//!
//! Every operation returns result data; collaborator failures are turned into
//! error strings on the returned value.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info, warn};
use tokio::sync::broadcast;

use crate::canonical::dedup_candidates;
use crate::config::{clamp_concurrency, PAGE_CALL_TIMEOUT, ZIP_ARCHIVE_NAME};
use crate::error_handling::HostError;
use crate::host::{DownloadHost, FrameTarget, PageBridge};
use crate::models::{
    BatchSummary, ConvertFormat, DownloadProgress, DownloadRequest, DownloadResult,
    MediaCandidate, MediaType, TabId, ZipOutcome,
};
use crate::page::{PageCall, PageOperation, PageReply, ZipItem};

/// Error reported when the page could not fetch or save blob content.
pub const BLOB_FAILURE: &str = "Cannot download blob content";
/// Error reported when the page returned no usable ZIP outcome.
pub const ZIP_FAILURE: &str = "ZIP creation failed";

const PROGRESS_CAPACITY: usize = 64;

/// Executes download requests against the host collaborators.
#[derive(Clone)]
pub struct Orchestrator {
    host: Arc<dyn DownloadHost>,
    bridge: Arc<dyn PageBridge>,
    page_call_timeout: Duration,
    progress: broadcast::Sender<DownloadProgress>,
}

impl Orchestrator {
    pub fn new(host: Arc<dyn DownloadHost>, bridge: Arc<dyn PageBridge>) -> Self {
        let (progress, _) = broadcast::channel(PROGRESS_CAPACITY);
        Self {
            host,
            bridge,
            page_call_timeout: PAGE_CALL_TIMEOUT,
            progress,
        }
    }

    /// Overrides the upper bound for a single page-context call.
    pub fn with_page_call_timeout(mut self, timeout: Duration) -> Self {
        self.page_call_timeout = timeout;
        self
    }

    /// Receives a [`DownloadProgress`] after every completed batch window.
    pub fn subscribe_progress(&self) -> broadcast::Receiver<DownloadProgress> {
        self.progress.subscribe()
    }

    /// Downloads `url` through the host primitive.
    pub async fn download(&self, url: &str, filename: &str) -> DownloadResult {
        match self.host.trigger_download(url, filename).await {
            Ok(id) => DownloadResult::started(id),
            Err(e) => {
                warn!("Download of {} failed: {}", url, e);
                DownloadResult::failed(e.to_string())
            }
        }
    }

    /// Downloads a resource only readable from inside the page of `tab`.
    pub async fn download_blob(
        &self,
        url: &str,
        filename: &str,
        tab: Option<TabId>,
    ) -> DownloadResult {
        let Some(tab) = tab else {
            return DownloadResult::failed(HostError::NoActiveTab.to_string());
        };
        let op = PageOperation::FetchAndTrigger {
            url: url.to_string(),
            filename: filename.to_string(),
        };
        match self.call_page(tab, FrameTarget::Top, op).await {
            Ok(replies) => match replies.into_iter().next() {
                Some(reply) if reply.is_saved() => DownloadResult::triggered(),
                other => {
                    debug!("Blob download of {} in {} answered {:?}", url, tab, other);
                    DownloadResult::failed(BLOB_FAILURE)
                }
            },
            Err(e) => DownloadResult::failed(e.to_string()),
        }
    }

    /// Downloads an image re-encoded as `format`.
    ///
    /// When the page cannot convert (fetch refused, undecodable bytes), the
    /// original is downloaded through [`Orchestrator::download`] instead.
    pub async fn download_converted(
        &self,
        url: &str,
        filename: &str,
        format: ConvertFormat,
        tab: Option<TabId>,
    ) -> DownloadResult {
        let Some(tab) = tab else {
            return DownloadResult::failed(HostError::NoActiveTab.to_string());
        };
        if format == ConvertFormat::Original {
            return self.download(url, filename).await;
        }
        let op = PageOperation::ConvertAndTrigger {
            url: url.to_string(),
            filename: filename.to_string(),
            format,
        };
        match self.call_page(tab, FrameTarget::Top, op).await {
            Ok(replies) => match replies.into_iter().next() {
                Some(reply) if reply.is_saved() => DownloadResult::triggered(),
                other => {
                    info!(
                        "Conversion of {} to {} failed ({:?}), downloading original",
                        url, format, other
                    );
                    self.download(url, filename).await
                }
            },
            Err(e) => DownloadResult::failed(e.to_string()),
        }
    }

    /// Downloads `items` in windows of `clamp_concurrency(max_concurrent)`.
    ///
    /// All requests of a window run concurrently and every one settles before
    /// the next window starts. Failures are counted, never propagated.
    pub async fn download_all(
        &self,
        items: &[DownloadRequest],
        max_concurrent: Option<usize>,
    ) -> BatchSummary {
        let limit = clamp_concurrency(max_concurrent);
        let total = items.len();
        let mut summary = BatchSummary {
            total,
            ..Default::default()
        };
        info!("Downloading {} items, {} at a time", total, limit);

        let mut completed = 0;
        for window in items.chunks(limit) {
            let results = join_all(window.iter().map(|item| self.download_item(item))).await;
            for (item, result) in window.iter().zip(results) {
                if !result.success {
                    summary.failed += 1;
                    summary.failed_urls.push(item.url.clone());
                }
            }
            completed += window.len();
            // No subscriber is not an error.
            let _ = self.progress.send(DownloadProgress { completed, total });
        }

        if summary.failed > 0 {
            warn!("{} of {} downloads failed", summary.failed, total);
        }
        summary
    }

    async fn download_item(&self, item: &DownloadRequest) -> DownloadResult {
        match (item.tab, item.format) {
            (Some(tab), _) if item.blob => {
                self.download_blob(&item.url, &item.filename, Some(tab)).await
            }
            (_, Some(format)) if item.media_type == MediaType::Image => {
                self.download_converted(&item.url, &item.filename, format, item.tab)
                    .await
            }
            _ => self.download(&item.url, &item.filename).await,
        }
    }

    /// Packs `items` into one archive built and saved inside the page of `tab`.
    ///
    /// Items the page fails to fetch are left out; the outcome only fails
    /// when none could be fetched.
    pub async fn download_zip(
        &self,
        items: &[DownloadRequest],
        tab: Option<TabId>,
        format: Option<ConvertFormat>,
    ) -> ZipOutcome {
        let Some(tab) = tab else {
            return ZipOutcome::failed(HostError::NoActiveTab.to_string());
        };
        let op = PageOperation::BuildZipAndTrigger {
            items: items
                .iter()
                .map(|item| ZipItem {
                    url: item.url.clone(),
                    filename: item.filename.clone(),
                    media_type: item.media_type,
                })
                .collect(),
            format: format.unwrap_or_default(),
            archive_name: ZIP_ARCHIVE_NAME.to_string(),
        };
        match self.call_page(tab, FrameTarget::Top, op).await {
            Ok(replies) => match replies.into_iter().next() {
                Some(PageReply::Zip(outcome)) if outcome.success => {
                    info!("Archived {} of {} items", outcome.count.unwrap_or(0), items.len());
                    outcome
                }
                Some(PageReply::Zip(ZipOutcome { error, .. })) => {
                    ZipOutcome::failed(error.unwrap_or_else(|| ZIP_FAILURE.to_string()))
                }
                Some(PageReply::Failed { error }) => ZipOutcome::failed(error),
                _ => ZipOutcome::failed(ZIP_FAILURE),
            },
            Err(e) => ZipOutcome::failed(e.to_string()),
        }
    }

    /// Scans every frame of `tab` and returns the combined, deduplicated list.
    ///
    /// # Errors
    ///
    /// Returns the bridge error when no frame could be scanned.
    pub async fn collect_media(&self, tab: TabId) -> Result<Vec<MediaCandidate>, HostError> {
        let replies = self
            .call_page(tab, FrameTarget::AllFrames, PageOperation::CollectMedia)
            .await?;
        let combined = replies.into_iter().flat_map(|reply| match reply {
            PageReply::Media { media } => media,
            _ => Vec::new(),
        });
        Ok(dedup_candidates(combined))
    }

    async fn call_page(
        &self,
        tab: TabId,
        target: FrameTarget,
        op: PageOperation,
    ) -> Result<Vec<PageReply>, HostError> {
        let name = op.name();
        let call = self.bridge.run_in_page(tab, target, PageCall::new(op));
        match tokio::time::timeout(self.page_call_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} in {} timed out", name, tab);
                Err(HostError::Timeout(self.page_call_timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests;
