//! Page-side executor for [`PageCall`]s.

use bytes::Bytes;
use log::{debug, warn};

use super::convert::{convert_image_blocking, is_decodable_image};
use super::protocol::{PageCall, PageOperation, PageReply, ZipItem, PAGE_PROTOCOL_VERSION};
use super::PageRuntime;
use crate::archive::{build_zip, ZipEntry};
use crate::error_handling::HostError;
use crate::extract::scan_page;
use crate::models::{ConvertFormat, MediaType, ZipOutcome};

/// Runs page operations against one document through its [`PageRuntime`].
#[derive(Debug, Clone)]
pub struct PageAgent<R> {
    runtime: R,
}

impl<R: PageRuntime> PageAgent<R> {
    pub fn new(runtime: R) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Executes `call`.
    ///
    /// Operation failures come back as [`PageReply::Failed`] (or a failed
    /// [`ZipOutcome`]); `Err` is reserved for calls the page refuses to run.
    ///
    /// # Errors
    ///
    /// `HostError::ProtocolMismatch` when `call.version` differs from
    /// [`PAGE_PROTOCOL_VERSION`]; runtime errors while capturing the document
    /// for `CollectMedia`.
    pub async fn handle(&self, call: PageCall) -> Result<PageReply, HostError> {
        if call.version != PAGE_PROTOCOL_VERSION {
            return Err(HostError::ProtocolMismatch {
                found: call.version,
                expected: PAGE_PROTOCOL_VERSION,
            });
        }
        debug!("Page operation: {}", call.op.name());

        match call.op {
            PageOperation::CollectMedia => self.collect_media().await,
            PageOperation::FetchAndTrigger { url, filename } => {
                Ok(self.fetch_and_trigger(&url, &filename).await)
            }
            PageOperation::ConvertAndTrigger {
                url,
                filename,
                format,
            } => Ok(self.convert_and_trigger(&url, &filename, format).await),
            PageOperation::BuildZipAndTrigger {
                items,
                format,
                archive_name,
            } => Ok(PageReply::Zip(
                self.build_zip_and_trigger(&items, format, &archive_name)
                    .await,
            )),
        }
    }

    async fn collect_media(&self) -> Result<PageReply, HostError> {
        let snapshot = self.runtime.snapshot().await?;
        let media = tokio::task::spawn_blocking(move || scan_page(&snapshot))
            .await
            .map_err(|e| HostError::Script(format!("extraction task failed: {}", e)))?;
        Ok(PageReply::Media { media })
    }

    async fn fetch_and_trigger(&self, url: &str, filename: &str) -> PageReply {
        let result: Result<(), HostError> = async {
            let bytes = self.runtime.fetch(url).await?;
            self.runtime.save_via_anchor(filename, bytes).await
        }
        .await;
        match result {
            Ok(()) => PageReply::Saved,
            Err(e) => {
                debug!("In-page fetch of {} failed: {}", url, e);
                PageReply::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn convert_and_trigger(&self, url: &str, filename: &str, format: ConvertFormat) -> PageReply {
        let bytes = match self.runtime.fetch(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return PageReply::Failed {
                    error: e.to_string(),
                }
            }
        };
        let converted = match convert_image_blocking(bytes, format).await {
            Ok(converted) => converted,
            Err(e) => {
                return PageReply::Failed {
                    error: e.to_string(),
                }
            }
        };
        match self.runtime.save_via_anchor(filename, converted).await {
            Ok(()) => PageReply::Saved,
            Err(e) => PageReply::Failed {
                error: e.to_string(),
            },
        }
    }

    /// Fetches items one at a time, skipping failures, and saves the archive.
    async fn build_zip_and_trigger(
        &self,
        items: &[ZipItem],
        format: ConvertFormat,
        archive_name: &str,
    ) -> ZipOutcome {
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            match self.runtime.fetch(&item.url).await {
                Ok(bytes) => {
                    let data = maybe_convert(item, bytes, format).await;
                    entries.push(ZipEntry::new(item.filename.clone(), data));
                }
                Err(e) => debug!("Skipping {} in archive: {}", item.url, e),
            }
        }

        if entries.is_empty() {
            return ZipOutcome::failed("No files fetched");
        }

        let archive = match build_zip(&entries) {
            Ok(archive) => archive,
            Err(e) => return ZipOutcome::failed(e.to_string()),
        };
        match self.runtime.save_via_anchor(archive_name, archive).await {
            Ok(()) => ZipOutcome::archived(entries.len()),
            Err(e) => ZipOutcome::failed(e.to_string()),
        }
    }
}

/// Re-encodes image items when a target format is set; any failure keeps the
/// fetched bytes.
async fn maybe_convert(item: &ZipItem, bytes: Bytes, format: ConvertFormat) -> Bytes {
    if format == ConvertFormat::Original
        || item.media_type != MediaType::Image
        || !is_decodable_image(&bytes)
    {
        return bytes;
    }
    match convert_image_blocking(bytes.clone(), format).await {
        Ok(converted) => converted,
        Err(e) => {
            warn!("Keeping original bytes for {}: {}", item.url, e);
            bytes
        }
    }
}
