//! Download primitive backed by a local directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, info};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::{decode_data_url, fetch_bytes};
use crate::error_handling::HostError;
use crate::extract::is_blob;
use crate::host::DownloadHost;
use crate::models::DownloadId;
use crate::naming::safe_file_name;

/// Writes downloads into one directory, never overwriting an existing file.
#[derive(Debug)]
pub struct DownloadDirectory {
    client: Arc<reqwest::Client>,
    dir: PathBuf,
    next_id: AtomicU64,
}

impl DownloadDirectory {
    pub fn new(client: Arc<reqwest::Client>, dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            dir: dir.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stores `bytes` under a sanitized, non-clashing version of `filename`.
    ///
    /// Names are claimed with `create_new`, so concurrent writers of the same
    /// name each get their own file: `name.ext`, then `name (1).ext`,
    /// `name (2).ext`, ...
    pub async fn write_file(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, HostError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let (path, mut file) = self.claim_path(&safe_file_name(filename)).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    async fn claim_path(&self, filename: &str) -> Result<(PathBuf, File), HostError> {
        let (stem, ext) = match filename.rfind('.') {
            Some(dot) if dot > 0 => (&filename[..dot], &filename[dot..]),
            _ => (filename, ""),
        };
        let mut n = 0u32;
        loop {
            let candidate = if n == 0 {
                self.dir.join(filename)
            } else {
                self.dir.join(format!("{} ({}){}", stem, n, ext))
            };
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(file) => return Ok((candidate, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl DownloadHost for DownloadDirectory {
    async fn trigger_download(&self, url: &str, filename: &str) -> Result<DownloadId, HostError> {
        if is_blob(url) {
            return Err(HostError::InvalidUrl(format!(
                "{} is only readable inside its page",
                url
            )));
        }
        let bytes: Bytes = if url.starts_with("data:") {
            decode_data_url(url)?
        } else {
            fetch_bytes(&self.client, url).await?
        };
        self.write_file(filename, &bytes).await?;
        let id = DownloadId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!("Download {:?} finished: {}", id, url);
        Ok(id)
    }
}
