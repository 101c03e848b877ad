//! Tagged command dispatcher.
//!
//! Requests arrive as `{"action": ..., ...}` objects and each produces exactly
//! one [`Reply`]. Failures are carried inside the reply, never returned as
//! errors.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error_handling::HostError;
use crate::models::{
    BatchSummary, ConvertFormat, DownloadRequest, DownloadResult, MediaCandidate, TabId,
    ZipOutcome,
};
use crate::orchestrator::Orchestrator;

/// A request to the background side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Command {
    Download {
        url: String,
        filename: String,
    },
    DownloadBlob {
        url: String,
        filename: String,
        #[serde(default)]
        tab: Option<TabId>,
    },
    DownloadConverted {
        url: String,
        filename: String,
        format: ConvertFormat,
        #[serde(default)]
        tab: Option<TabId>,
    },
    DownloadAll {
        items: Vec<DownloadRequest>,
        #[serde(default)]
        max_concurrent: Option<usize>,
    },
    DownloadZip {
        items: Vec<DownloadRequest>,
        #[serde(default)]
        tab: Option<TabId>,
        #[serde(default)]
        format: Option<ConvertFormat>,
    },
    /// Scan every frame of the tab.
    GetMedia {
        #[serde(default)]
        tab: Option<TabId>,
    },
}

impl Command {
    pub fn action(&self) -> &'static str {
        match self {
            Command::Download { .. } => "download",
            Command::DownloadBlob { .. } => "download-blob",
            Command::DownloadConverted { .. } => "download-converted",
            Command::DownloadAll { .. } => "download-all",
            Command::DownloadZip { .. } => "download-zip",
            Command::GetMedia { .. } => "get-media",
        }
    }
}

/// The single answer to a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "kebab-case")]
pub enum Reply {
    Download(DownloadResult),
    Batch(BatchSummary),
    Zip(ZipOutcome),
    Media { media: Vec<MediaCandidate> },
    /// The page could not be scanned.
    ScanFailed { error: String },
}

/// Routes commands to the orchestrator.
#[derive(Clone)]
pub struct Dispatcher {
    orchestrator: Orchestrator,
}

impl Dispatcher {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub async fn handle(&self, command: Command) -> Reply {
        debug!("Dispatching {}", command.action());
        let orch = &self.orchestrator;
        match command {
            Command::Download { url, filename } => {
                Reply::Download(orch.download(&url, &filename).await)
            }
            Command::DownloadBlob { url, filename, tab } => {
                Reply::Download(orch.download_blob(&url, &filename, tab).await)
            }
            Command::DownloadConverted {
                url,
                filename,
                format,
                tab,
            } => Reply::Download(orch.download_converted(&url, &filename, format, tab).await),
            Command::DownloadAll {
                items,
                max_concurrent,
            } => Reply::Batch(orch.download_all(&items, max_concurrent).await),
            Command::DownloadZip { items, tab, format } => {
                Reply::Zip(orch.download_zip(&items, tab, format).await)
            }
            Command::GetMedia { tab } => {
                let result = match tab {
                    Some(tab) => orch.collect_media(tab).await,
                    None => Err(HostError::NoActiveTab),
                };
                match result {
                    Ok(media) => Reply::Media { media },
                    Err(e) => Reply::ScanFailed {
                        error: e.to_string(),
                    },
                }
            }
        }
    }

    /// Parses a JSON command and serializes its reply.
    ///
    /// # Errors
    ///
    /// Returns the parse error for malformed or unknown commands.
    pub async fn handle_json(&self, message: &str) -> Result<String, serde_json::Error> {
        let command: Command = serde_json::from_str(message)?;
        let reply = self.handle(command).await;
        serde_json::to_string(&reply)
    }
}
