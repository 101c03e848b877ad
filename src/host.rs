//! Host collaborator interfaces.
//!
//! The orchestrator never talks to a browser or the filesystem directly; it
//! goes through these two seams, implemented by `native` for the CLI and by
//! test doubles in the test suites.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error_handling::HostError;
use crate::models::{DownloadId, TabId};
use crate::page::{PageCall, PageReply};

/// The host's standard download primitive.
#[async_trait]
pub trait DownloadHost: Send + Sync {
    /// Starts downloading `url` as `filename`.
    async fn trigger_download(&self, url: &str, filename: &str) -> Result<DownloadId, HostError>;
}

/// Which frames of a tab a page call runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameTarget {
    /// Top-level document only
    #[default]
    Top,
    /// Every frame, top-level first
    AllFrames,
}

/// Runs a [`PageCall`] inside a tab's page context(s).
#[async_trait]
pub trait PageBridge: Send + Sync {
    /// Executes `call` in the frames selected by `target`; one reply per frame.
    async fn run_in_page(
        &self,
        tab: TabId,
        target: FrameTarget,
        call: PageCall,
    ) -> Result<Vec<PageReply>, HostError>;
}
