//! Live media list for a page, refreshed on DOM mutations.
//!
//! This is the page-side hook for hosts that observe the live DOM and report
//! its mutations; the native host has no mutation source and rescans on every
//! `CollectMedia` instead.
//!
//! Mutation reports are coalesced: while a rescan is scheduled, further
//! reports are no-ops and are picked up by that rescan. The slot is released
//! right before the scan reads the document, so a mutation that lands during
//! extraction schedules one more pass. Each pass is stamped with a generation
//! and only the newest one may publish, so a slow older pass never replaces
//! the result of a newer one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::watch;

use super::PageRuntime;
use crate::canonical::same_media;
use crate::config::RESCAN_DEBOUNCE;
use crate::error_handling::HostError;
use crate::extract::scan_page;
use crate::models::MediaCandidate;

/// Attributes whose changes can add, remove or swap media.
pub const WATCHED_ATTRIBUTES: &[&str] = &[
    "src",
    "srcset",
    "href",
    "poster",
    "style",
    "data-src",
    "data-lazy",
    "data-original",
    "data-lazy-src",
    "data-hi-res-src",
];

/// A DOM change reported by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomMutation {
    /// Nodes were added to or removed from the observed subtree.
    ChildList,
    /// An attribute changed on some element.
    Attribute(String),
}

impl DomMutation {
    pub fn triggers_rescan(&self) -> bool {
        match self {
            DomMutation::ChildList => true,
            DomMutation::Attribute(name) => WATCHED_ATTRIBUTES
                .iter()
                .any(|watched| watched.eq_ignore_ascii_case(name)),
        }
    }
}

/// Single-slot pending-task queue: at most one task is scheduled at a time.
#[derive(Debug, Default)]
pub struct PendingSlot {
    occupied: AtomicBool,
}

impl PendingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot. Returns `false` when a task is already pending.
    pub fn try_schedule(&self) -> bool {
        self.occupied
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Frees the slot so the next trigger schedules a new task.
    pub fn release(&self) {
        self.occupied.store(false, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.occupied.load(Ordering::Acquire)
    }
}

/// Keeps the last extraction result of one page current.
pub struct MediaWatcher<R> {
    runtime: Arc<R>,
    slot: Arc<PendingSlot>,
    generation: Arc<AtomicU64>,
    latest: Arc<watch::Sender<Vec<MediaCandidate>>>,
    debounce: Duration,
}

impl<R: PageRuntime + 'static> MediaWatcher<R> {
    /// Scans the page once and starts answering from that result.
    pub async fn start(runtime: Arc<R>) -> Result<Self, HostError> {
        Self::with_debounce(runtime, RESCAN_DEBOUNCE).await
    }

    pub async fn with_debounce(runtime: Arc<R>, debounce: Duration) -> Result<Self, HostError> {
        let media = rescan(runtime.as_ref()).await?;
        let (latest, _) = watch::channel(media);
        Ok(Self {
            runtime,
            slot: Arc::new(PendingSlot::new()),
            generation: Arc::new(AtomicU64::new(0)),
            latest: Arc::new(latest),
            debounce,
        })
    }

    /// The most recent media list.
    pub fn current(&self) -> Vec<MediaCandidate> {
        self.latest.borrow().clone()
    }

    /// Receiver that wakes whenever the list changes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<MediaCandidate>> {
        self.latest.subscribe()
    }

    pub fn is_rescan_pending(&self) -> bool {
        self.slot.is_pending()
    }

    /// Reports a DOM mutation. Returns whether it scheduled a new rescan.
    pub fn notify(&self, mutation: &DomMutation) -> bool {
        if !mutation.triggers_rescan() || !self.slot.try_schedule() {
            return false;
        }

        let runtime = Arc::clone(&self.runtime);
        let slot = Arc::clone(&self.slot);
        let generation = Arc::clone(&self.generation);
        let latest = Arc::clone(&self.latest);
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let stamp = generation.fetch_add(1, Ordering::AcqRel) + 1;
            slot.release();
            match rescan(runtime.as_ref()).await {
                Ok(media) => {
                    // Checked under the channel lock, so publishes stay ordered.
                    let changed = latest.send_if_modified(|current| {
                        if generation.load(Ordering::Acquire) != stamp {
                            debug!("Dropping superseded rescan #{}", stamp);
                            false
                        } else if same_media(current, &media) {
                            false
                        } else {
                            *current = media;
                            true
                        }
                    });
                    if changed {
                        debug!("Media list changed after DOM mutation");
                    }
                }
                Err(e) => warn!("Rescan after DOM mutation failed: {}", e),
            }
        });
        true
    }
}

async fn rescan<R: PageRuntime>(runtime: &R) -> Result<Vec<MediaCandidate>, HostError> {
    let snapshot = runtime.snapshot().await?;
    tokio::task::spawn_blocking(move || scan_page(&snapshot))
        .await
        .map_err(|e| HostError::Script(format!("extraction task failed: {}", e)))
}
