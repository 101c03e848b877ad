//! Presentation state for one open page.
//!
//! This module provides:
//! - Cache-then-live sequencing with a generation guard against stale scans
//! - Type filter, search, name sort and exclusion patterns over the list
//! - Saved-URL tracking and the summary line
//!
//! The state is owned by the shell and passed to handlers explicitly; the
//! scanning and download layers keep no state of their own.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};

use crate::cache::ScanCache;
use crate::canonical::{dedup_candidates, same_media};
use crate::config::Preferences;
use crate::models::{BatchSummary, DownloadRequest, MediaCandidate, MediaType, TabId};
use crate::naming::filename_from_url;
use crate::orchestrator::Orchestrator;

/// Summary shown when neither the cache nor a live scan produced a list.
pub const SCAN_FAILED_SUMMARY: &str = "Could not scan this page";

/// Which media types are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Only(MediaType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Discovery order
    #[default]
    Default,
    NameAsc,
    NameDesc,
}

/// Identifies one scan request. Only the newest ticket may update the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTicket(u64);

/// What applying a scan result did to the displayed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanApplied {
    /// A newer scan was started since; the result was dropped.
    Stale,
    /// Same `(url, type)` sequence as displayed; nothing changed.
    Unchanged,
    Replaced,
}

/// Age of the cached list on display, against the preferred TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachedList {
    Fresh,
    Stale,
}

/// Media counts per type across the whole (unfiltered) list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCounts {
    pub images: usize,
    pub videos: usize,
    pub audio: usize,
}

impl TypeCounts {
    pub fn of(&self, media_type: MediaType) -> usize {
        match media_type {
            MediaType::Image => self.images,
            MediaType::Video => self.videos,
            MediaType::Audio => self.audio,
        }
    }
}

/// Application state of the popup-equivalent shell.
#[derive(Debug, Default)]
pub struct AppState {
    tab: Option<TabId>,
    page_url: Option<String>,
    media: Vec<MediaCandidate>,
    filter: TypeFilter,
    sort: SortOrder,
    search: String,
    exclusions: Vec<String>,
    saved: HashSet<String>,
    generation: u64,
    scan_failed: bool,
    cache_ttl: Duration,
    /// Set while the displayed list is the cached one.
    cached: Option<CachedList>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            cache_ttl: Preferences::default().cache_ttl(),
            ..Self::default()
        }
    }

    pub fn tab(&self) -> Option<TabId> {
        self.tab
    }

    pub fn page_url(&self) -> Option<&str> {
        self.page_url.as_deref()
    }

    /// Whether the list on display still comes from the scan cache.
    pub fn cached(&self) -> Option<CachedList> {
        self.cached
    }

    /// Full deduplicated list, ignoring filter, search and exclusions.
    pub fn media(&self) -> &[MediaCandidate] {
        &self.media
    }

    /// Switches to a new page, clearing the list and invalidating pending scans.
    pub fn open_page(&mut self, tab: TabId, page_url: impl Into<String>) {
        self.tab = Some(tab);
        self.page_url = Some(page_url.into());
        self.media.clear();
        self.scan_failed = false;
        self.cached = None;
        self.generation += 1;
    }

    /// Starts a scan; results must be applied with the returned ticket.
    pub fn begin_scan(&mut self) -> ScanTicket {
        self.generation += 1;
        ScanTicket(self.generation)
    }

    /// Shows a cached list immediately, before any live result arrives.
    pub fn show_cached(&mut self, media: Vec<MediaCandidate>) {
        self.media = dedup_candidates(media);
        self.scan_failed = false;
    }

    /// Applies a live scan result.
    ///
    /// Dropped when `ticket` is not the newest; replaces the list only when
    /// its `(url, type)` sequence differs from what is displayed.
    pub fn apply_scan(&mut self, ticket: ScanTicket, fresh: Vec<MediaCandidate>) -> ScanApplied {
        if ticket.0 != self.generation {
            debug!("Dropping result of superseded scan {}", ticket.0);
            return ScanApplied::Stale;
        }
        self.scan_failed = false;
        self.cached = None;
        let fresh = dedup_candidates(fresh);
        if same_media(&self.media, &fresh) {
            return ScanApplied::Unchanged;
        }
        self.media = fresh;
        ScanApplied::Replaced
    }

    /// Records that the live scan for `ticket` failed.
    ///
    /// Only visible when nothing (not even a cached list) is displayed.
    pub fn fail_scan(&mut self, ticket: ScanTicket) {
        if ticket.0 == self.generation && self.media.is_empty() {
            self.scan_failed = true;
        }
    }

    /// Cache-then-live load of the page in `tab`.
    ///
    /// The cached list (if any) is shown first; the live scan always runs,
    /// its raw result is written back to the cache and replaces the list
    /// only when it differs.
    pub async fn load_page(
        &mut self,
        cache: &ScanCache,
        orchestrator: &Orchestrator,
        tab: TabId,
        page_url: &str,
    ) -> ScanApplied {
        self.open_page(tab, page_url);
        if let Some(entry) = cache.get(page_url).await {
            let age = if entry.is_fresh(self.cache_ttl, Utc::now().timestamp_millis()) {
                CachedList::Fresh
            } else {
                CachedList::Stale
            };
            info!(
                "Showing {} cached items for {} ({:?})",
                entry.media.len(),
                entry.page_url,
                age
            );
            self.show_cached(entry.media);
            self.cached = Some(age);
        }

        let ticket = self.begin_scan();
        match orchestrator.collect_media(tab).await {
            Ok(fresh) => {
                cache.put(page_url, &fresh).await;
                self.apply_scan(ticket, fresh)
            }
            Err(e) => {
                info!("Live scan of {} failed: {}", page_url, e);
                self.fail_scan(ticket);
                ScanApplied::Unchanged
            }
        }
    }

    /// The requested filter, reset to [`TypeFilter::All`] when no item of
    /// that type is present.
    pub fn filter(&self) -> TypeFilter {
        match self.filter {
            TypeFilter::Only(t) if self.counts().of(t) == 0 => TypeFilter::All,
            filter => filter,
        }
    }

    pub fn set_filter(&mut self, filter: TypeFilter) {
        self.filter = filter;
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
    }

    /// Case-insensitive substring query over URL and derived filename.
    pub fn set_search(&mut self, query: &str) {
        self.search = query.trim().to_lowercase();
    }

    /// Exclusion patterns and cache TTL from `preferences`.
    pub fn apply_preferences(&mut self, preferences: &Preferences) {
        self.exclusions = preferences.exclusions();
        self.cache_ttl = preferences.cache_ttl();
    }

    pub fn counts(&self) -> TypeCounts {
        let mut counts = TypeCounts::default();
        for item in &self.media {
            match item.media_type {
                MediaType::Image => counts.images += 1,
                MediaType::Video => counts.videos += 1,
                MediaType::Audio => counts.audio += 1,
            }
        }
        counts
    }

    /// The list as displayed: excluded, filtered, searched and sorted.
    pub fn visible(&self) -> Vec<&MediaCandidate> {
        let filter = self.filter();
        let mut items: Vec<&MediaCandidate> = self
            .media
            .iter()
            .filter(|item| !self.is_excluded(&item.url))
            .filter(|item| match filter {
                TypeFilter::All => true,
                TypeFilter::Only(t) => item.media_type == t,
            })
            .filter(|item| self.matches_search(item))
            .collect();

        match self.sort {
            SortOrder::Default => {}
            SortOrder::NameAsc => items.sort_by(|a, b| compare_names(&a.url, &b.url)),
            SortOrder::NameDesc => items.sort_by(|a, b| compare_names(&b.url, &a.url)),
        }
        items
    }

    fn is_excluded(&self, url: &str) -> bool {
        if self.exclusions.is_empty() {
            return false;
        }
        let url = url.to_lowercase();
        self.exclusions.iter().any(|pattern| url.contains(pattern))
    }

    fn matches_search(&self, item: &MediaCandidate) -> bool {
        self.search.is_empty()
            || item.url.to_lowercase().contains(&self.search)
            || filename_from_url(&item.url)
                .to_lowercase()
                .contains(&self.search)
    }

    /// Download requests for every visible, downloadable item.
    pub fn batch_requests(&self) -> Vec<DownloadRequest> {
        self.visible()
            .into_iter()
            .filter(|item| item.is_downloadable())
            .map(|item| DownloadRequest::from_candidate(item, self.tab))
            .collect()
    }

    /// Requests for the items of `requests` whose URL is in `failed_urls`.
    pub fn retry_requests(
        requests: &[DownloadRequest],
        failed_urls: &[String],
    ) -> Vec<DownloadRequest> {
        requests
            .iter()
            .filter(|request| failed_urls.contains(&request.url))
            .cloned()
            .collect()
    }

    /// Marks the requests that did not fail as saved.
    pub fn record_batch(&mut self, requests: &[DownloadRequest], summary: &BatchSummary) {
        for request in requests {
            if !summary.failed_urls.contains(&request.url) {
                self.saved.insert(request.url.clone());
            }
        }
    }

    pub fn is_saved(&self, url: &str) -> bool {
        self.saved.contains(url)
    }

    pub fn restore_saved(&mut self, urls: impl IntoIterator<Item = String>) {
        self.saved.extend(urls);
    }

    /// Saved URLs in a stable order for persistence.
    pub fn saved_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.saved.iter().cloned().collect();
        urls.sort();
        urls
    }

    /// `Found 3 images, 1 video, 2 audio`; the audio part only when present.
    pub fn summary(&self) -> String {
        if self.scan_failed {
            return SCAN_FAILED_SUMMARY.to_string();
        }
        let counts = self.counts();
        let mut text = format!(
            "Found {} image{}, {} video{}",
            counts.images,
            plural(counts.images),
            counts.videos,
            plural(counts.videos)
        );
        if counts.audio > 0 {
            text.push_str(&format!(", {} audio", counts.audio));
        }
        text
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    let (a, b) = (filename_from_url(a), filename_from_url(b));
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(&b))
}

#[cfg(test)]
mod tests;
