//! Tests for presentation state.

use std::sync::Arc;

use async_trait::async_trait;

use super::*;
use crate::error_handling::HostError;
use crate::host::{DownloadHost, FrameTarget, PageBridge};
use crate::models::{DownloadId, MediaSource};
use crate::page::{PageCall, PageReply};
use crate::storage::test_helpers::create_test_pool;

fn image(url: &str) -> MediaCandidate {
    MediaCandidate::new(url, MediaType::Image, MediaSource::Img)
}

fn video(url: &str) -> MediaCandidate {
    MediaCandidate::new(url, MediaType::Video, MediaSource::Video)
}

fn urls(items: &[&MediaCandidate]) -> Vec<String> {
    items.iter().map(|m| m.url.clone()).collect()
}

fn loaded(media: Vec<MediaCandidate>) -> AppState {
    let mut state = AppState::new();
    state.open_page(TabId(1), "https://x.com/page");
    let ticket = state.begin_scan();
    state.apply_scan(ticket, media);
    state
}

#[test]
fn test_superseded_scan_is_dropped() {
    let mut state = AppState::new();
    state.open_page(TabId(1), "https://x.com/page");
    let slow = state.begin_scan();
    let fast = state.begin_scan();

    assert_eq!(
        state.apply_scan(fast, vec![image("https://x.com/new.jpg")]),
        ScanApplied::Replaced
    );
    assert_eq!(
        state.apply_scan(slow, vec![image("https://x.com/old.jpg")]),
        ScanApplied::Stale
    );
    assert_eq!(state.media()[0].url, "https://x.com/new.jpg");
}

#[test]
fn test_equal_scan_leaves_list_untouched() {
    let mut state = AppState::new();
    state.open_page(TabId(1), "https://x.com/page");
    state.show_cached(vec![image("https://x.com/a.jpg")]);

    let ticket = state.begin_scan();
    // Source differs but (url, type) does not.
    let fresh = vec![MediaCandidate::new(
        "https://x.com/a.jpg",
        MediaType::Image,
        MediaSource::Lazy,
    )];
    assert_eq!(state.apply_scan(ticket, fresh), ScanApplied::Unchanged);
    assert_eq!(state.media()[0].source, MediaSource::Img);
}

#[test]
fn test_open_page_invalidates_pending_scan() {
    let mut state = AppState::new();
    state.open_page(TabId(1), "https://x.com/one");
    let ticket = state.begin_scan();
    state.open_page(TabId(2), "https://x.com/two");
    assert_eq!(
        state.apply_scan(ticket, vec![image("https://x.com/a.jpg")]),
        ScanApplied::Stale
    );
    assert!(state.media().is_empty());
}

#[test]
fn test_filter_resets_when_type_absent() {
    let mut state = loaded(vec![image("https://x.com/a.jpg"), video("https://x.com/v.mp4")]);
    state.set_filter(TypeFilter::Only(MediaType::Video));
    assert_eq!(urls(&state.visible()), vec!["https://x.com/v.mp4"]);

    state.set_filter(TypeFilter::Only(MediaType::Audio));
    assert_eq!(state.filter(), TypeFilter::All);
    assert_eq!(state.visible().len(), 2);
}

#[test]
fn test_search_matches_url_and_filename() {
    let mut state = loaded(vec![
        image("https://x.com/photos/Sunset%20Beach.jpg"),
        image("https://cdn.other.org/a.png"),
    ]);
    state.set_search("  sunset beach ");
    assert_eq!(
        urls(&state.visible()),
        vec!["https://x.com/photos/Sunset%20Beach.jpg"]
    );
    state.set_search("OTHER.org");
    assert_eq!(urls(&state.visible()), vec!["https://cdn.other.org/a.png"]);
}

#[test]
fn test_exclusions_hide_matching_urls() {
    let mut state = loaded(vec![
        image("https://Tracking.Example.com/p.gif"),
        image("https://x.com/thumb/a.jpg"),
        image("https://x.com/full/a.jpg"),
    ]);
    state.apply_preferences(&Preferences {
        exclude_patterns: "tracking.example.com\n/THUMB/".into(),
        ..Default::default()
    });
    assert_eq!(urls(&state.visible()), vec!["https://x.com/full/a.jpg"]);
    assert_eq!(state.counts().images, 3);
}

#[test]
fn test_name_sort() {
    let mut state = loaded(vec![
        image("https://x.com/b.jpg"),
        image("https://x.com/C.jpg"),
        image("https://x.com/a.jpg"),
    ]);
    state.set_sort(SortOrder::NameAsc);
    assert_eq!(
        urls(&state.visible()),
        vec!["https://x.com/a.jpg", "https://x.com/b.jpg", "https://x.com/C.jpg"]
    );
    state.set_sort(SortOrder::NameDesc);
    assert_eq!(state.visible()[0].url, "https://x.com/C.jpg");
    state.set_sort(SortOrder::Default);
    assert_eq!(state.visible()[0].url, "https://x.com/b.jpg");
}

#[test]
fn test_summary_line() {
    let state = loaded(vec![image("https://x.com/a.jpg")]);
    assert_eq!(state.summary(), "Found 1 image, 0 videos");

    let state = loaded(vec![
        image("https://x.com/a.jpg"),
        image("https://x.com/b.jpg"),
        video("https://x.com/v.mp4"),
        MediaCandidate::new("https://x.com/s.mp3", MediaType::Audio, MediaSource::Audio),
    ]);
    assert_eq!(state.summary(), "Found 2 images, 1 video, 1 audio");
}

#[test]
fn test_batch_requests_skip_embeds() {
    let mut embed = video("https://www.youtube.com/watch?v=abc");
    embed.embed = true;
    let mut blob = video("blob:https://x.com/1");
    blob.blob = true;
    let state = loaded(vec![image("https://x.com/a.jpg"), embed, blob]);

    let requests = state.batch_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].filename, "a.jpg");
    assert_eq!(requests[0].tab, Some(TabId(1)));
    assert!(requests[1].blob);
}

#[test]
fn test_retry_and_saved_tracking() {
    let mut state = loaded(vec![
        image("https://x.com/a.jpg"),
        image("https://x.com/b.jpg"),
        image("https://x.com/c.jpg"),
    ]);
    let requests = state.batch_requests();
    let summary = BatchSummary {
        total: 3,
        failed: 1,
        failed_urls: vec!["https://x.com/b.jpg".into()],
    };
    state.record_batch(&requests, &summary);
    assert!(state.is_saved("https://x.com/a.jpg"));
    assert!(!state.is_saved("https://x.com/b.jpg"));

    let retry = AppState::retry_requests(&requests, &summary.failed_urls);
    assert_eq!(retry.len(), 1);
    assert_eq!(retry[0].url, "https://x.com/b.jpg");
    assert_eq!(
        state.saved_urls(),
        vec!["https://x.com/a.jpg", "https://x.com/c.jpg"]
    );
}

struct NoDownloads;

#[async_trait]
impl DownloadHost for NoDownloads {
    async fn trigger_download(&self, url: &str, _: &str) -> Result<DownloadId, HostError> {
        Err(HostError::InvalidUrl(url.to_string()))
    }
}

/// Bridge answering `CollectMedia` with a fixed list, or failing.
struct LivePage(Option<Vec<MediaCandidate>>);

#[async_trait]
impl PageBridge for LivePage {
    async fn run_in_page(
        &self,
        tab: TabId,
        _: FrameTarget,
        _: PageCall,
    ) -> Result<Vec<PageReply>, HostError> {
        match &self.0 {
            Some(media) => Ok(vec![PageReply::Media {
                media: media.clone(),
            }]),
            None => Err(HostError::TabClosed(tab)),
        }
    }
}

fn orchestrator(live: Option<Vec<MediaCandidate>>) -> Orchestrator {
    Orchestrator::new(Arc::new(NoDownloads), Arc::new(LivePage(live)))
}

#[tokio::test]
async fn test_load_page_replaces_cached_list_and_updates_cache() {
    let cache = ScanCache::open(Arc::new(create_test_pool().await)).await;
    cache
        .put("https://x.com/page", &[image("https://x.com/old.jpg")])
        .await;

    let live = vec![image("https://x.com/old.jpg"), video("https://x.com/v.mp4")];
    let mut state = AppState::new();
    let applied = state
        .load_page(
            &cache,
            &orchestrator(Some(live.clone())),
            TabId(1),
            "https://x.com/page#top",
        )
        .await;

    assert_eq!(applied, ScanApplied::Replaced);
    assert_eq!(state.media().len(), 2);
    let entry = cache.get("https://x.com/page").await.unwrap();
    assert_eq!(entry.media, live);
}

#[tokio::test]
async fn test_load_page_keeps_cache_when_identical() {
    let cache = ScanCache::open(Arc::new(create_test_pool().await)).await;
    let media = vec![image("https://x.com/a.jpg")];
    cache.put("https://x.com/page", &media).await;

    let mut state = AppState::new();
    let applied = state
        .load_page(&cache, &orchestrator(Some(media)), TabId(1), "https://x.com/page")
        .await;
    assert_eq!(applied, ScanApplied::Unchanged);
    assert_eq!(state.summary(), "Found 1 image, 0 videos");
}

#[tokio::test]
async fn test_load_page_failure_falls_back_to_cache() {
    let cache = ScanCache::open(Arc::new(create_test_pool().await)).await;
    cache
        .put("https://x.com/page", &[image("https://x.com/a.jpg")])
        .await;

    let mut state = AppState::new();
    state
        .load_page(&cache, &orchestrator(None), TabId(1), "https://x.com/page")
        .await;
    assert_eq!(state.media().len(), 1);
    assert_eq!(state.summary(), "Found 1 image, 0 videos");

    let mut state = AppState::new();
    state
        .load_page(&cache, &orchestrator(None), TabId(1), "https://x.com/other")
        .await;
    assert!(state.media().is_empty());
    assert_eq!(state.summary(), SCAN_FAILED_SUMMARY);
}

#[tokio::test]
async fn test_cached_list_freshness_follows_preferred_ttl() {
    let cache = ScanCache::open(Arc::new(create_test_pool().await)).await;
    let ten_minutes_ago = Utc::now().timestamp_millis() - 10 * 60 * 1000;
    cache
        .try_put("https://x.com/page", &[image("https://x.com/a.jpg")], ten_minutes_ago)
        .await
        .unwrap();

    // Default TTL is five minutes.
    let mut state = AppState::new();
    state
        .load_page(&cache, &orchestrator(None), TabId(1), "https://x.com/page")
        .await;
    assert_eq!(state.cached(), Some(CachedList::Stale));
    assert_eq!(state.media().len(), 1);

    let mut state = AppState::new();
    state.apply_preferences(&Preferences {
        cache_ttl_minutes: 30,
        ..Preferences::default()
    });
    state
        .load_page(&cache, &orchestrator(None), TabId(1), "https://x.com/page")
        .await;
    assert_eq!(state.cached(), Some(CachedList::Fresh));

    // Any live result, even an identical one, supersedes the cached marker.
    let applied = state
        .load_page(
            &cache,
            &orchestrator(Some(vec![image("https://x.com/a.jpg")])),
            TabId(1),
            "https://x.com/page",
        )
        .await;
    assert_eq!(applied, ScanApplied::Unchanged);
    assert_eq!(state.cached(), None);
}
