//! Tests for download orchestration.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::*;
use crate::models::{DownloadId, MediaSource};

/// Download host that fails a fixed set of URLs and tracks peak concurrency.
#[derive(Default)]
struct RecordingHost {
    fail: HashSet<String>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    next_id: AtomicU64,
}

impl RecordingHost {
    fn failing(urls: &[&str]) -> Self {
        Self {
            fail: urls.iter().map(|u| u.to_string()).collect(),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DownloadHost for RecordingHost {
    async fn trigger_download(&self, url: &str, _filename: &str) -> Result<DownloadId, HostError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.fail.contains(url) {
            return Err(HostError::InvalidUrl(url.to_string()));
        }
        Ok(DownloadId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }
}

/// Bridge answering every call with the same scripted result.
struct ScriptedBridge {
    answer: Result<Vec<PageReply>, HostError>,
    delay: Duration,
    calls: Mutex<Vec<(TabId, FrameTarget, PageCall)>>,
}

impl ScriptedBridge {
    fn replying(replies: Vec<PageReply>) -> Self {
        Self {
            answer: Ok(replies),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing(error: HostError) -> Self {
        Self {
            answer: Err(error),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(TabId, FrameTarget, PageCall)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageBridge for ScriptedBridge {
    async fn run_in_page(
        &self,
        tab: TabId,
        target: FrameTarget,
        call: PageCall,
    ) -> Result<Vec<PageReply>, HostError> {
        self.calls.lock().unwrap().push((tab, target, call));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answer.clone()
    }
}

fn orchestrator(host: &Arc<RecordingHost>, bridge: &Arc<ScriptedBridge>) -> Orchestrator {
    Orchestrator::new(
        Arc::clone(host) as Arc<dyn DownloadHost>,
        Arc::clone(bridge) as Arc<dyn PageBridge>,
    )
}

fn request(url: &str) -> DownloadRequest {
    DownloadRequest {
        url: url.to_string(),
        filename: crate::naming::filename_from_url(url),
        blob: false,
        tab: None,
        format: None,
        media_type: MediaType::Image,
    }
}

fn numbered(n: usize) -> Vec<DownloadRequest> {
    (0..n)
        .map(|i| request(&format!("https://cdn.example/{}.jpg", i)))
        .collect()
}

#[tokio::test]
async fn test_download_passes_host_error_through() {
    let host = Arc::new(RecordingHost::failing(&["https://cdn.example/bad.jpg"]));
    let bridge = Arc::new(ScriptedBridge::replying(vec![]));
    let orch = orchestrator(&host, &bridge);

    let ok = orch.download("https://cdn.example/good.jpg", "good.jpg").await;
    assert!(ok.success);
    assert_eq!(ok.download_id, Some(DownloadId(1)));

    let bad = orch.download("https://cdn.example/bad.jpg", "bad.jpg").await;
    assert!(!bad.success);
    assert_eq!(
        bad.error.as_deref(),
        Some("Invalid URL: https://cdn.example/bad.jpg")
    );
}

#[tokio::test]
async fn test_blob_download_requires_tab() {
    let host = Arc::new(RecordingHost::default());
    let bridge = Arc::new(ScriptedBridge::replying(vec![PageReply::Saved]));
    let result = orchestrator(&host, &bridge)
        .download_blob("blob:https://x.com/1", "clip.mp4", None)
        .await;
    assert_eq!(result.error.as_deref(), Some("No active tab"));
    assert!(bridge.calls().is_empty());
}

#[tokio::test]
async fn test_blob_download_runs_in_top_frame() {
    let host = Arc::new(RecordingHost::default());
    let bridge = Arc::new(ScriptedBridge::replying(vec![PageReply::Saved]));
    let result = orchestrator(&host, &bridge)
        .download_blob("blob:https://x.com/1", "clip.mp4", Some(TabId(4)))
        .await;
    assert!(result.success);
    assert_eq!(result.download_id, None);

    let calls = bridge.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, TabId(4));
    assert_eq!(calls[0].1, FrameTarget::Top);
    assert_eq!(
        calls[0].2.op,
        PageOperation::FetchAndTrigger {
            url: "blob:https://x.com/1".into(),
            filename: "clip.mp4".into(),
        }
    );
    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn test_blob_download_page_failure() {
    let host = Arc::new(RecordingHost::default());
    let bridge = Arc::new(ScriptedBridge::replying(vec![PageReply::Failed {
        error: "revoked".into(),
    }]));
    let result = orchestrator(&host, &bridge)
        .download_blob("blob:https://x.com/1", "clip.mp4", Some(TabId(1)))
        .await;
    assert_eq!(result.error.as_deref(), Some(BLOB_FAILURE));
}

#[tokio::test]
async fn test_blob_download_bridge_error_passes_through() {
    let host = Arc::new(RecordingHost::default());
    let bridge = Arc::new(ScriptedBridge::failing(HostError::TabClosed(TabId(9))));
    let result = orchestrator(&host, &bridge)
        .download_blob("blob:https://x.com/1", "clip.mp4", Some(TabId(9)))
        .await;
    assert_eq!(result.error.as_deref(), Some("No tab with id: tab#9"));
}

#[tokio::test]
async fn test_converted_download_falls_back_to_original() {
    let host = Arc::new(RecordingHost::default());
    let bridge = Arc::new(ScriptedBridge::replying(vec![PageReply::Failed {
        error: "Image decode failed".into(),
    }]));
    let result = orchestrator(&host, &bridge)
        .download_converted(
            "https://cdn.example/a.webp",
            "a.png",
            ConvertFormat::Png,
            Some(TabId(1)),
        )
        .await;
    assert!(result.success);
    assert_eq!(result.download_id, Some(DownloadId(1)));
    assert_eq!(host.calls(), vec!["https://cdn.example/a.webp"]);
}

#[tokio::test]
async fn test_converted_download_in_page() {
    let host = Arc::new(RecordingHost::default());
    let bridge = Arc::new(ScriptedBridge::replying(vec![PageReply::Saved]));
    let result = orchestrator(&host, &bridge)
        .download_converted(
            "https://cdn.example/a.webp",
            "a.jpg",
            ConvertFormat::Jpg,
            Some(TabId(1)),
        )
        .await;
    assert!(result.success);
    assert!(host.calls().is_empty());
    assert!(matches!(
        bridge.calls()[0].2.op,
        PageOperation::ConvertAndTrigger {
            format: ConvertFormat::Jpg,
            ..
        }
    ));
}

#[tokio::test]
async fn test_download_all_partial_failure() {
    let items = numbered(10);
    let host = Arc::new(RecordingHost::failing(&[
        "https://cdn.example/3.jpg",
        "https://cdn.example/7.jpg",
    ]));
    let bridge = Arc::new(ScriptedBridge::replying(vec![]));
    let orch = orchestrator(&host, &bridge);
    let mut progress = orch.subscribe_progress();

    let summary = orch.download_all(&items, Some(4)).await;
    assert_eq!(summary.total, 10);
    assert_eq!(summary.failed, 2);
    assert_eq!(
        summary.failed_urls,
        vec!["https://cdn.example/3.jpg", "https://cdn.example/7.jpg"]
    );
    assert_eq!(summary.succeeded(), 8);

    let mut seen = Vec::new();
    while let Ok(update) = progress.try_recv() {
        seen.push(update.completed);
        assert_eq!(update.total, 10);
    }
    assert_eq!(seen, vec![4, 8, 10]);
}

#[tokio::test]
async fn test_download_all_respects_window_size() {
    let host = Arc::new(RecordingHost {
        delay: Duration::from_millis(20),
        ..Default::default()
    });
    let bridge = Arc::new(ScriptedBridge::replying(vec![]));
    let summary = orchestrator(&host, &bridge)
        .download_all(&numbered(9), Some(3))
        .await;
    assert_eq!(summary.failed, 0);
    assert_eq!(host.peak.load(Ordering::SeqCst), 3);
    assert_eq!(host.calls().len(), 9);
}

#[tokio::test]
async fn test_download_all_clamps_window_size() {
    let host = Arc::new(RecordingHost {
        delay: Duration::from_millis(10),
        ..Default::default()
    });
    let bridge = Arc::new(ScriptedBridge::replying(vec![]));
    let orch = orchestrator(&host, &bridge);

    orch.download_all(&numbered(20), Some(100)).await;
    assert_eq!(host.peak.load(Ordering::SeqCst), 8);
}

#[tokio::test]
async fn test_download_all_without_listener() {
    let host = Arc::new(RecordingHost::default());
    let bridge = Arc::new(ScriptedBridge::replying(vec![]));
    let summary = orchestrator(&host, &bridge)
        .download_all(&numbered(3), None)
        .await;
    assert_eq!(summary.total, 3);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_download_all_routes_blob_items_through_page() {
    let host = Arc::new(RecordingHost::default());
    let bridge = Arc::new(ScriptedBridge::replying(vec![PageReply::Saved]));
    let mut items = numbered(2);
    items.push(DownloadRequest {
        blob: true,
        tab: Some(TabId(2)),
        ..request("blob:https://x.com/clip")
    });
    // Blob item without a tab falls through to the host primitive.
    items.push(DownloadRequest {
        blob: true,
        ..request("blob:https://x.com/orphan")
    });

    let summary = orchestrator(&host, &bridge).download_all(&items, None).await;
    assert_eq!(summary.failed, 0);
    assert_eq!(bridge.calls().len(), 1);
    assert_eq!(host.calls().len(), 3);
}

#[tokio::test]
async fn test_download_all_empty() {
    let host = Arc::new(RecordingHost::default());
    let bridge = Arc::new(ScriptedBridge::replying(vec![]));
    let summary = orchestrator(&host, &bridge).download_all(&[], None).await;
    assert_eq!(summary, BatchSummary::default());
}

#[tokio::test]
async fn test_zip_requires_tab() {
    let host = Arc::new(RecordingHost::default());
    let bridge = Arc::new(ScriptedBridge::replying(vec![]));
    let outcome = orchestrator(&host, &bridge)
        .download_zip(&numbered(2), None, None)
        .await;
    assert_eq!(outcome, ZipOutcome::failed("No active tab"));
}

#[tokio::test]
async fn test_zip_sends_items_and_archive_name() {
    let host = Arc::new(RecordingHost::default());
    let bridge = Arc::new(ScriptedBridge::replying(vec![PageReply::Zip(
        ZipOutcome::archived(2),
    )]));
    let outcome = orchestrator(&host, &bridge)
        .download_zip(&numbered(2), Some(TabId(1)), Some(ConvertFormat::Png))
        .await;
    assert_eq!(outcome, ZipOutcome::archived(2));

    let calls = bridge.calls();
    let PageOperation::BuildZipAndTrigger {
        items,
        format,
        archive_name,
    } = &calls[0].2.op
    else {
        panic!("unexpected operation {:?}", calls[0].2.op);
    };
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].filename, "0.jpg");
    assert_eq!(*format, ConvertFormat::Png);
    assert_eq!(archive_name, ZIP_ARCHIVE_NAME);
}

#[tokio::test]
async fn test_zip_failure_messages() {
    let host = Arc::new(RecordingHost::default());

    let bridge = Arc::new(ScriptedBridge::replying(vec![PageReply::Zip(
        ZipOutcome::failed("No files fetched"),
    )]));
    let outcome = orchestrator(&host, &bridge)
        .download_zip(&numbered(1), Some(TabId(1)), None)
        .await;
    assert_eq!(outcome.error.as_deref(), Some("No files fetched"));

    let bridge = Arc::new(ScriptedBridge::replying(vec![]));
    let outcome = orchestrator(&host, &bridge)
        .download_zip(&numbered(1), Some(TabId(1)), None)
        .await;
    assert_eq!(outcome.error.as_deref(), Some(ZIP_FAILURE));

    let bridge = Arc::new(ScriptedBridge::failing(HostError::Script(
        "page navigated".into(),
    )));
    let outcome = orchestrator(&host, &bridge)
        .download_zip(&numbered(1), Some(TabId(1)), None)
        .await;
    assert_eq!(
        outcome.error.as_deref(),
        Some("Cannot access contents of the page: page navigated")
    );
}

#[tokio::test(start_paused = true)]
async fn test_page_call_timeout_is_item_failure() {
    let host = Arc::new(RecordingHost::default());
    let bridge = Arc::new(ScriptedBridge {
        answer: Ok(vec![PageReply::Saved]),
        delay: Duration::from_secs(3600),
        calls: Mutex::new(Vec::new()),
    });
    let result = orchestrator(&host, &bridge)
        .with_page_call_timeout(Duration::from_secs(5))
        .download_blob("blob:https://x.com/1", "clip.mp4", Some(TabId(1)))
        .await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Page call timed out after 5s"));
}

#[tokio::test]
async fn test_collect_media_combines_frames() {
    let top = vec![
        MediaCandidate::new("https://x.com/a.jpg?w=200", MediaType::Image, MediaSource::Img),
        MediaCandidate::new("https://x.com/v.mp4", MediaType::Video, MediaSource::Video),
    ];
    let frame = vec![
        MediaCandidate::new("https://x.com/a.jpg?w=800", MediaType::Image, MediaSource::Img),
        MediaCandidate::new("https://x.com/b.png", MediaType::Image, MediaSource::Img),
    ];
    let host = Arc::new(RecordingHost::default());
    let bridge = Arc::new(ScriptedBridge::replying(vec![
        PageReply::Media { media: top },
        PageReply::Failed {
            error: "ignored".into(),
        },
        PageReply::Media { media: frame },
    ]));

    let media = orchestrator(&host, &bridge)
        .collect_media(TabId(1))
        .await
        .unwrap();
    let urls: Vec<&str> = media.iter().map(|m| m.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://x.com/a.jpg?w=800", "https://x.com/v.mp4", "https://x.com/b.png"]
    );
    assert_eq!(bridge.calls()[0].1, FrameTarget::AllFrames);
}

#[tokio::test]
async fn test_batch_honours_per_item_format() {
    let host = Arc::new(RecordingHost::default());
    let bridge = Arc::new(ScriptedBridge::replying(vec![PageReply::Saved]));
    let orch = orchestrator(&host, &bridge);

    let mut converted = request("https://cdn.example/a.webp");
    converted.tab = Some(TabId(1));
    converted.format = Some(ConvertFormat::Png);
    converted.filename = "a.png".into();
    let mut video = request("https://cdn.example/v.mp4");
    video.tab = Some(TabId(1));
    video.format = Some(ConvertFormat::Png);
    video.media_type = MediaType::Video;

    let summary = orch.download_all(&[converted, video], None).await;
    assert_eq!(summary.failed, 0);

    let calls = bridge.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, TabId(1));
    assert_eq!(
        calls[0].2.op,
        PageOperation::ConvertAndTrigger {
            url: "https://cdn.example/a.webp".into(),
            filename: "a.png".into(),
            format: ConvertFormat::Png,
        }
    );
    assert_eq!(host.calls(), vec!["https://cdn.example/v.mp4"]);
}

#[tokio::test]
async fn test_batch_conversion_falls_back_to_plain_download() {
    let host = Arc::new(RecordingHost::default());
    let bridge = Arc::new(ScriptedBridge::replying(vec![PageReply::Failed {
        error: "Image decode failed: bad".into(),
    }]));
    let orch = orchestrator(&host, &bridge);

    let mut item = request("https://cdn.example/a.webp");
    item.tab = Some(TabId(1));
    item.format = Some(ConvertFormat::Jpg);

    let summary = orch.download_all(&[item], None).await;
    assert_eq!(summary.failed, 0);
    assert_eq!(bridge.calls().len(), 1);
    assert_eq!(host.calls(), vec!["https://cdn.example/a.webp"]);
}
