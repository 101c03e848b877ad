use super::*;
use crate::models::{MediaSource, MediaType};

fn page(html: &str) -> PageSnapshot {
    PageSnapshot::new("https://example.com/gallery/index.html", html)
}

fn urls(media: &[MediaCandidate]) -> Vec<&str> {
    media.iter().map(|m| m.url.as_str()).collect()
}

fn find<'a>(media: &'a [MediaCandidate], url: &str) -> Option<&'a MediaCandidate> {
    media.iter().find(|m| m.url == url)
}

/// Pseudo-random pixels so the PNG does not compress below the data URI floor
fn noisy_rgba(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x1234_5678;
    (0..width * height * 4)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect()
}

#[test]
fn test_scan_collapses_variants_and_drops_tracking() {
    let snapshot = PageSnapshot::new(
        "https://example.com/",
        r#"<html><body>
            <img src="/photo.jpg?w=100">
            <img src="/photo.jpg?w=900">
            <img src="/pixel.gif">
            <video src="blob:https://example.com/123"></video>
        </body></html>"#,
    );
    let media = scan_page(&snapshot);
    assert_eq!(media.len(), 2);
    assert_eq!(media[0].url, "https://example.com/photo.jpg?w=900");
    assert_eq!(media[0].media_type, MediaType::Image);
    assert_eq!(media[1].url, "blob:https://example.com/123");
    assert_eq!(media[1].media_type, MediaType::Video);
    assert!(media[1].blob);
}

#[test]
fn test_links_classified_by_extension() {
    let media = extract_media(&page(
        r#"<a href="song.mp3">a</a><a href="/docs/readme.html">b</a><a href="javascript:void(0)">c</a>"#,
    ));
    assert_eq!(urls(&media), vec!["https://example.com/gallery/song.mp3"]);
    assert_eq!(media[0].media_type, MediaType::Audio);
    assert_eq!(media[0].source, MediaSource::Link);
}

#[test]
fn test_base_href_changes_resolution() {
    let media = extract_media(&page(
        r#"<head><base href="https://cdn.example.net/assets/"></head><body><img src="a.png"></body>"#,
    ));
    assert_eq!(urls(&media), vec!["https://cdn.example.net/assets/a.png"]);
}

#[test]
fn test_srcset_and_lazy_attributes() {
    let media = extract_media(&page(
        r#"<img src="data:image/gif;base64,R0lGOD" srcset="s.jpg 320w, l.jpg 1024w"
                data-src="/lazy.jpg" data-lazy="blob:https://example.com/x"
                data-srcset="m1.webp 1x, m2.webp 2x">"#,
    ));
    let sources: Vec<(&str, MediaSource)> =
        media.iter().map(|m| (m.url.as_str(), m.source)).collect();
    assert_eq!(
        sources,
        vec![
            ("https://example.com/gallery/s.jpg", MediaSource::ImgSrcset),
            ("https://example.com/gallery/l.jpg", MediaSource::ImgSrcset),
            ("https://example.com/lazy.jpg", MediaSource::Lazy),
            ("https://example.com/gallery/m1.webp", MediaSource::LazySrcset),
            ("https://example.com/gallery/m2.webp", MediaSource::LazySrcset),
        ]
    );
}

#[test]
fn test_video_poster_and_audio() {
    let media = extract_media(&page(
        r#"<video src="clip.mp4" poster="cover.jpg"></video><audio src="/pod/ep1.mp3"></audio>"#,
    ));
    let poster = find(&media, "https://example.com/gallery/cover.jpg").unwrap();
    assert_eq!(poster.media_type, MediaType::Image);
    assert_eq!(poster.source, MediaSource::VideoPoster);
    let audio = find(&media, "https://example.com/pod/ep1.mp3").unwrap();
    assert_eq!(audio.media_type, MediaType::Audio);
}

#[test]
fn test_blob_resolved_from_data_attribute() {
    let media = extract_media(&page(
        r#"<video src="blob:https://example.com/abc" data-video-url="/real/movie.mp4"></video>"#,
    ));
    assert_eq!(urls(&media), vec!["https://example.com/real/movie.mp4"]);
    assert!(!media[0].blob);
}

#[test]
fn test_blob_resolved_from_enclosing_link() {
    let media = extract_media(&page(
        r#"<a href="/full/pic.png"><img src="blob:https://example.com/img1"></a>"#,
    ));
    let img = media.iter().find(|m| m.source == MediaSource::Img).unwrap();
    assert_eq!(img.url, "https://example.com/full/pic.png");
    assert!(!img.blob);
}

#[test]
fn test_blob_source_uses_sibling_and_audio_parent() {
    let media = extract_media(&page(
        r#"<video><source src="blob:https://example.com/v1"><source src="/alt.webm"></video>
           <audio><source src="blob:https://example.com/a1"></audio>"#,
    ));
    let alt = find(&media, "https://example.com/alt.webm").unwrap();
    assert_eq!(alt.media_type, MediaType::Video);

    let audio_blob = find(&media, "blob:https://example.com/a1").unwrap();
    assert!(audio_blob.blob);
    assert_eq!(audio_blob.media_type, MediaType::Audio);
}

#[test]
fn test_source_type_from_mime() {
    let media = extract_media(&page(
        r#"<audio><source src="/stream/play" type="audio/mpeg"></audio>
           <video><source src="/live/index.m3u8"></video>"#,
    ));
    assert_eq!(
        find(&media, "https://example.com/stream/play")
            .unwrap()
            .media_type,
        MediaType::Audio
    );
    let hls = find(&media, "https://example.com/live/index.m3u8").unwrap();
    assert!(hls.stream);
    assert_eq!(hls.media_type, MediaType::Video);
}

#[test]
fn test_picture_sources_and_css_backgrounds() {
    let media = extract_media(&page(
        r#"<picture><source srcset="hero.avif 1x, hero@2x.avif 2x"><img src="hero.jpg"></picture>
           <div style="background-image: url('/bg/tile.png')"></div>
           <section style="background: url(/intro.mp4)"></section>"#,
    ));
    assert!(find(&media, "https://example.com/gallery/hero.avif").is_some());
    assert!(find(&media, "https://example.com/gallery/hero@2x.avif").is_some());
    let tile = find(&media, "https://example.com/bg/tile.png").unwrap();
    assert_eq!(tile.source, MediaSource::CssBackground);
    let intro = find(&media, "https://example.com/intro.mp4").unwrap();
    assert_eq!(intro.media_type, MediaType::Video);
}

#[test]
fn test_meta_tags_collapse_to_one() {
    let snapshot = page(
        r#"<head>
            <meta property="og:image" content="https://example.com/share.jpg">
            <meta name="twitter:image" content="https://example.com/share.jpg">
            <meta property="og:video:url" content="/promo.mp4">
            <meta property="og:title" content="Hello">
        </head>"#,
    );
    let media = scan_page(&snapshot);
    assert_eq!(
        urls(&media),
        vec!["https://example.com/share.jpg", "https://example.com/promo.mp4"]
    );
    assert_eq!(media[1].media_type, MediaType::Video);
    assert_eq!(media[1].source, MediaSource::Meta);
}

#[test]
fn test_noscript_fallback_images() {
    let media = extract_media(&page(
        r#"<body><noscript><img src="/real/full.jpg"></noscript></body>"#,
    ));
    let full = find(&media, "https://example.com/real/full.jpg").unwrap();
    assert_eq!(full.source, MediaSource::Noscript);
}

#[test]
fn test_preload_hints() {
    let media = extract_media(&page(
        r#"<head>
            <link rel="preload" href="/fonts/a.woff2" as="font">
            <link rel="preload" href="/hero.webp" as="image">
            <link rel="preload" href="/theme.ogg" as="audio">
        </head>"#,
    ));
    assert_eq!(
        urls(&media),
        vec!["https://example.com/hero.webp", "https://example.com/theme.ogg"]
    );
    assert_eq!(media[1].media_type, MediaType::Audio);
}

#[test]
fn test_json_ld_walk_skips_malformed() {
    let media = extract_media(&page(
        r#"<head>
            <script type="application/ld+json">{not json</script>
            <script type="application/ld+json">
                {"@type": "VideoObject",
                 "contentUrl": "/v/clip.mp4",
                 "thumbnailUrl": ["/t/1.jpg", "/t/2.jpg"],
                 "name": "/ignored.png",
                 "author": {"@type": "Organization", "logo": "/logo.png"},
                 "embedUrl": "/player"}
            </script>
        </head>"#,
    ));
    assert_eq!(media.len(), 4);
    assert!(media.iter().all(|m| m.source == MediaSource::JsonLd));
    assert_eq!(
        find(&media, "https://example.com/v/clip.mp4")
            .unwrap()
            .media_type,
        MediaType::Video
    );
    assert!(find(&media, "https://example.com/t/1.jpg").is_some());
    assert!(find(&media, "https://example.com/t/2.jpg").is_some());
    assert!(find(&media, "https://example.com/logo.png").is_some());
    assert!(find(&media, "https://example.com/ignored.png").is_none());
}

#[test]
fn test_iframe_embeds() {
    let media = extract_media(&page(
        r#"<iframe src="https://www.youtube.com/embed/abc123"></iframe>
           <iframe src="https://maps.example.com/embed?q=1"></iframe>"#,
    ));
    assert_eq!(urls(&media), vec!["https://www.youtube.com/watch?v=abc123"]);
    assert!(media[0].embed);
    assert!(!media[0].is_downloadable());
}

#[test]
fn test_shadow_roots_are_searched_for_elements_only() {
    let mut snapshot = page("<div id=host></div>");
    snapshot.shadow_roots.push(ShadowRootSnapshot {
        html: r#"<img src="/shadow/outer.png"><meta property="og:image" content="/shadow/meta.jpg">"#
            .to_string(),
        shadow_roots: vec![ShadowRootSnapshot {
            html: r#"<video src="/shadow/inner.mp4"></video>"#.to_string(),
            shadow_roots: Vec::new(),
        }],
    });
    let media = extract_media(&snapshot);
    assert_eq!(
        urls(&media),
        vec![
            "https://example.com/shadow/outer.png",
            "https://example.com/shadow/inner.mp4"
        ]
    );
}

#[test]
fn test_frames_resolve_against_their_own_url() {
    let mut snapshot = page(r#"<img src="top.png">"#);
    snapshot.frames.push(PageSnapshot::new(
        "https://cdn.other.org/embed/frame.html",
        r#"<img src="inner.png">"#,
    ));
    let media = extract_media(&snapshot);
    assert_eq!(
        urls(&media),
        vec![
            "https://example.com/gallery/top.png",
            "https://cdn.other.org/embed/inner.png"
        ]
    );
}

#[test]
fn test_canvas_size_band_and_taint() {
    let mut snapshot = page("<canvas></canvas>");
    snapshot.canvases = vec![
        CanvasSnapshot {
            width: 64,
            height: 64,
            rgba: Some(noisy_rgba(64, 64)),
        },
        CanvasSnapshot {
            width: 20,
            height: 20,
            rgba: Some(noisy_rgba(20, 20)),
        },
        CanvasSnapshot {
            width: 100,
            height: 100,
            rgba: None,
        },
    ];
    let media = extract_media(&snapshot);
    assert_eq!(media.len(), 1);
    assert!(media[0].url.starts_with("data:image/png;base64,"));
    assert_eq!(media[0].source, MediaSource::Canvas);
}

#[test]
fn test_empty_page_yields_nothing() {
    assert!(scan_page(&page("")).is_empty());
}
