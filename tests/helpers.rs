// Shared test helpers for the integration suites.
//
// Each suite includes this file with `mod helpers;` and uses the parts it needs.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{ImageFormat, Rgb, RgbImage};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use media_harvest::host::{DownloadHost, PageBridge};
use media_harvest::native::{DownloadDirectory, LocalBridge, NativePage};
use media_harvest::{run_migrations, Orchestrator};

/// Creates an in-memory database pool with migrations applied.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// A small, valid PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 7) as u8, (y * 13) as u8, 200]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode test PNG");
    out.into_inner()
}

/// Serves `body` at `route` with `content_type`.
pub async fn serve(server: &MockServer, route: &str, content_type: &str, body: impl Into<Vec<u8>>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", content_type)
                .set_body_bytes(body.into()),
        )
        .mount(server)
        .await;
}

pub async fn serve_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Native host wired together the way the CLI does it.
pub struct NativeHost {
    pub client: Arc<reqwest::Client>,
    pub downloads: Arc<DownloadDirectory>,
    pub bridge: Arc<LocalBridge<NativePage>>,
    pub orchestrator: Orchestrator,
}

impl NativeHost {
    pub fn new(download_dir: &Path) -> Self {
        let client = Arc::new(reqwest::Client::new());
        let downloads = Arc::new(DownloadDirectory::new(Arc::clone(&client), download_dir));
        let bridge: Arc<LocalBridge<NativePage>> = Arc::new(LocalBridge::new());
        let orchestrator = Orchestrator::new(
            Arc::clone(&downloads) as Arc<dyn DownloadHost>,
            Arc::clone(&bridge) as Arc<dyn PageBridge>,
        );
        Self {
            client,
            downloads,
            bridge,
            orchestrator,
        }
    }

    /// Fetches `url` (and its frames) and opens it as a tab.
    pub async fn open(&self, url: &str) -> media_harvest::TabId {
        let top = self.load(url).await;
        let mut frames = Vec::new();
        for frame_url in top.frame_urls() {
            frames.push(self.load(&frame_url).await);
        }
        self.bridge.open_tab(top, frames)
    }

    pub async fn load(&self, url: &str) -> NativePage {
        NativePage::load(Arc::clone(&self.client), url, Arc::clone(&self.downloads))
            .await
            .expect("Failed to load page")
    }

    /// Opens an in-memory page whose markup never came from the network.
    pub fn open_html(&self, url: &str, html: &str) -> media_harvest::TabId {
        let page = NativePage::from_html(
            Arc::clone(&self.client),
            url,
            html,
            Arc::clone(&self.downloads),
        );
        self.bridge.open_tab(page, Vec::new())
    }
}
