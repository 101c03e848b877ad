//! Main application entry point (CLI binary).
//!
//! This is a thin shell around the `media_harvest` library that handles:
//! - Command-line argument parsing
//! - Logger, database, HTTP client and download directory setup
//! - Loading a page (and its frames) into the in-process bridge
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::warn;

use media_harvest::config::{DB_PATH, DOWNLOAD_DIR, HTTP_TIMEOUT_SECS, PAGE_CALL_TIMEOUT};
use media_harvest::native::{DownloadDirectory, LocalBridge, NativePage};
use media_harvest::session::{CachedList, SortOrder, TypeFilter};
use media_harvest::{
    init_client, init_download_dir, init_logger_with, open_database, AppState, BatchSummary,
    Config, ConvertFormat, DownloadRequest, LogFormat, LogLevel, MediaType, Orchestrator,
    PreferenceStore, Preferences, ScanCache,
};

/// Finds images, video and audio on a web page and downloads them.
///
/// # Examples
///
/// ```bash
/// # List the media found on a page
/// media_harvest scan https://example.com/gallery
///
/// # Download every image, re-encoded as PNG
/// media_harvest download https://example.com/gallery --type image --convert png
///
/// # Pack everything into one archive
/// media_harvest download https://example.com/gallery --zip
/// ```
#[derive(Debug, Parser)]
#[command(name = "media_harvest", version, about)]
struct Cli {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    log_format: LogFormat,

    /// Database path (SQLite file) for the scan cache and preferences
    #[arg(long, value_parser, default_value = DB_PATH, global = true)]
    db_path: PathBuf,

    /// Directory receiving downloaded files
    #[arg(long, value_parser, default_value = DOWNLOAD_DIR, global = true)]
    download_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = HTTP_TIMEOUT_SECS, global = true)]
    timeout_seconds: u64,

    /// Upper bound for one in-page operation, in seconds
    #[arg(long, default_value_t = PAGE_CALL_TIMEOUT.as_secs(), global = true)]
    page_timeout_seconds: u64,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Scan a page and list its media
    Scan {
        url: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Scan a page and download the listed media
    Download {
        url: String,
        #[command(flatten)]
        view: ViewArgs,
        /// Pack everything into one ZIP archive
        #[arg(long)]
        zip: bool,
        /// Re-encode images as jpg or png
        #[arg(long, value_enum)]
        convert: Option<FormatArg>,
        /// Run one more batch for the items that failed
        #[arg(long)]
        retry_failed: bool,
    },
    /// Show or change stored preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Debug, clap::Args)]
struct ViewArgs {
    /// Only list one media type
    #[arg(long = "type", value_enum)]
    media_type: Option<TypeArg>,
    /// Case-insensitive filter on URL and filename
    #[arg(long)]
    search: Option<String>,
    #[arg(long, value_enum, default_value_t = SortArg::Default)]
    sort: SortArg,
}

#[derive(Debug, Subcommand)]
enum PrefsAction {
    Show,
    Set {
        /// Minutes a cached scan counts as fresh
        #[arg(long)]
        cache_ttl_minutes: Option<u64>,
        /// Batch window size (clamped to 2..=8)
        #[arg(long)]
        max_concurrent: Option<usize>,
        /// URL substring to hide from listings (repeatable, replaces the list)
        #[arg(long)]
        exclude: Vec<String>,
        /// Remove all exclusion patterns
        #[arg(long, conflicts_with = "exclude")]
        clear_exclusions: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TypeArg {
    Image,
    Video,
    Audio,
}

impl From<TypeArg> for MediaType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Image => MediaType::Image,
            TypeArg::Video => MediaType::Video,
            TypeArg::Audio => MediaType::Audio,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Jpg,
    Png,
}

impl From<FormatArg> for ConvertFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Jpg => ConvertFormat::Jpg,
            FormatArg::Png => ConvertFormat::Png,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Default,
    NameAsc,
    NameDesc,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Default => SortOrder::Default,
            SortArg::NameAsc => SortOrder::NameAsc,
            SortArg::NameDesc => SortOrder::NameDesc,
        }
    }
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
            db_path: self.db_path.clone(),
            download_dir: self.download_dir.clone(),
            timeout_seconds: self.timeout_seconds,
            page_call_timeout: std::time::Duration::from_secs(self.page_timeout_seconds),
            ..Default::default()
        }
    }
}

/// Everything a page command needs once setup succeeded.
struct Shell {
    cache: ScanCache,
    prefs: PreferenceStore,
    orchestrator: Orchestrator,
    bridge: Arc<LocalBridge<NativePage>>,
    client: Arc<reqwest::Client>,
    downloads: Arc<DownloadDirectory>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    let pool = match open_database(&config.db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("media_harvest error: {:#}", e);
            process::exit(1);
        }
    };
    let prefs = PreferenceStore::new(Arc::clone(&pool));

    match cli.command {
        CliCommand::Prefs { action } => run_prefs(&prefs, &action).await,
        CliCommand::Scan { url, view } => {
            let shell = setup_or_exit(&config, pool, prefs).await;
            let state = shell.load(&url, &view).await?;
            print_listing(&state);
            Ok(())
        }
        CliCommand::Download {
            url,
            view,
            zip,
            convert,
            retry_failed,
        } => {
            let shell = setup_or_exit(&config, pool, prefs).await;
            let mut state = shell.load(&url, &view).await?;
            print_listing(&state);
            shell
                .download(&mut state, zip, convert.map(Into::into), retry_failed)
                .await;
            Ok(())
        }
    }
}

async fn setup_or_exit(
    config: &Config,
    pool: Arc<sqlx::SqlitePool>,
    prefs: PreferenceStore,
) -> Shell {
    match setup(config, pool, prefs).await {
        Ok(shell) => shell,
        Err(e) => {
            eprintln!("media_harvest error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn setup(
    config: &Config,
    pool: Arc<sqlx::SqlitePool>,
    prefs: PreferenceStore,
) -> Result<Shell> {
    init_download_dir(&config.download_dir).context("Failed to prepare download directory")?;
    let client = init_client(config).context("Failed to initialize HTTP client")?;
    let downloads = Arc::new(DownloadDirectory::new(
        Arc::clone(&client),
        &config.download_dir,
    ));
    let bridge: Arc<LocalBridge<NativePage>> = Arc::new(LocalBridge::new());
    let orchestrator = Orchestrator::new(
        Arc::clone(&downloads) as Arc<dyn media_harvest::host::DownloadHost>,
        Arc::clone(&bridge) as Arc<dyn media_harvest::host::PageBridge>,
    )
    .with_page_call_timeout(config.page_call_timeout);
    let cache = ScanCache::open(pool).await;

    Ok(Shell {
        cache,
        prefs,
        orchestrator,
        bridge,
        client,
        downloads,
    })
}

impl Shell {
    /// Loads `url` and its frames into a new tab and runs the cache-then-live scan.
    async fn load(&self, url: &str, view: &ViewArgs) -> Result<AppState> {
        let top = NativePage::load(Arc::clone(&self.client), url, Arc::clone(&self.downloads))
            .await
            .with_context(|| format!("Failed to load {}", url))?;

        let mut frames = Vec::new();
        for frame_url in top.frame_urls() {
            match NativePage::load(
                Arc::clone(&self.client),
                &frame_url,
                Arc::clone(&self.downloads),
            )
            .await
            {
                Ok(frame) => frames.push(frame),
                Err(e) => warn!("Skipping frame {}: {}", frame_url, e),
            }
        }
        let tab = self.bridge.open_tab(top, frames);

        let preferences = self.prefs.load().await;
        let mut state = AppState::new();
        state.apply_preferences(&preferences);
        state
            .load_page(&self.cache, &self.orchestrator, tab, url)
            .await;
        state.restore_saved(self.prefs.saved_urls().await);
        state.set_filter(
            view.media_type
                .map(|t| TypeFilter::Only(t.into()))
                .unwrap_or_default(),
        );
        if let Some(query) = &view.search {
            state.set_search(query);
        }
        state.set_sort(view.sort.into());
        Ok(state)
    }

    async fn download(
        &self,
        state: &mut AppState,
        zip: bool,
        convert: Option<ConvertFormat>,
        retry_failed: bool,
    ) {
        let requests = state.batch_requests();
        if requests.is_empty() {
            println!("Nothing to download");
            return;
        }

        if zip {
            let outcome = self
                .orchestrator
                .download_zip(&requests, state.tab(), convert)
                .await;
            match (outcome.success, outcome.error) {
                (true, _) => println!(
                    "Archived {} of {} files into {}",
                    outcome.count.unwrap_or(0),
                    requests.len(),
                    self.downloads.dir().display()
                ),
                (false, error) => println!(
                    "ZIP download failed: {}",
                    error.unwrap_or_else(|| "unknown error".into())
                ),
            }
            return;
        }

        let requests: Vec<DownloadRequest> = match convert {
            Some(format) => requests.into_iter().map(|r| r.with_format(format)).collect(),
            None => requests,
        };
        let preferences = self.prefs.load().await;
        let mut summary = self.run_batch(state, &requests, &preferences).await;
        if retry_failed && summary.failed > 0 {
            println!("Retrying {} failed downloads", summary.failed);
            let retry = AppState::retry_requests(&requests, &summary.failed_urls);
            let second = self.run_batch(state, &retry, &preferences).await;
            summary = BatchSummary {
                total: summary.total,
                failed: second.failed,
                failed_urls: second.failed_urls,
            };
        }

        self.prefs.save_urls(&state.saved_urls()).await;
        println!("Saved {}/{}", summary.succeeded(), summary.total);
        for url in &summary.failed_urls {
            println!("  failed: {}", url);
        }
    }

    async fn run_batch(
        &self,
        state: &mut AppState,
        requests: &[DownloadRequest],
        preferences: &Preferences,
    ) -> BatchSummary {
        let mut progress = self.orchestrator.subscribe_progress();
        let reporter = tokio::spawn(async move {
            while let Ok(update) = progress.recv().await {
                println!("  {}/{}", update.completed, update.total);
                if update.completed == update.total {
                    break;
                }
            }
        });
        let summary = self
            .orchestrator
            .download_all(requests, Some(preferences.max_concurrent))
            .await;
        reporter.abort();
        state.record_batch(requests, &summary);
        summary
    }
}

fn print_listing(state: &AppState) {
    println!("{}", state.summary());
    match state.cached() {
        Some(CachedList::Fresh) => println!("(cached list; live scan failed)"),
        Some(CachedList::Stale) => println!("(outdated cached list; live scan failed)"),
        None => {}
    }
    for item in state.visible() {
        let marker = if state.is_saved(&item.url) { "*" } else { " " };
        let mut flags = Vec::new();
        if item.blob {
            flags.push("blob");
        }
        if item.stream {
            flags.push("stream");
        }
        if item.embed {
            flags.push("embed");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(","))
        };
        println!(
            "{} {:<5} {:<14} {}{}",
            marker, item.media_type, item.source, item.url, flags
        );
    }
}

async fn run_prefs(store: &PreferenceStore, action: &PrefsAction) -> Result<()> {
    match action {
        PrefsAction::Show => {
            let prefs = store.load().await;
            println!("{}", serde_json::to_string_pretty(&prefs)?);
        }
        PrefsAction::Set {
            cache_ttl_minutes,
            max_concurrent,
            exclude,
            clear_exclusions,
        } => {
            let mut prefs = store.load().await;
            if let Some(minutes) = cache_ttl_minutes {
                prefs.cache_ttl_minutes = *minutes;
            }
            if let Some(n) = max_concurrent {
                prefs.max_concurrent = *n;
            }
            if *clear_exclusions {
                prefs.exclude_patterns.clear();
            } else if !exclude.is_empty() {
                prefs.exclude_patterns = exclude.join("\n");
            }
            store
                .save(&prefs)
                .await
                .context("Failed to save preferences")?;
            println!("{}", serde_json::to_string_pretty(&prefs)?);
        }
    }
    Ok(())
}
