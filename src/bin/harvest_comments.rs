//! Comment harvester command line
//!
//! Resolves a search phrase, `@handle` or CSV path to a list of target pages and
//! harvests each one in turn, writing `comments_<video_id>.json` files.

use anyhow::{Context, bail};
use clap::Parser;
use comment_harvester::{BrowserSession, ConnectionOptions, HarvestConfig, LaunchOptions,
                        batch::{read_targets, resolve_input, run_batch}};
use std::{path::PathBuf,
          sync::{Arc,
                 atomic::{AtomicBool, Ordering}},
          time::Duration};

#[derive(Parser)]
#[command(name = "harvest-comments")]
#[command(version)]
#[command(about = "Harvest comments from video pages listed in a CSV", long_about = None)]
struct Cli {
    /// Search phrase, @handle, or path to a video_id,url CSV
    #[arg(required = true, num_args = 1.., value_name = "INPUT")]
    input: Vec<String>,

    /// Directory holding exported target lists
    #[arg(long, value_name = "DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Root directory for comment files
    #[arg(long, short = 'o', value_name = "DIR", default_value = "comments")]
    out_dir: PathBuf,

    /// Output folder name (default: derived from the input)
    #[arg(long, value_name = "NAME")]
    dir: Option<String>,

    /// Only harvest the first N pages
    #[arg(long, value_name = "N")]
    max: Option<usize>,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<PathBuf>,

    /// WebSocket endpoint URL for remote browser connection
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// Browser cookie export to load before the first page
    #[arg(long, value_name = "FILE", default_value = "cookies.json")]
    cookies: PathBuf,

    /// Hard cap on interaction rounds per page
    #[arg(long, default_value = "30")]
    max_rounds: u32,

    /// Rounds without growth before a page counts as fully loaded
    #[arg(long, default_value = "3")]
    stagnant_rounds: u32,

    /// Pause after each round, in milliseconds
    #[arg(long, value_name = "MS", default_value = "1200")]
    settle_ms: u64,

    /// URL fragment identifying comment listing responses
    #[arg(long, value_name = "PATTERN", default_value = "/api/comment/list")]
    endpoint: String,
}

impl Cli {
    fn harvest_config(&self) -> HarvestConfig {
        HarvestConfig::new()
            .with_endpoint_pattern(self.endpoint.clone())
            .with_max_rounds(self.max_rounds)
            .with_stagnant_rounds(self.stagnant_rounds)
            .with_settle_interval(Duration::from_millis(self.settle_ms))
    }

    fn open_session(&self) -> comment_harvester::Result<BrowserSession> {
        if let Some(ref endpoint) = self.ws_endpoint {
            log::info!("Connecting to browser at {}", endpoint);
            return BrowserSession::connect(ConnectionOptions::new(endpoint.clone()));
        }

        let mut options = LaunchOptions::new().headless(!self.headed);
        if let Some(ref path) = self.executable_path {
            options = options.chrome_path(path.clone());
        }
        if let Some(ref dir) = self.user_data_dir {
            options = options.user_data_dir(dir.clone());
        }

        log::info!("Launching browser ({})", if options.headless { "headless" } else { "headed" });
        BrowserSession::launch(options)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let input = cli.input.join(" ");

    let resolved = resolve_input(&input, &cli.data_dir, &cli.out_dir, cli.dir.as_deref())?;
    let mut targets = read_targets(&resolved.csv_path)?;
    if let Some(max) = cli.max {
        targets.truncate(max);
    }
    if targets.is_empty() {
        bail!("No targets in {}", resolved.csv_path.display());
    }

    log::info!(
        "{} pages from {} -> {}",
        targets.len(),
        resolved.csv_path.display(),
        resolved.out_dir.display()
    );

    let session = cli.open_session().context("Failed to start browser session")?;
    match session.load_cookies(&cli.cookies) {
        Ok(0) => {}
        Ok(count) => log::info!("Loaded {} cookies from {}", count, cli.cookies.display()),
        Err(e) => log::warn!("Ignoring cookies from {}: {}", cli.cookies.display(), e),
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupt received, finishing the current page");
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    let config = cli.harvest_config();
    let out_dir = resolved.out_dir.clone();
    let report = tokio::task::spawn_blocking(move || {
        let report = run_batch(&session, &targets, &config, &out_dir, &stop);
        if let Err(e) = session.close() {
            log::debug!("Browser close failed: {}", e);
        }
        report
    })
    .await
    .context("Harvest task panicked")?;

    log::info!(
        "Done: {} pages saved ({} comments), {} failed, {} skipped",
        report.succeeded.len(),
        report.total_comments(),
        report.failed.len(),
        report.skipped
    );
    for failure in &report.failed {
        log::info!("  {}: {}", failure.id, failure.reason);
    }

    Ok(())
}
