// src/main.rs

use anyhow::{bail, Context, Result};
use clap::Parser;
use snow::config::{self, default_save_dir};
use snow::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snow")]
#[command(about = "Downloads Security Now! episodes")]
#[command(version)]
struct Cli {
    /// Download the last n episodes; 0 means all.
    #[arg(long = "lastn", env = "SNOW_LASTN", default_value_t = 1)]
    last_n: u32,
    /// Episode number from which to start downloading.
    #[arg(long, env = "SNOW_START", default_value_t = 0)]
    start: u32,
    /// Episode number at which to stop downloading.
    #[arg(long, env = "SNOW_STOP", default_value_t = 0)]
    stop: u32,
    /// Number of episodes to download concurrently.
    #[arg(long, env = "SNOW_CONCURRENCY", default_value_t = config::DEFAULT_CONCURRENCY)]
    concurrency: usize,
    /// Download the low quality version: 16Kbps mp3.
    #[arg(long = "lq", env = "SNOW_LQ")]
    low_quality: bool,
    /// Overwrite existing files.
    #[arg(long, env = "SNOW_OVERWRITE")]
    overwrite: bool,
    /// Save directory [default: $HOME/Downloads/security-now]
    #[arg(long = "savedir", env = "SNOW_SAVEDIR")]
    save_dir: Option<PathBuf>,
    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,
    /// Print the final summary as JSON.
    #[arg(long)]
    json: bool,
    #[arg(long, env = "SNOW_ARCHIVE_URL", default_value = config::ARCHIVE_URL, hide = true)]
    archive_url: String,
    #[arg(
        long = "media-url",
        env = "SNOW_MEDIA_URL",
        default_value = config::MEDIA_BASE_URL,
        hide = true
    )]
    media_base_url: String,
}

impl Cli {
    fn into_config(self) -> SelectionConfig {
        SelectionConfig {
            last_n: self.last_n,
            start_episode: self.start,
            stop_episode: self.stop,
            quality: if self.low_quality { Quality::Low } else { Quality::High },
            overwrite: self.overwrite,
            concurrency: config::DEFAULT_CONCURRENCY,
            save_dir: self.save_dir.unwrap_or_else(default_save_dir),
            archive_url: self.archive_url,
            media_base_url: self.media_base_url,
        }
        .with_concurrency(self.concurrency)
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Episode 0 is never published, so a latest of 0 means discovery went wrong.
fn ensure_published(latest: u32) -> Result<u32> {
    if latest == 0 {
        bail!(
            "encountered an unknown problem while processing episode information, \
             the last episode was 0"
        );
    }
    Ok(latest)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let json = cli.json;
    let mut cfg = cli.into_config();
    cfg.validate()?;

    tokio::fs::create_dir_all(&cfg.save_dir)
        .await
        .with_context(|| format!("error making save dir {}", cfg.save_dir.display()))?;
    cfg.save_dir = tokio::fs::canonicalize(&cfg.save_dir)
        .await
        .with_context(|| format!("error resolving save dir {}", cfg.save_dir.display()))?;

    let fetcher = Arc::new(HttpFetcher::new()?);

    let latest = discover_latest_episode(fetcher.as_ref(), &cfg.archive_url)
        .await
        .with_context(|| cfg.archive_url.clone())?;
    let latest = ensure_published(latest)?;

    let range = resolve_range(latest, &cfg)?;

    let coordinator = DownloadCoordinator::with_fetcher(fetcher, &cfg);
    let report = coordinator.run(range).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
    } else {
        println!("\n{}", report.summary);
    }
    Ok(())
}
