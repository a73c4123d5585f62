use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use feedping::config::Config;
use feedping::diff;
use feedping::feed;
use feedping::model::{Feed, Snapshot};
use feedping::notify::Notifier;
use feedping::storage::{blogroll, snapshot};

#[derive(Parser, Debug)]
#[command(
    name = "feedping",
    about = "New-post notifier for a blogroll of RSS/Atom feeds"
)]
struct Args {
    /// Path to the blogroll file (one feed URL per line)
    #[arg(long, value_name = "FILE")]
    blogroll: Option<PathBuf>,

    /// Path to the snapshot cache file
    #[arg(long, value_name = "FILE")]
    cache: Option<PathBuf>,

    /// Print new posts to stdout instead of raising a desktop notification
    #[arg(long)]
    no_notify: bool,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Fetch feeds, report new posts, update the snapshot (default)
    Fetch,
    /// Send a test notification to verify desktop wiring
    Notify,
    /// Delete the cached snapshot
    Clean,
}

/// Everything resolved at startup. Unresolvable paths are fatal here;
/// nothing later in the run is.
struct Settings {
    blogroll: PathBuf,
    cache: PathBuf,
    notifier: Notifier,
    max_entries: usize,
}

/// Get the config directory path (~/.config/feedping/)
fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("feedping"))
}

/// Get the cache directory path (~/.cache/feedping/)
fn cache_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".cache").join("feedping"))
}

/// Precedence: CLI flag > config file > built-in default.
fn resolve_settings(args: &Args) -> Result<Settings> {
    let config_dir = config_dir()?;
    let config =
        Config::load(&config_dir.join("config.toml")).context("Failed to load configuration")?;

    let blogroll = args
        .blogroll
        .clone()
        .or(config.blogroll)
        .unwrap_or_else(|| config_dir.join("blogroll"));
    let cache = args
        .cache
        .clone()
        .or(config.cache)
        .map(Ok)
        .unwrap_or_else(|| cache_dir().map(|dir| dir.join("feeds.json")))?;

    Ok(Settings {
        blogroll,
        cache,
        notifier: Notifier::select(config.notify && !args.no_notify),
        max_entries: config.max_entries_per_feed,
    })
}

async fn run_fetch(settings: &Settings) -> Result<()> {
    let urls = blogroll::read(&settings.blogroll).await.with_context(|| {
        format!(
            "Failed to read blogroll at {} (create it with one feed URL per line)",
            settings.blogroll.display()
        )
    })?;
    if urls.is_empty() {
        eprintln!(
            "Warning: no usable feed URLs in {}",
            settings.blogroll.display()
        );
        return Ok(());
    }
    tracing::info!(feeds = urls.len(), "Loaded blogroll");

    let previous = snapshot::load(&settings.cache).await;
    let client = feed::client().context("Failed to build HTTP client")?;
    let raw_docs = feed::fetch_all(&client, &urls).await;

    // Per-feed failures leave that feed empty and never abort the batch.
    let mut feeds = Vec::with_capacity(urls.len());
    for (url, raw) in urls.iter().zip(raw_docs) {
        let mut parsed = Feed::new(url.clone(), settings.max_entries);
        match raw {
            Ok(bytes) => match feed::parse_into(&mut parsed, &bytes) {
                Ok(report) => {
                    if report.bad_dates > 0 {
                        tracing::warn!(
                            feed = %url,
                            bad_dates = report.bad_dates,
                            "Entry timestamps could not be parsed"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(feed = %url, error = %e, "Parse failed, keeping partial results");
                }
            },
            Err(e) => {
                tracing::warn!(feed = %url, error = %e, "Fetch failed, treating feed as empty");
            }
        }
        feeds.push(parsed);
    }

    let report = diff::diff(&previous, &feeds);
    if report.is_empty() {
        tracing::info!("No new posts");
    } else {
        tracing::info!(
            new_posts = report.new_posts,
            feeds = report.updates.len(),
            "New posts found"
        );
        if let Err(e) = settings
            .notifier
            .send(&report.summary(), &report.body())
            .await
        {
            tracing::error!(error = %e, "Notification failed");
        }
    }

    // Persist regardless of the notification outcome; a failed write is
    // reported but does not roll back the run.
    let next = Snapshot {
        fetched: Utc::now().timestamp(),
        feeds,
    };
    if let Err(e) = snapshot::store(&settings.cache, &next) {
        tracing::error!(path = %settings.cache.display(), error = %e, "Failed to store snapshot");
    }

    Ok(())
}

async fn run_notify(settings: &Settings) -> Result<()> {
    settings
        .notifier
        .send("feedping", "Test notification — desktop wiring works.")
        .await
        .context("Failed to send test notification")?;
    println!("Test notification sent.");
    Ok(())
}

fn run_clean(settings: &Settings) -> Result<()> {
    let removed = snapshot::clean(&settings.cache).context("Failed to delete snapshot")?;
    if removed {
        println!("Deleted snapshot at {}", settings.cache.display());
    } else {
        println!("No snapshot at {}", settings.cache.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let settings = resolve_settings(&args)?;

    match args.command.unwrap_or(CliCommand::Fetch) {
        CliCommand::Fetch => run_fetch(&settings).await,
        CliCommand::Notify => run_notify(&settings).await,
        CliCommand::Clean => run_clean(&settings),
    }
}
