//! plfix - playlist repair tool
//!
//! Finds playlist entries whose content is unavailable, picks a replacement
//! by title search, and swaps it in at the same position. Dry run unless
//! `--apply` is given.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use plfix::catalog::{ExportedSecondaryView, SecondaryCatalog, YouTubeClient};
use plfix::config::{log_filter, CliOverrides, Settings};
use plfix::services::{
    DetectionPolicy, JsonFileSearchCache, ReconcileOptions, SnapshotWriter, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_SEARCH_LIMIT,
};
use plfix::workflow::{ConsoleObserver, FanoutObserver, RepairRun, RunError, TracingObserver};
use plfix_common::config::load_toml_config;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for plfix
#[derive(Parser, Debug)]
#[command(name = "plfix")]
#[command(about = "Fix unavailable playlist items")]
#[command(version)]
struct Args {
    /// Playlist ID (the value after list=)
    #[arg(short, long)]
    playlist: String,

    /// Actually modify the playlist (default: dry run)
    #[arg(long)]
    apply: bool,

    /// Max broken items to attempt
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max: usize,

    /// Do not delete broken items (insert only)
    #[arg(long)]
    keep_broken: bool,

    /// Detection policy: primary, secondary or both
    #[arg(long, default_value = "primary")]
    policy: DetectionPolicy,

    /// JSON export of the secondary catalog's view of the playlist
    #[arg(long)]
    secondary_view: Option<PathBuf>,

    /// Search results considered per broken item
    #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
    limit: u32,

    /// Directory for pre-run playlist backups
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// Search result cache file
    #[arg(long)]
    cache_file: Option<PathBuf>,

    /// OAuth bearer token with playlist edit scope
    #[arg(long)]
    access_token: Option<String>,

    /// Config file (default: ~/.config/plfix/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing; RUST_LOG wins over the config file level
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new(log_filter("info"))));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let toml_config =
        load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;
    if !from_env {
        let directive = log_filter(&toml_config.logging.level);
        if let Err(e) = filter_handle.modify(|filter| *filter = EnvFilter::new(&directive)) {
            tracing::warn!("Could not apply configured log level: {}", e);
        }
    }

    if args.policy.uses_secondary() && args.secondary_view.is_none() {
        bail!(
            "--policy {} needs the secondary catalog view: pass --secondary-view <PATH>",
            args.policy
        );
    }

    let overrides = CliOverrides {
        access_token: args.access_token.clone(),
        backup_dir: args.backup_dir.clone(),
        cache_file: args.cache_file.clone(),
    };
    let settings =
        Settings::resolve(&overrides, &toml_config).context("Failed to resolve settings")?;

    info!(
        playlist = %args.playlist,
        apply = args.apply,
        policy = %args.policy,
        backup_dir = %settings.backup_dir.display(),
        "Starting plfix"
    );

    let client = YouTubeClient::new(
        settings.api_base_url.clone(),
        settings.access_token.clone(),
        settings.request_interval_ms,
    )
    .context("Failed to initialize catalog client")?;

    let secondary = args.secondary_view.as_ref().map(|path| {
        Arc::new(ExportedSecondaryView::new(path)) as Arc<dyn SecondaryCatalog>
    });

    let cache = JsonFileSearchCache::open(&settings.cache_file).with_context(|| {
        format!(
            "Failed to open search cache {}",
            settings.cache_file.display()
        )
    })?;

    let options = ReconcileOptions {
        playlist_id: args.playlist.clone(),
        apply: args.apply,
        keep_broken: args.keep_broken,
        max_attempts: args.max,
        search_limit: args.limit,
    };

    let run = RepairRun::new(
        Arc::new(client),
        secondary,
        Arc::new(cache),
        SnapshotWriter::new(settings.backup_dir.clone()),
        args.policy,
        options,
    );

    let observer = FanoutObserver::new()
        .with(ConsoleObserver::stdout())
        .with(TracingObserver);

    let summary = match run.run(&observer).await {
        Ok(summary) => summary,
        Err(e) => {
            if let RunError::Search(stopped) = &e {
                for outcome in stopped.mutations() {
                    tracing::warn!(
                        attempt = outcome.attempt,
                        position = outcome.record.entry.position,
                        title = %outcome.record.entry.title,
                        outcome = ?outcome.kind,
                        inserted = ?outcome.inserted_entry_id,
                        "Changed before the run stopped"
                    );
                }
                tracing::warn!(
                    finished = stopped.completed.len(),
                    untouched = stopped.untouched,
                    "Run stopped early; fix the error and run again"
                );
            }
            return Err(e).context("Repair run failed");
        }
    };

    let attention = summary.attention_needed().count();
    if attention > 0 {
        tracing::warn!(
            run_id = %summary.run_id,
            attention,
            "Some records need manual attention"
        );
    }
    Ok(())
}
