#![forbid(unsafe_code)]

//! One-shot reconciliation, meant to be run from a timer or cron job.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tubefin::{app::run_once, cli::ConfigArgs, config::resolve_config, logging::init_tracing};

/// Sync Tube Archivist channels and videos into Jellyfin once and exit.
#[derive(Debug, Parser)]
#[command(name = "sync_library")]
struct SyncArgs {
    #[command(flatten)]
    config: ConfigArgs,
}

fn main() -> Result<()> {
    init_tracing()?;
    let args = SyncArgs::parse();
    let config = resolve_config(args.config.into_overrides())?;

    let summary = run_once(&config)?;
    info!(
        shows = summary.shows.len(),
        episodes = summary.episodes_synced(),
        "sync complete"
    );
    Ok(())
}
