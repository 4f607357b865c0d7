//! One complete run, as triggered by a timer or the webhook.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::{Config, env_check};
use crate::gateway::{Archive, JellyfinClient, MediaServer, TubeArchivistClient};
use crate::library::{Reconciler, RunSummary, ShowOutcome};
use crate::wait::{Clock, SystemClock};

/// Checks the environment, verifies both servers answer and reconciles the
/// library.
pub fn run_once(config: &Config) -> Result<RunSummary> {
    env_check(config)?;
    let jellyfin = JellyfinClient::new(&config.jf_url, &config.jf_token);
    let archivist = TubeArchivistClient::new(&config.ta_url, &config.ta_token);
    run_with(config, &jellyfin, &archivist, &SystemClock)
}

/// [`run_once`] against arbitrary gateways, without the filesystem check.
pub fn run_with(
    config: &Config,
    server: &dyn MediaServer,
    archive: &dyn Archive,
    clock: &dyn Clock,
) -> Result<RunSummary> {
    server.ping().context("checking jellyfin")?;
    archive.ping().context("checking tube archivist")?;

    let settings = config.sync_settings();
    let summary = Reconciler::new(server, archive, clock, &settings)
        .reconcile_library()
        .context("reconciling library")?;
    log_summary(&summary);
    Ok(summary)
}

fn log_summary(summary: &RunSummary) {
    for report in &summary.shows {
        match &report.outcome {
            ShowOutcome::Completed(status) => info!(show = %report.show, ?status, "show done"),
            ShowOutcome::Failed(reason) => warn!(show = %report.show, %reason, "show failed"),
        }
    }
}
