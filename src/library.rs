//! Top-level reconciliation over every show in the managed collection.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{error, info, warn};

use crate::error::{Result, SyncError};
use crate::gateway::{Archive, ItemQuery, MediaServer};
use crate::models::{ImageSlot, LibraryItem};
use crate::show::{ShowStatus, ShowSync, SyncContext, remove_season_folders};
use crate::wait::{Clock, PollSettings};

/// What to do with the rest of the run once a show pass fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failing show.
    #[default]
    Abort,
    /// Attempt every show, then report the run as failed.
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            other => Err(format!("unknown failure policy {other:?} (expected abort or continue)")),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::Continue => "continue",
        })
    }
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Archive video root, where season folders are created.
    pub video_root: PathBuf,
    /// Name of the managed collection, matched case-insensitively.
    pub collection_name: String,
    /// Image pushed as the collection's primary artwork.
    pub collection_art: PathBuf,
    pub on_show_failure: FailurePolicy,
    pub season_poll: PollSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowOutcome {
    Completed(ShowStatus),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowReport {
    pub show: String,
    pub outcome: ShowOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub shows: Vec<ShowReport>,
    /// Placeholder folders that survived every removal attempt.
    pub leftover_folders: Vec<PathBuf>,
}

impl RunSummary {
    pub fn episodes_synced(&self) -> usize {
        self.shows
            .iter()
            .map(|report| match report.outcome {
                ShowOutcome::Completed(ShowStatus::Synced { episodes, .. }) => episodes,
                _ => 0,
            })
            .sum()
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, ShowOutcome::Completed(ShowStatus::Skipped { .. })))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, ShowOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&ShowOutcome) -> bool) -> usize {
        self.shows.iter().filter(|report| pred(&report.outcome)).count()
    }
}

pub struct Reconciler<'a> {
    server: &'a dyn MediaServer,
    archive: &'a dyn Archive,
    clock: &'a dyn Clock,
    settings: &'a SyncSettings,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        server: &'a dyn MediaServer,
        archive: &'a dyn Archive,
        clock: &'a dyn Clock,
        settings: &'a SyncSettings,
    ) -> Self {
        Self {
            server,
            archive,
            clock,
            settings,
        }
    }

    /// Syncs every show under the managed collection, then refreshes the
    /// collection itself.
    pub fn reconcile_library(&self) -> Result<RunSummary> {
        let folder_id = self.managed_folder_id()?;
        let shows = self.server.items(&ItemQuery::series_under(&folder_id))?;
        info!(count = shows.len(), "found shows in collection");

        let ctx = SyncContext {
            server: self.server,
            archive: self.archive,
            clock: self.clock,
            video_root: &self.settings.video_root,
            season_poll: self.settings.season_poll,
        };
        let pass = ShowSync::new(ctx);
        let mut summary = RunSummary::default();
        let mut leftovers = Vec::new();

        for show in &shows {
            let outcome = match pass.run(show, &mut leftovers) {
                Ok(status) => ShowOutcome::Completed(status),
                Err(err) if self.settings.on_show_failure == FailurePolicy::Abort => {
                    error!(show = %show.name, error = %err, "show sync failed, aborting run");
                    sweep_leftovers(leftovers);
                    return Err(err);
                }
                Err(err) => {
                    error!(show = %show.name, error = %err, "show sync failed, continuing");
                    ShowOutcome::Failed(err.to_string())
                }
            };
            summary.shows.push(ShowReport {
                show: show.name.clone(),
                outcome,
            });
        }

        self.refresh_collection()?;
        summary.leftover_folders = sweep_leftovers(leftovers);

        info!(
            shows = summary.shows.len(),
            episodes = summary.episodes_synced(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            "library sync finished"
        );
        match summary.failed() {
            0 => Ok(summary),
            failed => Err(SyncError::ShowsFailed { failed }),
        }
    }

    fn managed_folder_id(&self) -> Result<String> {
        let folders = self.server.items(&ItemQuery::folders())?;
        self.find_collection(folders)
    }

    fn find_collection(&self, folders: Vec<LibraryItem>) -> Result<String> {
        let wanted = &self.settings.collection_name;
        folders
            .into_iter()
            .find(|folder| folder.name.eq_ignore_ascii_case(wanted))
            .map(|folder| folder.id)
            .ok_or_else(|| SyncError::CollectionMissing(wanted.clone()))
    }

    /// Re-skins the top-level media collection and asks for a recursive
    /// refresh so the new season groupings and artwork propagate.
    fn refresh_collection(&self) -> Result<()> {
        let collection_id = self.find_collection(self.server.media_folders()?)?;

        let art = &self.settings.collection_art;
        match fs::read(art) {
            Ok(image) => {
                if let Err(err) = self
                    .server
                    .upload_image(&collection_id, ImageSlot::Primary, &image)
                {
                    warn!(error = %err, "collection artwork update failed");
                }
            }
            Err(err) => {
                warn!(path = %art.display(), error = %err, "collection artwork unavailable")
            }
        }

        if let Err(err) = self.server.refresh_item(&collection_id) {
            warn!(error = %err, "collection refresh request failed");
        }
        Ok(())
    }
}

/// Last attempt at removing placeholder folders earlier passes could not
/// clean up. Whatever survives is logged and handed back.
fn sweep_leftovers(leftovers: Vec<PathBuf>) -> Vec<PathBuf> {
    let remaining = remove_season_folders(leftovers);
    for folder in &remaining {
        warn!(folder = %folder.display(), "season folder left behind");
    }
    remaining
}
