//! Syncs one channel onto its Jellyfin show, episodes included.
//!
//! Jellyfin only groups episodes into a season once its scanner has seen a
//! directory for that season on disk. When an episode needs a season the
//! server does not have yet, the pass creates an empty
//! `{video_root}/{channel_folder}/{year}` directory, asks for a recursive
//! refresh of the show and polls until the season shows up. The placeholder
//! directories are removed again at the end of the pass, whether it succeeded
//! or not.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::episode::{EpisodeSync, PublishDate, fetch_video, video_id_from_path};
use crate::error::{NotFoundPolicy, Result, SyncError};
use crate::gateway::{Archive, MediaServer};
use crate::marker;
use crate::models::{Channel, ImageSlot, ItemUpdate, LibraryItem};
use crate::overview::clean_overview;
use crate::wait::{Clock, PollSettings, wait_until};

/// A show whose channel the archive does not know is left untouched.
pub const MISSING_CHANNEL: NotFoundPolicy = NotFoundPolicy::SkipShow;

/// Everything a show pass needs from the outside world.
#[derive(Clone, Copy)]
pub struct SyncContext<'a> {
    pub server: &'a dyn MediaServer,
    pub archive: &'a dyn Archive,
    pub clock: &'a dyn Clock,
    /// Root of the archive's video tree, as seen by this process.
    pub video_root: &'a Path,
    pub season_poll: PollSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowStatus {
    Synced {
        episodes: usize,
        seasons_created: usize,
    },
    /// Channel metadata refreshed, no pending episodes.
    UpToDate,
    Skipped {
        reason: String,
    },
}

/// Channel id a show's directory is named after.
pub fn channel_id_from_show_path(path: &str) -> Option<&str> {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

/// `{video_root}/{channel_folder}/{year}`, the channel folder being the
/// directory the episode file sits in.
pub fn season_folder(video_root: &Path, episode_path: &str, season: i32) -> Result<PathBuf> {
    let channel_folder = episode_path
        .rsplit('/')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| SyncError::UnexpectedPath(episode_path.to_string()))?;
    Ok(video_root.join(channel_folder).join(season.to_string()))
}

/// Removes placeholder season folders, returning those that could not be
/// removed. Folders that are already gone count as removed.
pub fn remove_season_folders<I>(folders: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    folders
        .into_iter()
        .filter(|folder| match fs::remove_dir(folder) {
            Ok(()) => {
                debug!(folder = %folder.display(), "removed season folder");
                false
            }
            Err(err) if err.kind() == ErrorKind::NotFound => false,
            Err(err) => {
                warn!(folder = %folder.display(), error = %err, "could not remove season folder");
                true
            }
        })
        .collect()
}

/// Folders created during one pass.
#[derive(Debug, Default)]
struct SeasonFolders {
    created: Vec<PathBuf>,
}

impl SeasonFolders {
    /// Creates `path` unless it already exists. Only folders created here are
    /// remembered for removal.
    fn create(&mut self, path: &Path) -> Result<()> {
        if path.is_dir() {
            debug!(folder = %path.display(), "season folder already exists");
            return Ok(());
        }
        fs::create_dir_all(path).map_err(|err| SyncError::filesystem(path, err))?;
        info!(folder = %path.display(), "created season folder");
        self.created.push(path.to_path_buf());
        Ok(())
    }
}

pub struct ShowSync<'a> {
    ctx: SyncContext<'a>,
}

impl<'a> ShowSync<'a> {
    pub fn new(ctx: SyncContext<'a>) -> Self {
        Self { ctx }
    }

    /// Runs the full pass for one show.
    ///
    /// Placeholder folders that could not be cleaned up are appended to
    /// `leftovers` so the caller can try again later.
    pub fn run(&self, show: &LibraryItem, leftovers: &mut Vec<PathBuf>) -> Result<ShowStatus> {
        let Some(channel_id) = show.path.as_deref().and_then(channel_id_from_show_path) else {
            warn!(show = %show.name, "show has no usable path");
            return Ok(ShowStatus::Skipped {
                reason: "show has no path".to_string(),
            });
        };
        let found = self.ctx.archive.channel(channel_id)?;
        let Some(channel) = MISSING_CHANNEL.apply("channel", channel_id, found)? else {
            warn!(show = %show.name, channel_id, "channel not found in archive, skipping");
            return Ok(ShowStatus::Skipped {
                reason: format!("channel {channel_id} not found in archive"),
            });
        };

        self.update_metadata(show, &channel);
        self.update_artwork(show, &channel);
        self.sync_episodes(show, leftovers)
    }

    fn update_metadata(&self, show: &LibraryItem, channel: &Channel) {
        let mut update = ItemUpdate::new(show.id.clone(), channel.channel_name.clone());
        update.overview = clean_overview(channel.channel_description.as_deref());
        if let Err(err) = self.ctx.server.update_item(&update) {
            warn!(show = %show.name, error = %err, "show metadata update failed");
        }
    }

    fn update_artwork(&self, show: &LibraryItem, channel: &Channel) {
        let artwork: [(&Option<String>, &[ImageSlot]); 3] = [
            (
                &channel.channel_thumb_url,
                &[ImageSlot::Primary, ImageSlot::Logo],
            ),
            (&channel.channel_banner_url, &[ImageSlot::Banner]),
            (&channel.channel_tvart_url, &[ImageSlot::Backdrop]),
        ];
        for (url, slots) in artwork {
            let Some(url) = url.as_deref() else {
                debug!(show = %show.name, ?slots, "channel has no artwork for slot");
                continue;
            };
            let image = match self.ctx.archive.thumbnail(url) {
                Ok(image) => image,
                Err(err) => {
                    warn!(show = %show.name, %url, error = %err, "could not fetch channel artwork");
                    continue;
                }
            };
            for slot in slots {
                if let Err(err) = self.ctx.server.upload_image(&show.id, *slot, &image) {
                    warn!(
                        show = %show.name,
                        slot = slot.as_str(),
                        error = %err,
                        "show artwork update failed"
                    );
                }
            }
        }
    }

    fn sync_episodes(
        &self,
        show: &LibraryItem,
        leftovers: &mut Vec<PathBuf>,
    ) -> Result<ShowStatus> {
        let pending: Vec<LibraryItem> = self
            .ctx
            .server
            .episodes(&show.id)?
            .into_iter()
            .filter(|episode| !marker::is_synced(episode))
            .collect();
        if pending.is_empty() {
            info!(show = %show.name, "no new videos found");
            return Ok(ShowStatus::UpToDate);
        }

        info!(show = %show.name, count = pending.len(), "indexing videos");
        let mut folders = SeasonFolders::default();
        let result = self.sync_pending(show, &pending, &mut folders);
        let seasons_created = folders.created.len();
        leftovers.extend(remove_season_folders(folders.created));

        Ok(ShowStatus::Synced {
            episodes: result?,
            seasons_created,
        })
    }

    fn sync_pending(
        &self,
        show: &LibraryItem,
        pending: &[LibraryItem],
        folders: &mut SeasonFolders,
    ) -> Result<usize> {
        let episodes = EpisodeSync::new(self.ctx.server, self.ctx.archive);
        let mut synced = 0;
        for episode in pending {
            let path = episode.path.as_deref().unwrap_or_default();
            let Some(video_id) = video_id_from_path(path) else {
                warn!(show = %show.name, episode = %episode.id, "episode has no usable path");
                continue;
            };
            let Some(video) = fetch_video(self.ctx.archive, video_id)? else {
                continue;
            };
            let published = PublishDate::parse(&video.published)?;
            self.ensure_season(show, path, published.year, folders)?;
            episodes.sync(&video, episode)?;
            synced += 1;
        }
        Ok(synced)
    }

    /// Makes sure Jellyfin has indexed `season` for the show before any
    /// episode is assigned to it.
    fn ensure_season(
        &self,
        show: &LibraryItem,
        episode_path: &str,
        season: i32,
        folders: &mut SeasonFolders,
    ) -> Result<()> {
        if self.has_season(&show.id, season)? {
            return Ok(());
        }

        let folder = season_folder(self.ctx.video_root, episode_path, season)?;
        folders.create(&folder)?;
        if let Err(err) = self.ctx.server.refresh_item(&show.id) {
            warn!(show = %show.name, error = %err, "show refresh request failed");
        }

        let indexed = wait_until(self.ctx.clock, self.ctx.season_poll, || {
            let found = self.has_season(&show.id, season)?;
            if !found {
                info!(show = %show.name, season, "waiting for season to be created");
            }
            Ok(found)
        })?;
        if !indexed {
            return Err(SyncError::SeasonTimeout {
                show: show.name.clone(),
                season,
                attempts: self.ctx.season_poll.max_attempts,
            });
        }
        Ok(())
    }

    fn has_season(&self, show_id: &str, season: i32) -> Result<bool> {
        Ok(self
            .ctx
            .server
            .seasons(show_id)?
            .iter()
            .any(|item| item.index_number == Some(season)))
    }
}
