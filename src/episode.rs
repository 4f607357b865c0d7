//! Pushes one archived video onto its Jellyfin episode.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::error::{NotFoundPolicy, Result, SyncError};
use crate::gateway::{Archive, MediaServer};
use crate::marker;
use crate::models::{ImageSlot, ItemUpdate, LibraryItem, Video};
use crate::overview::clean_overview;

/// A video the media server lists but the archive does not know is an error.
pub const MISSING_VIDEO: NotFoundPolicy = NotFoundPolicy::FailShow;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A parsed publish timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishDate {
    pub year: i32,
    /// ISO-8601 rendition handed to Jellyfin as the premiere date.
    pub iso: String,
}

impl PublishDate {
    /// Accepts RFC 3339, naive date-times and plain `YYYY-MM-DD` dates.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Self {
                year: datetime.year(),
                iso: datetime.to_rfc3339(),
            });
        }
        let naive = NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .ok_or_else(|| SyncError::Timestamp {
                value: raw.to_string(),
            })?;
        Ok(Self {
            year: naive.year(),
            iso: naive.format("%Y-%m-%dT%H:%M:%S").to_string(),
        })
    }
}

/// Video id encoded in an episode's file name: everything before the first dot.
pub fn video_id_from_path(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next()?;
    file_name.split('.').next().filter(|stem| !stem.is_empty())
}

/// Builds the metadata update for an episode, sync marker included.
pub fn episode_update(video: &Video, episode_id: &str, published: &PublishDate) -> ItemUpdate {
    let mut update = ItemUpdate::new(episode_id, video.title.clone());
    update.production_year = Some(published.year);
    // Jellyfin groups episodes into the season whose index matches this.
    update.parent_index_number = Some(published.year);
    update.premiere_date = Some(published.iso.clone());
    update.overview = clean_overview(video.description.as_deref());
    marker::mark_synced(&mut update);
    update
}

/// Looks a video up in the archive, applying [`MISSING_VIDEO`].
pub fn fetch_video(archive: &dyn Archive, video_id: &str) -> Result<Option<Video>> {
    MISSING_VIDEO.apply("video", video_id, archive.video(video_id)?)
}

pub struct EpisodeSync<'a> {
    server: &'a dyn MediaServer,
    archive: &'a dyn Archive,
}

impl<'a> EpisodeSync<'a> {
    pub fn new(server: &'a dyn MediaServer, archive: &'a dyn Archive) -> Self {
        Self { server, archive }
    }

    /// Writes metadata and artwork. Push failures are logged and skipped; only
    /// an unreadable publish date is an error.
    pub fn sync(&self, video: &Video, episode: &LibraryItem) -> Result<()> {
        let published = PublishDate::parse(&video.published)?;
        let update = episode_update(video, &episode.id, &published);
        if let Err(err) = self.server.update_item(&update) {
            warn!(episode = %episode.id, error = %err, "episode metadata update failed");
        }
        self.update_artwork(video, &episode.id);
        info!(episode = %episode.id, video_id = %video.youtube_id, "synced episode");
        Ok(())
    }

    fn update_artwork(&self, video: &Video, episode_id: &str) {
        let Some(thumb_url) = video.vid_thumb_url.as_deref() else {
            debug!(episode = %episode_id, "video has no thumbnail");
            return;
        };
        let result = self
            .archive
            .thumbnail(thumb_url)
            .and_then(|image| self.server.upload_image(episode_id, ImageSlot::Primary, &image));
        if let Err(err) = result {
            warn!(episode = %episode_id, error = %err, "episode artwork update failed");
        }
    }
}
