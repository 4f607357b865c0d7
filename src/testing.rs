//! In-memory stand-ins for both servers and the clock.
//!
//! `FakeServer` imitates Jellyfin's scanner: a refresh on a show looks at the
//! show's channel directory on disk and indexes every year-named folder it
//! finds as a season, optionally only after a number of season queries.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, SyncError};
use crate::gateway::{Archive, ItemQuery, MediaServer};
use crate::models::{Channel, ImageSlot, ItemUpdate, LibraryItem, Video};
use crate::wait::Clock;

/// File the scanner drops into season folders when `scan_leaves_file` is set.
pub const SCAN_LEFTOVER: &str = ".scan-cache";

#[derive(Default)]
pub struct FakeClock {
    sleeps: RefCell<Vec<Duration>>,
}

impl FakeClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Clock for FakeClock {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

pub fn show(id: &str, name: &str, path: &str) -> LibraryItem {
    LibraryItem {
        id: id.to_string(),
        name: name.to_string(),
        path: Some(path.to_string()),
        ..LibraryItem::default()
    }
}

pub fn episode(id: &str, path: &str) -> LibraryItem {
    LibraryItem {
        id: id.to_string(),
        name: id.to_string(),
        path: Some(path.to_string()),
        ..LibraryItem::default()
    }
}

pub fn folder(id: &str, name: &str) -> LibraryItem {
    LibraryItem {
        id: id.to_string(),
        name: name.to_string(),
        ..LibraryItem::default()
    }
}

pub fn video(id: &str, published: &str) -> Video {
    Video {
        youtube_id: id.to_string(),
        published: published.to_string(),
        title: format!("Video {id}"),
        description: Some(format!("About {id}")),
        vid_thumb_url: Some(format!("/cache/videos/{id}.jpg")),
    }
}

pub fn channel(id: &str, name: &str) -> Channel {
    Channel {
        channel_id: id.to_string(),
        channel_name: name.to_string(),
        channel_description: Some("Channel description".to_string()),
        channel_thumb_url: Some(format!("/cache/channels/{id}_thumb.jpg")),
        channel_banner_url: Some(format!("/cache/channels/{id}_banner.jpg")),
        channel_tvart_url: Some(format!("/cache/channels/{id}_tvart.jpg")),
    }
}

#[derive(Default)]
pub struct FakeServer {
    pub folders: Vec<LibraryItem>,
    pub media_folders: Vec<LibraryItem>,
    pub series: HashMap<String, Vec<LibraryItem>>,
    pub episodes: RefCell<HashMap<String, Vec<LibraryItem>>>,
    /// Season numbers already indexed per show.
    pub seasons: RefCell<HashMap<String, BTreeSet<i32>>>,
    /// Channel directory the scanner inspects when a show is refreshed.
    pub show_dirs: HashMap<String, PathBuf>,
    /// Season queries a freshly scanned season stays invisible for; `None`
    /// means the scanner never picks anything up.
    pub scan_delay: Option<u32>,
    pub fail_pushes: bool,
    pub fail_ping: bool,
    /// The scanner writes [`SCAN_LEFTOVER`] into every season folder it sees.
    pub scan_leaves_file: bool,
    pub pending: RefCell<Vec<(String, i32, u32)>>,
    pub updates: RefCell<Vec<ItemUpdate>>,
    pub refreshes: RefCell<Vec<String>>,
    pub images: RefCell<Vec<(String, ImageSlot, Vec<u8>)>>,
    pub season_queries: Cell<u32>,
    pub item_queries: Cell<u32>,
}

impl FakeServer {
    pub fn with_scan_delay(delay: u32) -> Self {
        Self {
            scan_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn add_show(&mut self, parent_id: &str, show: LibraryItem, dir: PathBuf) {
        self.show_dirs.insert(show.id.clone(), dir);
        self.episodes.borrow_mut().insert(show.id.clone(), Vec::new());
        self.series.entry(parent_id.to_string()).or_default().push(show);
    }

    pub fn add_episode(&self, show_id: &str, episode: LibraryItem) {
        self.episodes
            .borrow_mut()
            .entry(show_id.to_string())
            .or_default()
            .push(episode);
    }

    pub fn episode_updates(&self) -> Vec<ItemUpdate> {
        self.updates
            .borrow()
            .iter()
            .filter(|update| !update.studios.is_empty())
            .cloned()
            .collect()
    }

    pub fn images_for(&self, item_id: &str) -> Vec<ImageSlot> {
        self.images
            .borrow()
            .iter()
            .filter(|(id, _, _)| id == item_id)
            .map(|(_, slot, _)| *slot)
            .collect()
    }

    fn scan(&self, show_id: &str) {
        let (Some(delay), Some(dir)) = (self.scan_delay, self.show_dirs.get(show_id)) else {
            return;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            if let Ok(year) = entry.file_name().to_string_lossy().parse::<i32>() {
                if self.scan_leaves_file {
                    fs::write(entry.path().join(SCAN_LEFTOVER), b"scan").unwrap();
                }
                self.pending
                    .borrow_mut()
                    .push((show_id.to_string(), year, delay));
            }
        }
    }

    fn push_result(&self) -> Result<()> {
        if self.fail_pushes {
            return Err(SyncError::Status {
                url: "fake".to_string(),
                status: 500,
            });
        }
        Ok(())
    }
}

fn ping_result(fail: bool, service: &'static str) -> Result<()> {
    if fail {
        return Err(SyncError::Connection {
            service,
            reason: "connection refused".to_string(),
        });
    }
    Ok(())
}

impl MediaServer for FakeServer {
    fn ping(&self) -> Result<()> {
        ping_result(self.fail_ping, "jellyfin")
    }

    fn items(&self, query: &ItemQuery) -> Result<Vec<LibraryItem>> {
        self.item_queries.set(self.item_queries.get() + 1);
        match (query.item_type, &query.parent_id) {
            ("Folder", _) => Ok(self.folders.clone()),
            ("Series", Some(parent)) => Ok(self.series.get(parent).cloned().unwrap_or_default()),
            _ => Ok(Vec::new()),
        }
    }

    fn media_folders(&self) -> Result<Vec<LibraryItem>> {
        Ok(self.media_folders.clone())
    }

    fn episodes(&self, show_id: &str) -> Result<Vec<LibraryItem>> {
        Ok(self
            .episodes
            .borrow()
            .get(show_id)
            .cloned()
            .unwrap_or_default())
    }

    fn seasons(&self, show_id: &str) -> Result<Vec<LibraryItem>> {
        self.season_queries.set(self.season_queries.get() + 1);
        let mut pending = self.pending.borrow_mut();
        let mut seasons = self.seasons.borrow_mut();
        pending.retain_mut(|(show, year, remaining)| {
            if show.as_str() != show_id {
                return true;
            }
            if *remaining == 0 {
                seasons.entry(show.clone()).or_default().insert(*year);
                return false;
            }
            *remaining -= 1;
            true
        });
        Ok(seasons
            .get(show_id)
            .into_iter()
            .flatten()
            .map(|year| LibraryItem {
                id: format!("{show_id}-{year}"),
                name: format!("Season {year}"),
                index_number: Some(*year),
                ..LibraryItem::default()
            })
            .collect())
    }

    fn update_item(&self, update: &ItemUpdate) -> Result<()> {
        self.updates.borrow_mut().push(update.clone());
        self.push_result()?;
        if !update.studios.is_empty() {
            for episodes in self.episodes.borrow_mut().values_mut() {
                for episode in episodes.iter_mut().filter(|ep| ep.id == update.id) {
                    episode.studios = update.studios.clone();
                }
            }
        }
        Ok(())
    }

    fn refresh_item(&self, item_id: &str) -> Result<()> {
        self.refreshes.borrow_mut().push(item_id.to_string());
        self.scan(item_id);
        Ok(())
    }

    fn upload_image(&self, item_id: &str, slot: ImageSlot, image: &[u8]) -> Result<()> {
        self.images
            .borrow_mut()
            .push((item_id.to_string(), slot, image.to_vec()));
        self.push_result()
    }
}

#[derive(Default)]
pub struct FakeArchive {
    pub videos: HashMap<String, Video>,
    pub channels: HashMap<String, Channel>,
    pub thumbnail_requests: RefCell<Vec<String>>,
    pub fail_ping: bool,
}

impl FakeArchive {
    pub fn add_video(&mut self, video: Video) {
        self.videos.insert(video.youtube_id.clone(), video);
    }

    pub fn add_channel(&mut self, channel: Channel) {
        self.channels.insert(channel.channel_id.clone(), channel);
    }
}

impl Archive for FakeArchive {
    fn ping(&self) -> Result<()> {
        ping_result(self.fail_ping, "tube archivist")
    }

    fn video(&self, video_id: &str) -> Result<Option<Video>> {
        Ok(self.videos.get(video_id).cloned())
    }

    fn channel(&self, channel_id: &str) -> Result<Option<Channel>> {
        Ok(self.channels.get(channel_id).cloned())
    }

    fn thumbnail(&self, path: &str) -> Result<Vec<u8>> {
        self.thumbnail_requests.borrow_mut().push(path.to_string());
        Ok(path.as_bytes().to_vec())
    }
}
