//! Boundaries to the two remote services.
//!
//! The synchronizers only ever talk to [`MediaServer`] and [`Archive`]; the
//! blocking HTTP implementations live in the submodules and tests swap in
//! in-memory fakes.

mod archivist;
mod jellyfin;

use std::time::Duration;

pub use archivist::TubeArchivistClient;
pub use jellyfin::JellyfinClient;

use crate::error::{Result, SyncError};
use crate::models::{Channel, ImageSlot, ItemUpdate, LibraryItem, Video};

/// Per-request timeout for both services.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The media server side (Jellyfin).
pub trait MediaServer {
    fn ping(&self) -> Result<()>;

    /// Generic `Items` listing.
    fn items(&self, query: &ItemQuery) -> Result<Vec<LibraryItem>>;

    /// Top-level library collections (`Library/MediaFolders`).
    fn media_folders(&self) -> Result<Vec<LibraryItem>>;

    /// Episodes of a show, including their paths and studios.
    fn episodes(&self, show_id: &str) -> Result<Vec<LibraryItem>>;

    /// Seasons the server has indexed for a show.
    fn seasons(&self, show_id: &str) -> Result<Vec<LibraryItem>>;

    fn update_item(&self, update: &ItemUpdate) -> Result<()>;

    /// Recursive metadata and image refresh of an item.
    fn refresh_item(&self, item_id: &str) -> Result<()>;

    /// Uploads raw image bytes into one of the item's image slots.
    fn upload_image(&self, item_id: &str, slot: ImageSlot, image: &[u8]) -> Result<()>;
}

/// The archive side (Tube Archivist). Lookups answer `None` when the archive
/// does not know the id.
pub trait Archive {
    fn ping(&self) -> Result<()>;

    fn video(&self, video_id: &str) -> Result<Option<Video>>;

    fn channel(&self, channel_id: &str) -> Result<Option<Channel>>;

    /// Fetches an artwork file by the path the archive reported for it.
    fn thumbnail(&self, path: &str) -> Result<Vec<u8>>;
}

/// Filters for the generic `Items` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuery {
    pub item_type: &'static str,
    pub parent_id: Option<String>,
    pub fields: Option<&'static str>,
}

impl ItemQuery {
    /// Every folder anywhere in the library.
    pub fn folders() -> Self {
        Self {
            item_type: "Folder",
            parent_id: None,
            fields: None,
        }
    }

    /// Every series below `parent_id`, with paths.
    pub fn series_under(parent_id: &str) -> Self {
        Self {
            item_type: "Series",
            parent_id: Some(parent_id.to_string()),
            fields: Some("ParentId,Path"),
        }
    }

    /// Relative request path, query string included.
    pub fn to_path(&self) -> String {
        let mut path = format!("Items?Recursive=true&IncludeItemTypes={}", self.item_type);
        if let Some(fields) = self.fields {
            path.push_str("&fields=");
            path.push_str(fields);
        }
        if let Some(parent_id) = &self.parent_id {
            path.push_str("&ParentId=");
            path.push_str(parent_id);
        }
        path
    }
}

fn request_error(url: &str, err: ureq::Error) -> SyncError {
    match err {
        ureq::Error::Status(status, _) => SyncError::Status {
            url: url.to_string(),
            status,
        },
        ureq::Error::Transport(transport) => SyncError::Http {
            url: url.to_string(),
            reason: transport.to_string(),
        },
    }
}

fn build_agent() -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build()
}
