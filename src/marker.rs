//! "Already synced" bookkeeping for episodes.
//!
//! There is no private state store: an episode counts as synced once its
//! studio list carries the sentinel studio written by [`mark_synced`]. Anything
//! that needs to know about that convention goes through this module.

use crate::models::{ItemUpdate, LibraryItem, Studio};

pub const SENTINEL_STUDIO: &str = "YouTube";

/// An episode with any studio assigned has been through a sync before.
pub fn is_synced(episode: &LibraryItem) -> bool {
    !episode.studios.is_empty()
}

pub fn mark_synced(update: &mut ItemUpdate) {
    update.studios = vec![Studio {
        name: SENTINEL_STUDIO.to_string(),
    }];
}
