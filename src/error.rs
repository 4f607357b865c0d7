use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("failed to connect to {service}: {reason}")]
    Connection {
        service: &'static str,
        reason: String,
    },

    #[error("{kind} not found in archive: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("image at {url} exceeds {limit} bytes")]
    ImageTooLarge { url: String, limit: u64 },

    #[error("unparseable publish timestamp {value:?}")]
    Timestamp { value: String },

    #[error("season {season} of {show} was not indexed after {attempts} attempts")]
    SeasonTimeout {
        show: String,
        season: i32,
        attempts: u32,
    },

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot derive a channel folder from {0:?}")]
    UnexpectedPath(String),

    #[error("collection folder {0:?} not found")]
    CollectionMissing(String),

    #[error("{failed} show(s) failed to sync")]
    ShowsFailed { failed: usize },
}

impl SyncError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Errors raised while waiting on the media server's scanner.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::SeasonTimeout { .. })
    }
}

/// What an entity missing from the archive means for the show pass that
/// asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundPolicy {
    /// Leave the show alone and carry on with the run.
    SkipShow,
    /// Abort the show pass with [`SyncError::NotFound`].
    FailShow,
}

impl NotFoundPolicy {
    pub fn apply<T>(self, kind: &'static str, id: &str, found: Option<T>) -> Result<Option<T>> {
        match (found, self) {
            (Some(value), _) => Ok(Some(value)),
            (None, NotFoundPolicy::SkipShow) => Ok(None),
            (None, NotFoundPolicy::FailShow) => Err(SyncError::NotFound {
                kind,
                id: id.to_string(),
            }),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
