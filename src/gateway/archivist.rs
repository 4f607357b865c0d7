use std::io::Read;

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::{Archive, build_agent, request_error};
use crate::error::{Result, SyncError};
use crate::models::{ArchiveEnvelope, Channel, Video};

// Generous ceiling for a single artwork download.
const MAX_IMAGE_BYTES: u64 = 25 * 1024 * 1024;

/// Blocking Tube Archivist API client.
#[derive(Clone)]
pub struct TubeArchivistClient {
    agent: ureq::Agent,
    base: String,
    auth: String,
}

impl std::fmt::Debug for TubeArchivistClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TubeArchivistClient")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl TubeArchivistClient {
    pub fn new(base: &str, token: &str) -> Self {
        Self {
            agent: build_agent(),
            base: base.trim_end_matches('/').to_string(),
            auth: format!("Token {token}"),
        }
    }

    /// Fetches `data` from an API endpoint. Any non-success status means the
    /// archive does not have the entity.
    fn lookup<T: DeserializeOwned>(&self, url: String) -> Result<Option<T>> {
        let response = match self.agent.get(&url).set("Authorization", &self.auth).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                warn!(%url, status, "not found in archive");
                return Ok(None);
            }
            Err(err) => return Err(request_error(&url, err)),
        };
        let envelope = response
            .into_json::<ArchiveEnvelope<T>>()
            .map_err(|source| SyncError::Decode { url, source })?;
        Ok(Some(envelope.data))
    }
}

impl Archive for TubeArchivistClient {
    fn ping(&self) -> Result<()> {
        let url = format!("{}/api/ping/", self.base);
        self.agent
            .get(&url)
            .set("Authorization", &self.auth)
            .call()
            .map_err(|err| SyncError::Connection {
                service: "tube archivist",
                reason: request_error(&url, err).to_string(),
            })?;
        info!("verified tube archivist connection");
        Ok(())
    }

    fn video(&self, video_id: &str) -> Result<Option<Video>> {
        self.lookup(format!("{}/api/video/{video_id}/", self.base))
    }

    fn channel(&self, channel_id: &str) -> Result<Option<Channel>> {
        self.lookup(format!("{}/api/channel/{channel_id}/", self.base))
    }

    fn thumbnail(&self, path: &str) -> Result<Vec<u8>> {
        let url = format!("{}{path}", self.base);
        let response = self
            .agent
            .get(&url)
            .set("Authorization", &self.auth)
            .call()
            .map_err(|err| request_error(&url, err))?;
        read_image(response.into_reader(), MAX_IMAGE_BYTES, url)
    }
}

/// Reads a whole image body, refusing anything over `limit` bytes rather than
/// handing back a cut-off file.
fn read_image(reader: impl Read, limit: u64, url: String) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    if let Err(source) = reader.take(limit + 1).read_to_end(&mut bytes) {
        return Err(SyncError::Decode { url, source });
    }
    if bytes.len() as u64 > limit {
        return Err(SyncError::ImageTooLarge { url, limit });
    }
    Ok(bytes)
}
