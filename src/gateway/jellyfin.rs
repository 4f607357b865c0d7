use base64::{Engine, engine::general_purpose::STANDARD};
use serde::de::DeserializeOwned;
use tracing::info;

use super::{ItemQuery, MediaServer, build_agent, request_error};
use crate::error::{Result, SyncError};
use crate::models::{ImageSlot, ItemList, ItemUpdate, LibraryItem};

const REFRESH_QUERY: &str =
    "Recursive=true&ImageRefreshMode=Default&MetadataRefreshMode=Default";

/// Blocking Jellyfin API client.
#[derive(Clone)]
pub struct JellyfinClient {
    agent: ureq::Agent,
    base: String,
    auth: String,
}

impl std::fmt::Debug for JellyfinClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JellyfinClient")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl JellyfinClient {
    pub fn new(base: &str, token: &str) -> Self {
        Self {
            agent: build_agent(),
            base: base.trim_end_matches('/').to_string(),
            auth: format!("MediaBrowser Token={token}"),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .agent
            .get(&url)
            .set("Authorization", &self.auth)
            .call()
            .map_err(|err| request_error(&url, err))?;
        response
            .into_json::<T>()
            .map_err(|source| SyncError::Decode { url, source })
    }

    fn get_items(&self, path: &str) -> Result<Vec<LibraryItem>> {
        Ok(self.get_json::<ItemList>(path)?.items)
    }
}

impl MediaServer for JellyfinClient {
    fn ping(&self) -> Result<()> {
        let users = self
            .get_json::<serde_json::Value>("Users")
            .map_err(|err| SyncError::Connection {
                service: "jellyfin",
                reason: err.to_string(),
            })?;
        let empty = match &users {
            serde_json::Value::Null => true,
            serde_json::Value::Array(list) => list.is_empty(),
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            return Err(SyncError::Connection {
                service: "jellyfin",
                reason: "empty response from Users".to_string(),
            });
        }
        info!("verified jellyfin connection");
        Ok(())
    }

    fn items(&self, query: &ItemQuery) -> Result<Vec<LibraryItem>> {
        self.get_items(&query.to_path())
    }

    fn media_folders(&self) -> Result<Vec<LibraryItem>> {
        self.get_items("Library/MediaFolders")
    }

    fn episodes(&self, show_id: &str) -> Result<Vec<LibraryItem>> {
        self.get_items(&format!("Shows/{show_id}/Episodes?fields=Path,Studios"))
    }

    fn seasons(&self, show_id: &str) -> Result<Vec<LibraryItem>> {
        self.get_items(&format!("Shows/{show_id}/Seasons"))
    }

    fn update_item(&self, update: &ItemUpdate) -> Result<()> {
        let url = self.url(&format!("Items/{}", update.id));
        self.agent
            .post(&url)
            .set("Authorization", &self.auth)
            .send_json(update)
            .map_err(|err| request_error(&url, err))?;
        Ok(())
    }

    fn refresh_item(&self, item_id: &str) -> Result<()> {
        let url = self.url(&format!("Items/{item_id}/Refresh?{REFRESH_QUERY}"));
        self.agent
            .post(&url)
            .set("Authorization", &self.auth)
            .call()
            .map_err(|err| request_error(&url, err))?;
        Ok(())
    }

    fn upload_image(&self, item_id: &str, slot: ImageSlot, image: &[u8]) -> Result<()> {
        let url = self.url(&format!("Items/{item_id}/Images/{}", slot.as_str()));
        // Jellyfin expects the image body itself to be base64 text.
        let encoded = STANDARD.encode(image);
        self.agent
            .post(&url)
            .set("Authorization", &self.auth)
            .set("Content-Type", "image/jpeg")
            .send_bytes(encoded.as_bytes())
            .map_err(|err| request_error(&url, err))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Answers a single request with `200 OK` and a JSON `body`.
    fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = JellyfinClient::new("http://jellyfin:8096/", "secret");
        assert_eq!(client.url("Users"), "http://jellyfin:8096/Users");
        assert_eq!(client.auth, "MediaBrowser Token=secret");
    }

    #[test]
    fn debug_output_hides_token() {
        let client = JellyfinClient::new("http://jellyfin:8096", "secret");
        assert!(!format!("{client:?}").contains("secret"));
    }

    #[test]
    fn ping_accepts_user_list() {
        let client = JellyfinClient::new(&serve_once(r#"[{"Name":"admin"}]"#), "secret");
        client.ping().unwrap();
    }

    #[test]
    fn ping_rejects_empty_user_list() {
        let client = JellyfinClient::new(&serve_once("[]"), "secret");
        assert!(matches!(
            client.ping(),
            Err(SyncError::Connection {
                service: "jellyfin",
                ..
            })
        ));
    }

    #[test]
    fn ping_reports_unreachable_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = JellyfinClient::new(&format!("http://{addr}"), "secret");
        assert!(matches!(client.ping(), Err(SyncError::Connection { .. })));
    }
}
