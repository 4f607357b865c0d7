//! Wire shapes for the two remote services.
//!
//! Jellyfin speaks PascalCase JSON, Tube Archivist snake_case. Only the fields
//! the reconciler reads are declared; everything else is ignored on decode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Envelope Jellyfin wraps every item listing in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemList {
    #[serde(default)]
    pub items: Vec<LibraryItem>,
}

/// Any node of the Jellyfin tree: folder, series, season or episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LibraryItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_number: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub studios: Vec<Studio>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Studio {
    pub name: String,
}

/// Body of `POST Items/{id}`.
///
/// Optional fields are left out of the JSON entirely when unset so Jellyfin
/// keeps whatever it already had.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemUpdate {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub provider_ids: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_index_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premiere_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub studios: Vec<Studio>,
}

impl ItemUpdate {
    /// Blank update with cleared genre, tag and provider lists.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Image slots an item exposes under `Items/{id}/Images/{slot}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    Primary,
    Logo,
    Banner,
    Backdrop,
}

impl ImageSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageSlot::Primary => "Primary",
            ImageSlot::Logo => "Logo",
            ImageSlot::Banner => "Banner",
            ImageSlot::Backdrop => "Backdrop",
        }
    }
}

/// Tube Archivist nests every payload under `data`.
#[derive(Debug, Deserialize)]
pub struct ArchiveEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub channel_description: Option<String>,
    #[serde(default)]
    pub channel_thumb_url: Option<String>,
    #[serde(default)]
    pub channel_banner_url: Option<String>,
    #[serde(default)]
    pub channel_tvart_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub youtube_id: String,
    pub published: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub vid_thumb_url: Option<String>,
}
