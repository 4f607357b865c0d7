#![forbid(unsafe_code)]

//! Keeps a Jellyfin library in step with a Tube Archivist instance.
//!
//! Channels are modelled as shows and videos as episodes. Every run re-derives
//! its view of the world from both servers: the media server's own index is
//! the only state there is.

pub mod app;
pub mod cli;
pub mod config;
pub mod episode;
pub mod error;
pub mod gateway;
pub mod library;
pub mod logging;
pub mod marker;
pub mod models;
pub mod overview;
pub mod show;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, SyncError};
