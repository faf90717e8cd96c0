//! Catalog capabilities consumed by the repair pipeline
//!
//! The pipeline never talks HTTP directly. It depends on two traits:
//! - [`PrimaryCatalog`]: the authoritative inventory (listing, existence,
//!   search, metadata, insert, delete)
//! - [`SecondaryCatalog`]: an alternate view of the same playlist with its
//!   own availability flags
//!
//! Concrete adapters live in the submodules; tests inject in-memory fakes.

pub mod rate_limiter;
pub mod secondary_view;
pub mod youtube_client;

pub use rate_limiter::RateLimiter;
pub use secondary_view::ExportedSecondaryView;
pub use youtube_client::YouTubeClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest id list the backend accepts in one existence/metadata call
pub const MAX_BATCH_SIZE: usize = 50;

/// Catalog transport errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Authorization failed: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw playlist item as returned by one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItem {
    /// Slot identifier
    pub entry_id: String,
    pub title: Option<String>,
    pub content_id: Option<String>,
    pub position: Option<u32>,
}

/// One page of a playlist listing
#[derive(Debug, Clone, Default)]
pub struct PlaylistPage {
    pub items: Vec<PlaylistItem>,
    /// Continuation token; `None` on the last page
    pub next_page_token: Option<String>,
}

/// Title/provenance metadata for one content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub content_id: String,
    pub title: String,
    /// Channel / provenance name
    pub channel_title: String,
    /// Length in seconds, when known
    pub length_seconds: Option<u64>,
}

/// One track of the secondary catalog's playlist view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryTrack {
    pub title: String,
    pub artist: String,
    pub content_id: Option<String>,
    pub is_available: bool,
}

impl SecondaryTrack {
    /// "title - artist" label for reports
    pub fn label(&self) -> String {
        if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.artist)
        }
    }
}

/// Primary catalog capability set
#[async_trait]
pub trait PrimaryCatalog: Send + Sync {
    /// Largest id list accepted by `check_content_exists` / `fetch_content_metadata`
    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }

    /// Fetch one page of a playlist
    async fn list_playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<PlaylistPage, CatalogError>;

    /// Return the subset of `content_ids` that exist
    async fn check_content_exists(&self, content_ids: &[String])
        -> Result<Vec<String>, CatalogError>;

    /// Search content, returning at most `limit` ids in relevance order
    async fn search_content(&self, query: &str, limit: u32) -> Result<Vec<String>, CatalogError>;

    /// Fetch metadata for all `content_ids` in one call; unknown ids are omitted
    async fn fetch_content_metadata(
        &self,
        content_ids: &[String],
    ) -> Result<Vec<ContentMetadata>, CatalogError>;

    /// Insert `content_id` into the playlist, returning the new entry id
    async fn insert_entry(
        &self,
        playlist_id: &str,
        content_id: &str,
        position: Option<u32>,
    ) -> Result<String, CatalogError>;

    /// Delete a playlist slot
    async fn delete_entry(&self, entry_id: &str) -> Result<(), CatalogError>;
}

/// Secondary catalog capability
#[async_trait]
pub trait SecondaryCatalog: Send + Sync {
    /// The secondary catalog's view of `playlist_id`
    async fn playlist_view(&self, playlist_id: &str) -> Result<Vec<SecondaryTrack>, CatalogError>;
}
