//! Secondary catalog view loaded from an exported playlist file
//!
//! The export is the JSON shape produced by common YouTube Music tooling:
//!
//! ```json
//! {
//!   "id": "PL...",
//!   "tracks": [
//!     {"videoId": "abc", "title": "Song", "artists": [{"name": "Band"}], "isAvailable": false}
//!   ]
//! }
//! ```
//!
//! `videoId` may be null or missing for tracks the secondary catalog only
//! knows by title and artist.

use super::{CatalogError, SecondaryCatalog, SecondaryTrack};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct ExportedPlaylist {
    id: Option<String>,
    #[serde(default)]
    tracks: Vec<ExportedTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportedTrack {
    video_id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    artists: Vec<ExportedArtist>,
    #[serde(default = "default_available")]
    is_available: bool,
}

#[derive(Debug, Deserialize)]
struct ExportedArtist {
    #[serde(default)]
    name: String,
}

fn default_available() -> bool {
    true
}

/// File-backed secondary catalog view
pub struct ExportedSecondaryView {
    path: PathBuf,
}

impl ExportedSecondaryView {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse an export document into tracks
pub fn parse_export(content: &str, playlist_id: &str) -> Result<Vec<SecondaryTrack>, CatalogError> {
    let export: ExportedPlaylist =
        serde_json::from_str(content).map_err(|e| CatalogError::ParseError(e.to_string()))?;

    if let Some(id) = export.id.as_deref() {
        if id != playlist_id {
            tracing::warn!(
                export_id = %id,
                playlist_id = %playlist_id,
                "Secondary view export belongs to a different playlist"
            );
        }
    }

    Ok(export
        .tracks
        .into_iter()
        .map(|t| SecondaryTrack {
            title: t.title,
            artist: t
                .artists
                .iter()
                .map(|a| a.name.as_str())
                .filter(|n| !n.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            content_id: t.video_id.filter(|id| !id.is_empty()),
            is_available: t.is_available,
        })
        .collect())
}

#[async_trait]
impl SecondaryCatalog for ExportedSecondaryView {
    async fn playlist_view(&self, playlist_id: &str) -> Result<Vec<SecondaryTrack>, CatalogError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let tracks = parse_export(&content, playlist_id)?;

        tracing::info!(
            path = %self.path.display(),
            tracks = tracks.len(),
            unavailable = tracks.iter().filter(|t| !t.is_available).count(),
            "Loaded secondary catalog view"
        );
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"{
        "id": "PL1",
        "tracks": [
            {"videoId": "a1", "title": "First", "artists": [{"name": "X"}, {"name": "Y"}], "isAvailable": true},
            {"videoId": null, "title": "Second", "artists": [{"name": "Z"}], "isAvailable": false},
            {"title": "Third", "isAvailable": false},
            {"videoId": "", "title": "Fourth", "artists": []}
        ]
    }"#;

    #[test]
    fn test_parse_export() {
        let tracks = parse_export(EXPORT, "PL1").unwrap();
        assert_eq!(tracks.len(), 4);

        assert_eq!(tracks[0].artist, "X, Y");
        assert_eq!(tracks[0].content_id.as_deref(), Some("a1"));
        assert!(tracks[0].is_available);

        assert!(tracks[1].content_id.is_none());
        assert!(!tracks[1].is_available);
        assert_eq!(tracks[1].label(), "Second - Z");

        assert_eq!(tracks[2].artist, "");
        assert_eq!(tracks[2].label(), "Third");

        // Empty id is treated as absent, missing flag as available
        assert!(tracks[3].content_id.is_none());
        assert!(tracks[3].is_available);
    }

    #[test]
    fn test_parse_export_rejects_malformed() {
        assert!(matches!(
            parse_export("not json", "PL1"),
            Err(CatalogError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_playlist_view_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("view.json");
        std::fs::write(&path, EXPORT).unwrap();

        let view = ExportedSecondaryView::new(&path);
        let tracks = view.playlist_view("PL1").await.unwrap();
        assert_eq!(tracks.len(), 4);
    }

    #[tokio::test]
    async fn test_playlist_view_missing_file() {
        let view = ExportedSecondaryView::new("/nonexistent/plfix/view.json");
        assert!(matches!(
            view.playlist_view("PL1").await,
            Err(CatalogError::Io(_))
        ));
    }
}
