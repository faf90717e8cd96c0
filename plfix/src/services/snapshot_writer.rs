//! Pre-mutation playlist snapshot

use crate::models::PlaylistEntry;
use chrono::{DateTime, Local};
use plfix_common::time;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to write snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Snapshot file contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub playlist_id: String,
    pub taken_at: DateTime<Local>,
    pub entries: Vec<PlaylistEntry>,
}

impl Snapshot {
    /// Read a snapshot back
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Writes `{dir}/{playlist_id}_{YYYYmmdd_HHMMSS}.json`
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot path for a given timestamp
    pub fn path_for(&self, playlist_id: &str, taken_at: &DateTime<Local>) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", playlist_id, time::file_stamp(taken_at)))
    }

    /// Write a snapshot stamped with the current local time
    pub async fn write(
        &self,
        playlist_id: &str,
        entries: &[PlaylistEntry],
    ) -> Result<PathBuf, SnapshotError> {
        self.write_at(playlist_id, entries, Local::now()).await
    }

    /// Write a snapshot stamped `taken_at`; creates the directory if needed
    pub async fn write_at(
        &self,
        playlist_id: &str,
        entries: &[PlaylistEntry],
        taken_at: DateTime<Local>,
    ) -> Result<PathBuf, SnapshotError> {
        let path = self.path_for(playlist_id, &taken_at);
        let snapshot = Snapshot {
            playlist_id: playlist_id.to_string(),
            taken_at,
            entries: entries.to_vec(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| SnapshotError::Io {
                path: self.dir.clone(),
                source,
            })?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| SnapshotError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!(
            path = %path.display(),
            entries = entries.len(),
            "Playlist snapshot written"
        );
        Ok(path)
    }
}
