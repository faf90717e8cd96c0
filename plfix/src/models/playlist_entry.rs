//! Playlist entry snapshot

use serde::{Deserialize, Serialize};

/// Title assigned to entries the catalog returns without one
pub const UNTITLED: &str = "(no title)";

/// One slot of a playlist as captured by a scan
///
/// Immutable for the lifetime of a scan; a mutation invalidates every
/// position captured before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    /// 0-based ordinal position within the playlist
    pub position: u32,
    /// Display title at scan time
    pub title: String,
    /// Identifier of the referenced content; absent when the backend no
    /// longer reports it
    pub content_id: Option<String>,
    /// Identifier of the playlist slot itself (used for deletion)
    pub entry_id: String,
}

impl PlaylistEntry {
    pub fn new(
        position: u32,
        title: impl Into<String>,
        content_id: Option<String>,
        entry_id: impl Into<String>,
    ) -> Self {
        Self {
            position,
            title: title.into(),
            content_id,
            entry_id: entry_id.into(),
        }
    }

    /// Content id as `&str`, if present
    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_json_shape() {
        let entry = PlaylistEntry::new(3, "Song", Some("vid1".to_string()), "PLI_1");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["position"], 3);
        assert_eq!(json["content_id"], "vid1");
        assert_eq!(json["entry_id"], "PLI_1");

        let missing = PlaylistEntry::new(0, UNTITLED, None, "PLI_2");
        assert!(missing.content_id().is_none());
        let json = serde_json::to_value(&missing).unwrap();
        assert!(json["content_id"].is_null());
    }
}
