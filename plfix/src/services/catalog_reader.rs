//! Catalog reader
//!
//! Exhaustive playlist listing and batched existence checks on top of the
//! [`PrimaryCatalog`] capability.

use crate::catalog::{CatalogError, PlaylistItem, PrimaryCatalog};
use crate::models::playlist_entry::UNTITLED;
use crate::models::PlaylistEntry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Items requested per listing page
pub const PAGE_SIZE: u32 = 50;

/// Paginated reader over the primary catalog
#[derive(Clone)]
pub struct CatalogReader {
    catalog: Arc<dyn PrimaryCatalog>,
}

impl CatalogReader {
    pub fn new(catalog: Arc<dyn PrimaryCatalog>) -> Self {
        Self { catalog }
    }

    /// List every entry of `playlist_id`
    ///
    /// Follows continuation tokens until none is returned. Any page failure
    /// aborts the whole listing: a partial inventory would corrupt the
    /// position bookkeeping downstream.
    pub async fn list_entries(&self, playlist_id: &str) -> Result<Vec<PlaylistEntry>, CatalogError> {
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens: HashSet<String> = HashSet::new();
        let mut pages = 0usize;

        loop {
            let page = self
                .catalog
                .list_playlist_page(playlist_id, page_token.as_deref(), PAGE_SIZE)
                .await?;
            pages += 1;

            for item in page.items {
                let index = entries.len();
                entries.push(entry_from_item(item, index));
            }

            match page.next_page_token {
                Some(next) if !seen_tokens.insert(next.clone()) => {
                    return Err(CatalogError::ParseError(format!(
                        "Listing of {} returned page token {} twice",
                        playlist_id, next
                    )));
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        tracing::info!(
            playlist_id = %playlist_id,
            entries = entries.len(),
            pages,
            "Playlist listing complete"
        );
        Ok(entries)
    }

    /// Existence check for `content_ids`
    ///
    /// Chunks to the backend batch limit and issues one query per chunk.
    /// Every requested id appears in the result; ids missing from a chunk's
    /// response map to `false`.
    pub async fn batch_exists(
        &self,
        content_ids: &[String],
    ) -> Result<HashMap<String, bool>, CatalogError> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = content_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        let mut existence = HashMap::with_capacity(unique.len());
        let batch_size = self.catalog.max_batch_size().max(1);

        for chunk in unique.chunks(batch_size) {
            let found: HashSet<String> = self
                .catalog
                .check_content_exists(chunk)
                .await?
                .into_iter()
                .collect();
            for id in chunk {
                existence.insert(id.clone(), found.contains(id));
            }
        }

        tracing::debug!(
            requested = unique.len(),
            missing = existence.values().filter(|exists| !**exists).count(),
            "Batch existence check complete"
        );
        Ok(existence)
    }
}

fn entry_from_item(item: PlaylistItem, index: usize) -> PlaylistEntry {
    PlaylistEntry {
        position: item.position.unwrap_or(index as u32),
        title: item
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string()),
        content_id: item.content_id,
        entry_id: item.entry_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_from_item_defaults() {
        let item = PlaylistItem {
            entry_id: "PLI_9".to_string(),
            title: None,
            content_id: None,
            position: None,
        };
        let entry = entry_from_item(item, 7);
        assert_eq!(entry.position, 7);
        assert_eq!(entry.title, UNTITLED);
        assert!(entry.content_id.is_none());
        assert_eq!(entry.entry_id, "PLI_9");
    }

    #[test]
    fn test_entry_from_item_keeps_backend_position() {
        let item = PlaylistItem {
            entry_id: "PLI_1".to_string(),
            title: Some("Song".to_string()),
            content_id: Some("vid".to_string()),
            position: Some(12),
        };
        let entry = entry_from_item(item, 0);
        assert_eq!(entry.position, 12);
        assert_eq!(entry.title, "Song");
    }
}
