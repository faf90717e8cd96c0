//! Scriptable in-memory catalogs
//!
//! `FakeCatalog` implements every primary catalog capability over plain
//! collections and records each call, so tests can assert on exactly what
//! the pipeline asked for (and in which order).

use async_trait::async_trait;
use plfix::catalog::{
    CatalogError, ContentMetadata, PlaylistItem, PlaylistPage, PrimaryCatalog, SecondaryCatalog,
    SecondaryTrack,
};
use plfix::services::candidate_search::build_query;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One recorded mutating or querying call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListPage(Option<String>),
    Exists(Vec<String>),
    Search(String),
    Metadata(Vec<String>),
    Insert {
        content_id: String,
        position: Option<u32>,
    },
    Delete(String),
}

#[derive(Default)]
pub struct FakeCatalog {
    items: Vec<PlaylistItem>,
    existing: HashSet<String>,
    search_results: HashMap<String, Vec<String>>,
    metadata: HashMap<String, ContentMetadata>,
    batch_size: Option<usize>,
    fail_page: Option<usize>,
    next_token_after: HashMap<usize, String>,
    fail_search: bool,
    failing_queries: HashSet<String>,
    reject_inserts: bool,
    failing_deletes: HashSet<String>,
    missing_deletes: HashSet<String>,
    calls: Mutex<Vec<Call>>,
    inserted: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the next position; `exists` controls the
    /// existence check for its content id
    pub fn with_entry(mut self, title: &str, content_id: Option<&str>, exists: bool) -> Self {
        let position = self.items.len() as u32;
        self.items.push(PlaylistItem {
            entry_id: format!("PLI_{}", position),
            title: Some(title.to_string()),
            content_id: content_id.map(str::to_string),
            position: Some(position),
        });
        if let (Some(id), true) = (content_id, exists) {
            self.existing.insert(id.to_string());
        }
        self
    }

    /// Append a raw item as-is
    pub fn with_item(mut self, item: PlaylistItem) -> Self {
        self.items.push(item);
        self
    }

    /// `count` entries "Song {i}" with content "vid{i}", all existing
    pub fn with_entries(mut self, count: usize) -> Self {
        for i in 0..count {
            let id = format!("vid{}", i);
            self = self.with_entry(&format!("Song {}", i), Some(&id), true);
        }
        self
    }

    /// Mark `content_id` as existing or not
    pub fn set_exists(mut self, content_id: &str, exists: bool) -> Self {
        if exists {
            self.existing.insert(content_id.to_string());
        } else {
            self.existing.remove(content_id);
        }
        self
    }

    /// Search for `raw_title` returns `results`; each result gets metadata
    pub fn with_search(mut self, raw_title: &str, results: Vec<ContentMetadata>) -> Self {
        let ids = results.iter().map(|m| m.content_id.clone()).collect();
        self.search_results.insert(build_query(raw_title), ids);
        for m in results {
            self.existing.insert(m.content_id.clone());
            self.metadata.insert(m.content_id.clone(), m);
        }
        self
    }

    /// Search for `raw_title` returns `ids` without registering metadata
    pub fn with_search_ids(mut self, raw_title: &str, ids: &[&str]) -> Self {
        self.search_results.insert(
            build_query(raw_title),
            ids.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Fail the listing on page `index` (0-based)
    pub fn failing_page(mut self, index: usize) -> Self {
        self.fail_page = Some(index);
        self
    }

    /// Page `index` (0-based) answers with `token` as its continuation
    pub fn with_next_token_after(mut self, index: usize, token: &str) -> Self {
        self.next_token_after.insert(index, token.to_string());
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    /// Only the search for `raw_title` fails
    pub fn failing_search_for(mut self, raw_title: &str) -> Self {
        self.failing_queries.insert(build_query(raw_title));
        self
    }

    /// Reject every insert as the backend does for non-manual ordering
    pub fn rejecting_inserts(mut self) -> Self {
        self.reject_inserts = true;
        self
    }

    pub fn failing_delete(mut self, entry_id: &str) -> Self {
        self.failing_deletes.insert(entry_id.to_string());
        self
    }

    /// Deleting `entry_id` answers 404, as if it was removed elsewhere
    pub fn missing_on_delete(mut self, entry_id: &str) -> Self {
        self.missing_deletes.insert(entry_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    pub fn search_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Search(_)))
    }

    pub fn exists_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Exists(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    pub fn inserts(&self) -> Vec<(String, Option<u32>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Insert {
                    content_id,
                    position,
                } => Some((content_id, position)),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Insert + delete calls
    pub fn mutations(&self) -> usize {
        self.count(|c| matches!(c, Call::Insert { .. } | Call::Delete(_)))
    }
}

#[async_trait]
impl PrimaryCatalog for FakeCatalog {
    fn max_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(plfix::catalog::MAX_BATCH_SIZE)
    }

    async fn list_playlist_page(
        &self,
        _playlist_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<PlaylistPage, CatalogError> {
        self.record(Call::ListPage(page_token.map(str::to_string)));

        let offset: usize = match page_token {
            Some(token) => token
                .strip_prefix("offset-")
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| CatalogError::ParseError(format!("bad token {}", token)))?,
            None => 0,
        };
        let page_size = page_size.max(1) as usize;

        if self.fail_page == Some(offset / page_size) {
            return Err(CatalogError::NetworkError("connection reset".to_string()));
        }

        let end = (offset + page_size).min(self.items.len());
        let items = self.items.get(offset..end).unwrap_or(&[]).to_vec();
        let next_page_token = match self.next_token_after.get(&(offset / page_size)) {
            Some(token) => Some(token.clone()),
            None => (end < self.items.len()).then(|| format!("offset-{}", end)),
        };
        Ok(PlaylistPage {
            items,
            next_page_token,
        })
    }

    async fn check_content_exists(
        &self,
        content_ids: &[String],
    ) -> Result<Vec<String>, CatalogError> {
        self.record(Call::Exists(content_ids.to_vec()));
        assert!(
            content_ids.len() <= self.max_batch_size(),
            "existence batch over the limit"
        );
        Ok(content_ids
            .iter()
            .filter(|id| self.existing.contains(*id))
            .cloned()
            .collect())
    }

    async fn search_content(&self, query: &str, limit: u32) -> Result<Vec<String>, CatalogError> {
        self.record(Call::Search(query.to_string()));
        if self.fail_search || self.failing_queries.contains(query) {
            return Err(CatalogError::ApiError(
                403,
                "quotaExceeded: The request cannot be completed".to_string(),
            ));
        }
        let mut ids = self.search_results.get(query).cloned().unwrap_or_default();
        ids.truncate(limit as usize);
        Ok(ids)
    }

    async fn fetch_content_metadata(
        &self,
        content_ids: &[String],
    ) -> Result<Vec<ContentMetadata>, CatalogError> {
        self.record(Call::Metadata(content_ids.to_vec()));
        Ok(content_ids
            .iter()
            .filter_map(|id| self.metadata.get(id).cloned())
            .collect())
    }

    async fn insert_entry(
        &self,
        _playlist_id: &str,
        content_id: &str,
        position: Option<u32>,
    ) -> Result<String, CatalogError> {
        self.record(Call::Insert {
            content_id: content_id.to_string(),
            position,
        });
        if self.reject_inserts {
            return Err(CatalogError::ApiError(
                400,
                "manualSortRequired: The playlist must be sorted manually".to_string(),
            ));
        }
        let n = self.inserted.fetch_add(1, Ordering::SeqCst);
        Ok(format!("PLI_new_{}", n))
    }

    async fn delete_entry(&self, entry_id: &str) -> Result<(), CatalogError> {
        self.record(Call::Delete(entry_id.to_string()));
        if self.failing_deletes.contains(entry_id) {
            return Err(CatalogError::ApiError(
                500,
                "backendError: Backend Error".to_string(),
            ));
        }
        if self.missing_deletes.contains(entry_id) {
            return Err(CatalogError::NotFound(format!(
                "playlistItemNotFound: {}",
                entry_id
            )));
        }
        Ok(())
    }
}

/// Secondary catalog view backed by a fixed track list
#[derive(Default)]
pub struct FakeSecondary {
    tracks: Vec<SecondaryTrack>,
    calls: AtomicUsize,
}

impl FakeSecondary {
    pub fn new(tracks: Vec<SecondaryTrack>) -> Self {
        Self {
            tracks,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecondaryCatalog for FakeSecondary {
    async fn playlist_view(&self, _playlist_id: &str) -> Result<Vec<SecondaryTrack>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tracks.clone())
    }
}
