//! Candidate search
//!
//! Title-based catalog search for replacement content, cached by
//! `(raw title, limit)`.

use super::search_cache::{cache_key, SearchCache};
use super::title_normalizer::search_query_title;
use crate::catalog::{CatalogError, PrimaryCatalog};
use std::sync::Arc;

/// Default number of search results requested
pub const DEFAULT_SEARCH_LIMIT: u32 = 8;

/// Qualifier appended to every query
const QUERY_QUALIFIER: &str = "official";

/// Build the catalog query for a raw title
pub fn build_query(raw_title: &str) -> String {
    format!("{} {}", search_query_title(raw_title), QUERY_QUALIFIER)
        .trim()
        .to_string()
}

#[derive(Clone)]
pub struct CandidateSearch {
    catalog: Arc<dyn PrimaryCatalog>,
    cache: Arc<dyn SearchCache>,
}

impl CandidateSearch {
    pub fn new(catalog: Arc<dyn PrimaryCatalog>, cache: Arc<dyn SearchCache>) -> Self {
        Self { catalog, cache }
    }

    /// Content ids matching `raw_title`, relevance order, at most `limit`
    ///
    /// A cache hit returns without touching the catalog. Empty results are
    /// cached like any other. Cache failures are logged and never fail the
    /// search.
    pub async fn search(&self, raw_title: &str, limit: u32) -> Result<Vec<String>, CatalogError> {
        let key = cache_key(raw_title, limit);

        match self.cache.get(&key) {
            Ok(Some(ids)) => {
                tracing::debug!(title = %raw_title, limit, hits = ids.len(), "Search cache hit");
                return Ok(ids);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Search cache read failed, querying catalog"),
        }

        let query = build_query(raw_title);
        let mut ids = self.catalog.search_content(&query, limit).await?;
        ids.truncate(limit as usize);

        tracing::debug!(
            title = %raw_title,
            query = %query,
            results = ids.len(),
            "Catalog search complete"
        );

        if let Err(e) = self.cache.put(&key, ids.clone()) {
            tracing::warn!(error = %e, "Failed to store search results in cache");
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query() {
        assert_eq!(
            build_query("Band - Song (Official Music Video) [HD]"),
            "Band - Song official"
        );
        assert_eq!(build_query("Song Lyrics"), "Song official");
        // Nothing left but the qualifier
        assert_eq!(build_query("(Official Video)"), "official");
    }
}
