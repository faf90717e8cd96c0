//! Search result cache
//!
//! Explicit store handed to [`CandidateSearch`](super::candidate_search::CandidateSearch).
//! Entries never expire; the file-backed store survives across runs until
//! the file is removed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchCacheError {
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache file {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cache lock poisoned")]
    Poisoned,
}

/// Cache key for a `(title, limit)` search
pub fn cache_key(raw_title: &str, limit: u32) -> String {
    format!("{}|{}", raw_title, limit)
}

/// Key/value store for search results
pub trait SearchCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<String>>, SearchCacheError>;

    fn put(&self, key: &str, ids: Vec<String>) -> Result<(), SearchCacheError>;
}

/// Process-local cache
#[derive(Debug, Default)]
pub struct InMemorySearchCache {
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl InMemorySearchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SearchCache for InMemorySearchCache {
    fn get(&self, key: &str) -> Result<Option<Vec<String>>, SearchCacheError> {
        let entries = self.entries.lock().map_err(|_| SearchCacheError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, ids: Vec<String>) -> Result<(), SearchCacheError> {
        let mut entries = self.entries.lock().map_err(|_| SearchCacheError::Poisoned)?;
        entries.insert(key.to_string(), ids);
        Ok(())
    }
}

/// JSON-file cache
///
/// The whole map is loaded at open and rewritten on every `put`
/// (temp file + rename, so a crash never leaves a truncated cache).
#[derive(Debug)]
pub struct JsonFileSearchCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl JsonFileSearchCache {
    /// Open `path`; a missing file starts an empty cache
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SearchCacheError> {
        let path = path.as_ref().to_path_buf();

        let entries = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => HashMap::new(),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|source| SearchCacheError::Corrupt {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No search cache file yet, starting empty");
                HashMap::new()
            }
            Err(source) => return Err(SearchCacheError::Io { path, source }),
        };

        tracing::debug!(
            path = %path.display(),
            entries = entries.len(),
            "Search cache loaded"
        );
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, Vec<String>>) -> Result<(), SearchCacheError> {
        let io_err = |source: std::io::Error| SearchCacheError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(entries).map_err(|source| {
            SearchCacheError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, json).map_err(io_err)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl SearchCache for JsonFileSearchCache {
    fn get(&self, key: &str) -> Result<Option<Vec<String>>, SearchCacheError> {
        let entries = self.entries.lock().map_err(|_| SearchCacheError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, ids: Vec<String>) -> Result<(), SearchCacheError> {
        let mut entries = self.entries.lock().map_err(|_| SearchCacheError::Poisoned)?;
        entries.insert(key.to_string(), ids);
        self.persist(&entries)
    }
}
