//! Repair pipeline services
//!
//! Reader → Oracle → (per broken record) Search → Ranker → Reconciler,
//! plus the snapshot writer that runs before any mutation.

pub mod availability_oracle;
pub mod candidate_ranker;
pub mod candidate_search;
pub mod catalog_reader;
pub mod reconciler;
pub mod search_cache;
pub mod snapshot_writer;
pub mod title_index;
pub mod title_normalizer;

pub use availability_oracle::{AvailabilityOracle, Classification, DetectionPolicy, OracleError};
pub use candidate_ranker::{score_candidate, CandidateRanker};
pub use candidate_search::{CandidateSearch, DEFAULT_SEARCH_LIMIT};
pub use catalog_reader::CatalogReader;
pub use reconciler::{
    ReconcileError, ReconcileOptions, ReconcileReport, Reconciler, DEFAULT_MAX_ATTEMPTS,
};
pub use search_cache::{InMemorySearchCache, JsonFileSearchCache, SearchCache, SearchCacheError};
pub use snapshot_writer::{Snapshot, SnapshotError, SnapshotWriter};
pub use title_index::TitleIndex;
pub use title_normalizer::{normalize_title, search_query_title};
