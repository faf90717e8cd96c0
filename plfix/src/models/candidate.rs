//! Replacement candidate

use serde::{Deserialize, Serialize};

/// A ranked replacement proposal for one broken record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub content_id: String,
    /// Heuristic score, higher is better
    pub score: i64,
    /// Catalog title at ranking time (for reporting)
    pub title: String,
    /// Channel / provenance name at ranking time (for reporting)
    pub channel_title: String,
}
