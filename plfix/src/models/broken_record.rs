//! Broken record produced by the availability oracle

use super::PlaylistEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an entry was judged broken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BrokenReason {
    /// Content id no longer exists in the primary catalog
    NotFoundPrimary,
    /// Content exists in the primary catalog but the secondary catalog
    /// flags it unavailable
    UnavailableSecondary,
}

/// How the broken entry was tied to the evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchConfidence {
    /// Shared content identifier
    IdentifierMatch,
    /// Normalized title (and artist) lookup
    TitleMatch,
}

impl fmt::Display for BrokenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokenReason::NotFoundPrimary => write!(f, "not found in primary catalog"),
            BrokenReason::UnavailableSecondary => write!(f, "unavailable in secondary catalog"),
        }
    }
}

impl fmt::Display for MatchConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchConfidence::IdentifierMatch => write!(f, "id"),
            MatchConfidence::TitleMatch => write!(f, "title"),
        }
    }
}

/// An entry judged broken under one detection policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenRecord {
    pub entry: PlaylistEntry,
    pub reason: BrokenReason,
    pub confidence: MatchConfidence,
}

impl BrokenRecord {
    pub fn new(entry: PlaylistEntry, reason: BrokenReason, confidence: MatchConfidence) -> Self {
        Self {
            entry,
            reason,
            confidence,
        }
    }

    /// Primary-absence record (always an identifier match)
    pub fn not_found_primary(entry: PlaylistEntry) -> Self {
        Self::new(
            entry,
            BrokenReason::NotFoundPrimary,
            MatchConfidence::IdentifierMatch,
        )
    }

    pub fn entry_id(&self) -> &str {
        &self.entry.entry_id
    }
}
