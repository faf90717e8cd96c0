//! Repair run type definitions
//!
//! Supporting types for per-record outcome reporting.

use serde::{Deserialize, Serialize};

/// Terminal outcome of one processed broken record
///
/// Serialized in SCREAMING_SNAKE_CASE for UI consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    /// Search returned nothing usable
    NoCandidate,
    /// Dry-run: a candidate was chosen, nothing was mutated
    DryRunReported,
    /// Replacement inserted, original removed
    Replaced,
    /// Replacement inserted, original intentionally kept
    OriginalKept,
    /// Replacement inserted but the original could not be deleted
    DuplicateRisk,
    /// Insert rejected; original untouched
    InsertFailed,
}

impl OutcomeKind {
    /// Whether this outcome mutated the remote playlist
    pub fn mutated(&self) -> bool {
        matches!(
            self,
            OutcomeKind::Replaced | OutcomeKind::OriginalKept | OutcomeKind::DuplicateRisk
        )
    }

    /// Whether this outcome needs operator attention
    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            OutcomeKind::DuplicateRisk | OutcomeKind::InsertFailed
        )
    }
}

/// Outcome counters for the run-completed event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub no_candidate: usize,
    pub dry_run: usize,
    pub replaced: usize,
    pub original_kept: usize,
    pub duplicate_risk: usize,
    pub insert_failed: usize,
}

impl OutcomeTally {
    /// Count one outcome
    pub fn record(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::NoCandidate => self.no_candidate += 1,
            OutcomeKind::DryRunReported => self.dry_run += 1,
            OutcomeKind::Replaced => self.replaced += 1,
            OutcomeKind::OriginalKept => self.original_kept += 1,
            OutcomeKind::DuplicateRisk => self.duplicate_risk += 1,
            OutcomeKind::InsertFailed => self.insert_failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.no_candidate
            + self.dry_run
            + self.replaced
            + self.original_kept
            + self.duplicate_risk
            + self.insert_failed
    }
}
