//! Run completion summary

use super::RecordOutcome;
use plfix_common::events::OutcomeTally;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Totals of one repair run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub playlist_id: String,
    /// Entries captured by the scan
    pub total_entries: usize,
    /// Broken records detected
    pub broken: usize,
    /// Broken records left for a later run (max-attempts bound)
    pub untouched: usize,
    /// True when no mutation was allowed
    pub dry_run: bool,
    /// Pre-mutation snapshot location
    pub snapshot_path: Option<PathBuf>,
    /// Secondary catalog tracks with no matching entry
    pub unmapped_count: usize,
    /// Capped sample of unmapped tracks ("title - artist")
    pub unmapped_sample: Vec<String>,
    /// One outcome per processed record, in processing order
    pub outcomes: Vec<RecordOutcome>,
}

impl RunSummary {
    /// Records actually attempted this run
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    /// Outcome counters
    pub fn tally(&self) -> OutcomeTally {
        let mut tally = OutcomeTally::default();
        for outcome in &self.outcomes {
            tally.record(outcome.kind);
        }
        tally
    }

    /// Outcomes that need operator attention
    pub fn attention_needed(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes.iter().filter(|o| o.kind.needs_attention())
    }
}
