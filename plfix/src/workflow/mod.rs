//! Repair run workflow
//!
//! Orchestrates one repair run over a playlist:
//! 1. List every entry (Catalog Reader)
//! 2. Classify broken entries (Availability Oracle)
//! 3. Snapshot the listing before any mutation
//! 4. Reconcile the first `max` broken records
//!
//! Progress is reported as [`RepairEvent`]s to a [`RepairObserver`], so the
//! same run can drive the console, a test harness or the [`EventBus`]
//! bridge.
//!
//! [`EventBus`]: plfix_common::events::EventBus

pub mod event_bridge;
pub mod observers;
pub mod pipeline;

pub use event_bridge::EventBusObserver;
pub use observers::{ConsoleObserver, FanoutObserver, RecordingObserver, TracingObserver};
pub use pipeline::{RepairRun, RunError};

use crate::models::{RecordOutcome, RunSummary};
use std::path::PathBuf;

/// Repair progress events
///
/// `attempt` is the 1-based index of the record within the run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum RepairEvent {
    /// Listing and classification finished
    ScanCompleted {
        playlist_id: String,
        total_entries: usize,
        broken: usize,
    },

    /// Pre-mutation snapshot persisted
    SnapshotWritten { path: PathBuf },

    /// Unavailable secondary tracks with no matching entry
    UnmappedTracks {
        count: usize,
        /// Capped "title - artist" sample
        sample: Vec<String>,
    },

    /// Processing of one broken record started
    RecordStarted {
        attempt: usize,
        position: u32,
        title: String,
    },

    /// Top-ranked replacement selected
    CandidateChosen {
        attempt: usize,
        content_id: String,
        score: i64,
        title: String,
    },

    /// Search produced nothing usable
    NoCandidate { attempt: usize },

    /// Dry run: would insert at `position`, then delete the original
    DryRun { attempt: usize, position: u32 },

    /// Replacement inserted
    Inserted {
        attempt: usize,
        entry_id: String,
        position: u32,
    },

    /// Original entry deleted after a successful insert
    OriginalDeleted { attempt: usize, entry_id: String },

    /// Delete after insert found the original slot already removed
    OriginalAlreadyGone { attempt: usize, entry_id: String },

    /// Keep-broken mode: original left in place
    OriginalKept { attempt: usize },

    /// Insert rejected; original untouched
    InsertFailed { attempt: usize, error: String },

    /// Insert succeeded but delete failed; both entries present
    DuplicateRisk {
        attempt: usize,
        entry_id: String,
        error: String,
    },

    /// Record reached a terminal state
    RecordFinished { outcome: Box<RecordOutcome> },

    /// Run finished
    RunCompleted { summary: Box<RunSummary> },
}

/// Receives repair events in emission order
pub trait RepairObserver: Send + Sync {
    fn on_event(&self, event: &RepairEvent);
}

/// Observer that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl RepairObserver for NullObserver {
    fn on_event(&self, _event: &RepairEvent) {}
}
