//! Data models for plfix
//!
//! - Playlist entries captured by a scan
//! - Broken records produced by the availability oracle
//! - Replacement candidates
//! - Per-record repair state machine and run summary

pub mod broken_record;
pub mod candidate;
pub mod playlist_entry;
pub mod repair_state;
pub mod run_summary;

pub use broken_record::{BrokenReason, BrokenRecord, MatchConfidence};
pub use candidate::Candidate;
pub use playlist_entry::PlaylistEntry;
pub use repair_state::{RecordOutcome, RecordProgress, RepairState, StateTransition};
pub use run_summary::RunSummary;
