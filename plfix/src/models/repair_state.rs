//! Per-record repair state machine
//!
//! Each broken record progresses through:
//! DETECTED → CANDIDATE_SOUGHT → {NO_CANDIDATE | RANKED}
//!   → {DRY_RUN_REPORTED | INSERTED → (ORIGINAL_KEPT | ORIGINAL_DELETED)} → DONE
//!
//! or FAILED on a mutation error. A search or ranking error is not a record
//! state: it stops the whole run.

use super::{BrokenRecord, Candidate};
use chrono::{DateTime, Utc};
use plfix_common::events::OutcomeKind;
use serde::{Deserialize, Serialize};

/// Repair state of one broken record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairState {
    /// Produced by the availability oracle
    Detected,
    /// Search + rank in flight
    CandidateSought,
    /// Search returned nothing usable
    NoCandidate,
    /// Top candidate chosen
    Ranked,
    /// Dry-run: reported, nothing mutated
    DryRunReported,
    /// Replacement inserted
    Inserted,
    /// Keep-broken mode: original left in place
    OriginalKept,
    /// Original removed
    OriginalDeleted,
    /// Finished
    Done,
    /// Insert or delete error
    Failed,
}

impl RepairState {
    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: RepairState) -> bool {
        use RepairState::*;
        matches!(
            (self, next),
            (Detected, CandidateSought)
                | (CandidateSought, NoCandidate)
                | (CandidateSought, Ranked)
                | (Ranked, DryRunReported)
                | (Ranked, Inserted)
                | (Ranked, Failed)
                | (Inserted, OriginalKept)
                | (Inserted, OriginalDeleted)
                | (Inserted, Failed)
                | (NoCandidate, Done)
                | (DryRunReported, Done)
                | (OriginalKept, Done)
                | (OriginalDeleted, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RepairState::Done | RepairState::Failed)
    }
}

/// State transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub old_state: RepairState,
    pub new_state: RepairState,
    pub transitioned_at: DateTime<Utc>,
}

/// In-flight progress of one record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordProgress {
    pub state: RepairState,
    /// Every transition taken, oldest first
    pub history: Vec<StateTransition>,
}

impl RecordProgress {
    pub fn new() -> Self {
        Self {
            state: RepairState::Detected,
            history: Vec::new(),
        }
    }

    /// Transition to new state
    pub fn transition_to(&mut self, new_state: RepairState) -> StateTransition {
        debug_assert!(
            self.state.can_transition_to(new_state),
            "illegal repair transition {:?} -> {:?}",
            self.state,
            new_state
        );
        let transition = StateTransition {
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;
        self.history.push(transition.clone());
        transition
    }

    /// Whether the record passed through `state`
    pub fn visited(&self, state: RepairState) -> bool {
        self.history.iter().any(|t| t.new_state == state)
    }

    /// States visited in order, starting with DETECTED
    pub fn path(&self) -> Vec<RepairState> {
        let mut path = vec![RepairState::Detected];
        path.extend(self.history.iter().map(|t| t.new_state));
        path
    }
}

impl Default for RecordProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Final result for one processed broken record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// 1-based attempt number within the run
    pub attempt: usize,
    pub record: BrokenRecord,
    pub kind: OutcomeKind,
    pub progress: RecordProgress,
    /// Chosen replacement, if ranking produced one
    pub candidate: Option<Candidate>,
    /// Position sent with the insert call
    pub insert_position: Option<u32>,
    /// Entry id of the inserted replacement
    pub inserted_entry_id: Option<String>,
    /// Raw backend error, if any
    pub error: Option<String>,
}

impl RecordOutcome {
    /// Final state reached
    pub fn final_state(&self) -> RepairState {
        self.progress.state
    }
}
