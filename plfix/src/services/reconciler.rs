//! Reconciler
//!
//! Drives each broken record through the repair state machine (see
//! [`RepairState`]): search and rank, then either report (dry run) or
//! insert the top candidate at the original position and delete the
//! original.
//!
//! Insert and delete failures stay with their record and the run moves on.
//! A search or ranking failure stops the run with [`ReconcileError`]. A
//! delete is only ever issued after the insert for the same record
//! succeeded.

use super::candidate_ranker::CandidateRanker;
use super::candidate_search::{CandidateSearch, DEFAULT_SEARCH_LIMIT};
use crate::catalog::{CatalogError, PrimaryCatalog};
use crate::models::{BrokenRecord, Candidate, RecordOutcome, RecordProgress, RepairState};
use crate::workflow::{RepairEvent, RepairObserver};
use plfix_common::events::OutcomeKind;
use std::sync::Arc;
use thiserror::Error;

/// Default number of broken records processed per run
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Run-level reconciler settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub playlist_id: String,
    /// Allow insert/delete calls; `false` is a dry run
    pub apply: bool,
    /// Leave the original entry after inserting its replacement
    pub keep_broken: bool,
    /// Broken records processed this run, earliest first
    pub max_attempts: usize,
    /// Search results requested per record
    pub search_limit: u32,
}

impl ReconcileOptions {
    /// Dry-run options with default limits
    pub fn dry_run(playlist_id: impl Into<String>) -> Self {
        Self {
            playlist_id: playlist_id.into(),
            apply: false,
            keep_broken: false,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// Result of one reconcile pass
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    /// One outcome per processed record, in processing order
    pub outcomes: Vec<RecordOutcome>,
    /// Broken records left for a later run
    pub untouched: usize,
}

/// Candidate search or ranking failed; records from `attempt` on were not
/// touched
#[derive(Debug, Error)]
#[error(
    "Candidate search failed at record {attempt} (pos={position} '{title}') after {} finished record(s): {source}",
    .completed.len()
)]
pub struct ReconcileError {
    pub attempt: usize,
    pub position: u32,
    pub title: String,
    #[source]
    pub source: CatalogError,
    /// Records finished before the failure, in processing order
    pub completed: Vec<RecordOutcome>,
    /// Broken records never attempted, the failing one included
    pub untouched: usize,
}

impl ReconcileError {
    /// Finished records that changed the remote playlist
    pub fn mutations(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.completed.iter().filter(|o| o.kind.mutated())
    }
}

pub struct Reconciler {
    catalog: Arc<dyn PrimaryCatalog>,
    search: CandidateSearch,
    ranker: CandidateRanker,
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(
        catalog: Arc<dyn PrimaryCatalog>,
        search: CandidateSearch,
        ranker: CandidateRanker,
        options: ReconcileOptions,
    ) -> Self {
        Self {
            catalog,
            search,
            ranker,
            options,
        }
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Process the first `max_attempts` of `records` (listing order)
    pub async fn reconcile(
        &self,
        records: &[BrokenRecord],
        observer: &dyn RepairObserver,
    ) -> Result<ReconcileReport, ReconcileError> {
        let batch = &records[..records.len().min(self.options.max_attempts)];
        let untouched = records.len() - batch.len();

        tracing::info!(
            playlist_id = %self.options.playlist_id,
            broken = records.len(),
            processing = batch.len(),
            untouched,
            apply = self.options.apply,
            keep_broken = self.options.keep_broken,
            "Reconciling broken records"
        );

        // Original positions of inserts that were not offset by a delete
        let mut net_insertions: Vec<u32> = Vec::new();
        let mut outcomes = Vec::with_capacity(batch.len());

        for (index, record) in batch.iter().enumerate() {
            let attempt = index + 1;
            let position = record.entry.position;
            let shift = net_insertions.iter().filter(|p| **p <= position).count() as u32;

            observer.on_event(&RepairEvent::RecordStarted {
                attempt,
                position,
                title: record.entry.title.clone(),
            });

            let outcome = match self.process(attempt, record, position + shift, observer).await {
                Ok(outcome) => outcome,
                Err(source) => {
                    tracing::error!(
                        attempt,
                        title = %record.entry.title,
                        finished = outcomes.len(),
                        error = %source,
                        "Candidate search failed, stopping the run"
                    );
                    return Err(ReconcileError {
                        attempt,
                        position,
                        title: record.entry.title.clone(),
                        source,
                        untouched: records.len() - outcomes.len(),
                        completed: outcomes,
                    });
                }
            };

            if matches!(
                outcome.kind,
                OutcomeKind::OriginalKept | OutcomeKind::DuplicateRisk
            ) {
                net_insertions.push(position);
            }

            observer.on_event(&RepairEvent::RecordFinished {
                outcome: Box::new(outcome.clone()),
            });
            outcomes.push(outcome);
        }

        Ok(ReconcileReport {
            outcomes,
            untouched,
        })
    }

    async fn process(
        &self,
        attempt: usize,
        record: &BrokenRecord,
        insert_position: u32,
        observer: &dyn RepairObserver,
    ) -> Result<RecordOutcome, CatalogError> {
        let mut outcome = RecordOutcome {
            attempt,
            record: record.clone(),
            kind: OutcomeKind::NoCandidate,
            progress: RecordProgress::new(),
            candidate: None,
            insert_position: None,
            inserted_entry_id: None,
            error: None,
        };

        outcome.progress.transition_to(RepairState::CandidateSought);
        let candidate = self.find_candidate(&record.entry.title).await?;

        let Some(candidate) = candidate else {
            outcome.progress.transition_to(RepairState::NoCandidate);
            outcome.progress.transition_to(RepairState::Done);
            outcome.kind = OutcomeKind::NoCandidate;
            observer.on_event(&RepairEvent::NoCandidate { attempt });
            return Ok(outcome);
        };

        outcome.progress.transition_to(RepairState::Ranked);
        observer.on_event(&RepairEvent::CandidateChosen {
            attempt,
            content_id: candidate.content_id.clone(),
            score: candidate.score,
            title: candidate.title.clone(),
        });
        let content_id = candidate.content_id.clone();
        outcome.candidate = Some(candidate);
        outcome.insert_position = Some(insert_position);

        if !self.options.apply {
            outcome.progress.transition_to(RepairState::DryRunReported);
            outcome.progress.transition_to(RepairState::Done);
            outcome.kind = OutcomeKind::DryRunReported;
            observer.on_event(&RepairEvent::DryRun {
                attempt,
                position: insert_position,
            });
            return Ok(outcome);
        }

        let inserted = self
            .catalog
            .insert_entry(&self.options.playlist_id, &content_id, Some(insert_position))
            .await;
        let new_entry_id = match inserted {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    attempt,
                    title = %record.entry.title,
                    position = insert_position,
                    error = %e,
                    "Insert failed, original entry left untouched"
                );
                outcome.progress.transition_to(RepairState::Failed);
                outcome.kind = OutcomeKind::InsertFailed;
                outcome.error = Some(e.to_string());
                observer.on_event(&RepairEvent::InsertFailed {
                    attempt,
                    error: e.to_string(),
                });
                return Ok(outcome);
            }
        };

        outcome.progress.transition_to(RepairState::Inserted);
        outcome.inserted_entry_id = Some(new_entry_id.clone());
        observer.on_event(&RepairEvent::Inserted {
            attempt,
            entry_id: new_entry_id,
            position: insert_position,
        });

        if self.options.keep_broken {
            outcome.progress.transition_to(RepairState::OriginalKept);
            outcome.progress.transition_to(RepairState::Done);
            outcome.kind = OutcomeKind::OriginalKept;
            observer.on_event(&RepairEvent::OriginalKept { attempt });
            return Ok(outcome);
        }

        match self.catalog.delete_entry(record.entry_id()).await {
            Ok(()) => {
                outcome.progress.transition_to(RepairState::OriginalDeleted);
                outcome.progress.transition_to(RepairState::Done);
                outcome.kind = OutcomeKind::Replaced;
                observer.on_event(&RepairEvent::OriginalDeleted {
                    attempt,
                    entry_id: record.entry_id().to_string(),
                });
            }
            Err(CatalogError::NotFound(message)) => {
                // Slot already removed elsewhere: no duplicate
                tracing::warn!(
                    attempt,
                    title = %record.entry.title,
                    entry_id = %record.entry_id(),
                    error = %message,
                    "Original entry was already gone"
                );
                outcome.progress.transition_to(RepairState::OriginalDeleted);
                outcome.progress.transition_to(RepairState::Done);
                outcome.kind = OutcomeKind::Replaced;
                outcome.error = Some(CatalogError::NotFound(message).to_string());
                observer.on_event(&RepairEvent::OriginalAlreadyGone {
                    attempt,
                    entry_id: record.entry_id().to_string(),
                });
            }
            Err(e) => {
                tracing::error!(
                    attempt,
                    title = %record.entry.title,
                    entry_id = %record.entry_id(),
                    error = %e,
                    "Delete failed after insert, playlist now holds both entries"
                );
                outcome.progress.transition_to(RepairState::Failed);
                outcome.kind = OutcomeKind::DuplicateRisk;
                outcome.error = Some(e.to_string());
                observer.on_event(&RepairEvent::DuplicateRisk {
                    attempt,
                    entry_id: record.entry_id().to_string(),
                    error: e.to_string(),
                });
            }
        }
        Ok(outcome)
    }

    /// Top-ranked candidate for `title`, if any
    async fn find_candidate(&self, title: &str) -> Result<Option<Candidate>, CatalogError> {
        let ids = self.search.search(title, self.options.search_limit).await?;
        let ranked = self.ranker.rank(&ids).await?;
        Ok(ranked.into_iter().next())
    }
}
