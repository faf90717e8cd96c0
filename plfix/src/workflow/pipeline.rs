//! Repair run orchestrator
//!
//! Scan phase (listing + classification + snapshot) completes before the
//! mutation phase starts. Listing, classification and snapshot errors
//! surface before the first insert; a search failure during the mutation
//! phase stops the run and carries the records already finished.

use super::{RepairEvent, RepairObserver};
use crate::catalog::{CatalogError, PrimaryCatalog, SecondaryCatalog};
use crate::models::RunSummary;
use crate::services::{
    AvailabilityOracle, CandidateRanker, CandidateSearch, CatalogReader, DetectionPolicy,
    OracleError, ReconcileError, ReconcileOptions, Reconciler, SearchCache, SnapshotError,
    SnapshotWriter,
};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Fatal run errors
///
/// Only [`RunError::Search`] can follow mutations; it lists them.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Playlist listing failed: {0}")]
    Listing(#[source] CatalogError),

    #[error("Availability classification failed: {0}")]
    Classification(#[from] OracleError),

    #[error("Snapshot failed, refusing to modify the playlist: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Repair run stopped: {0}")]
    Search(#[from] ReconcileError),
}

/// One configured repair run
pub struct RepairRun {
    run_id: Uuid,
    reader: CatalogReader,
    oracle: AvailabilityOracle,
    reconciler: Reconciler,
    snapshots: SnapshotWriter,
    policy: DetectionPolicy,
}

impl RepairRun {
    pub fn new(
        catalog: Arc<dyn PrimaryCatalog>,
        secondary: Option<Arc<dyn SecondaryCatalog>>,
        cache: Arc<dyn SearchCache>,
        snapshots: SnapshotWriter,
        policy: DetectionPolicy,
        options: ReconcileOptions,
    ) -> Self {
        let reader = CatalogReader::new(catalog.clone());
        let oracle = AvailabilityOracle::new(reader.clone(), secondary);
        let search = CandidateSearch::new(catalog.clone(), cache);
        let ranker = CandidateRanker::new(catalog.clone());
        let reconciler = Reconciler::new(catalog, search, ranker, options);

        Self {
            run_id: Uuid::new_v4(),
            reader,
            oracle,
            reconciler,
            snapshots,
            policy,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn policy(&self) -> DetectionPolicy {
        self.policy
    }

    pub fn options(&self) -> &ReconcileOptions {
        self.reconciler.options()
    }

    /// Execute the run, reporting progress to `observer`
    pub async fn run(&self, observer: &dyn RepairObserver) -> Result<RunSummary, RunError> {
        let options = self.reconciler.options();
        let playlist_id = options.playlist_id.as_str();

        tracing::info!(
            run_id = %self.run_id,
            playlist_id = %playlist_id,
            policy = %self.policy,
            apply = options.apply,
            "Starting repair run"
        );

        let entries = self
            .reader
            .list_entries(playlist_id)
            .await
            .map_err(RunError::Listing)?;
        let classification = self
            .oracle
            .classify(playlist_id, &entries, self.policy)
            .await?;
        let snapshot_path = self.snapshots.write(playlist_id, &entries).await?;

        observer.on_event(&RepairEvent::ScanCompleted {
            playlist_id: playlist_id.to_string(),
            total_entries: entries.len(),
            broken: classification.broken.len(),
        });
        observer.on_event(&RepairEvent::SnapshotWritten {
            path: snapshot_path.clone(),
        });

        let unmapped_sample = classification.unmapped_sample();
        if !classification.unmapped.is_empty() {
            observer.on_event(&RepairEvent::UnmappedTracks {
                count: classification.unmapped.len(),
                sample: unmapped_sample.clone(),
            });
        }

        let report = self
            .reconciler
            .reconcile(&classification.broken, observer)
            .await?;

        let summary = RunSummary {
            run_id: self.run_id,
            playlist_id: playlist_id.to_string(),
            total_entries: entries.len(),
            broken: classification.broken.len(),
            untouched: report.untouched,
            dry_run: !options.apply,
            snapshot_path: Some(snapshot_path),
            unmapped_count: classification.unmapped.len(),
            unmapped_sample,
            outcomes: report.outcomes,
        };

        observer.on_event(&RepairEvent::RunCompleted {
            summary: Box::new(summary.clone()),
        });
        Ok(summary)
    }
}
