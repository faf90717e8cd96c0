//! Repair event bridge for EventBus broadcasting
//!
//! Converts internal [`RepairEvent`]s to public [`PlfixEvent`]s so UI
//! consumers subscribed to the [`EventBus`] follow a run. Per-step events
//! (candidate chosen, inserted, ...) are internal; the bus only carries the
//! scan result, snapshot, unmapped tracks, one event per finished record and
//! the run completion.

use super::{RepairEvent, RepairObserver};
use plfix_common::events::{EventBus, PlfixEvent};
use plfix_common::time;
use uuid::Uuid;

/// Observer that republishes events on an [`EventBus`]
pub struct EventBusObserver {
    bus: EventBus,
    run_id: Uuid,
}

impl EventBusObserver {
    pub fn new(bus: EventBus, run_id: Uuid) -> Self {
        Self { bus, run_id }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Public form of `event`, if it is published at all
    pub fn convert(&self, event: &RepairEvent) -> Option<PlfixEvent> {
        let run_id = self.run_id;
        let timestamp = time::now();

        match event {
            RepairEvent::ScanCompleted {
                playlist_id,
                total_entries,
                broken,
            } => Some(PlfixEvent::ScanCompleted {
                run_id,
                playlist_id: playlist_id.clone(),
                total_entries: *total_entries,
                broken: *broken,
                timestamp,
            }),
            RepairEvent::SnapshotWritten { path } => Some(PlfixEvent::SnapshotWritten {
                run_id,
                path: path.display().to_string(),
                timestamp,
            }),
            RepairEvent::UnmappedTracks { count, sample } => Some(PlfixEvent::UnmappedTracks {
                run_id,
                count: *count,
                sample: sample.clone(),
                timestamp,
            }),
            RepairEvent::RecordFinished { outcome } => Some(PlfixEvent::RecordFinished {
                run_id,
                attempt: outcome.attempt,
                position: outcome.record.entry.position,
                title: outcome.record.entry.title.clone(),
                outcome: outcome.kind,
                replacement: outcome.candidate.as_ref().map(|c| c.content_id.clone()),
                error: outcome.error.clone(),
                timestamp,
            }),
            RepairEvent::RunCompleted { summary } => Some(PlfixEvent::RunCompleted {
                run_id,
                dry_run: summary.dry_run,
                processed: summary.processed(),
                untouched: summary.untouched,
                tally: summary.tally(),
                timestamp,
            }),
            _ => None,
        }
    }
}

impl RepairObserver for EventBusObserver {
    fn on_event(&self, event: &RepairEvent) {
        if let Some(public) = self.convert(event) {
            tracing::trace!(run_id = %self.run_id, "Bridge: publishing {:?}", public);
            self.bus.emit_lossy(public);
        }
    }
}
