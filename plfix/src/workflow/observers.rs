//! Repair observers
//!
//! - [`ConsoleObserver`]: operator-facing run report
//! - [`TracingObserver`]: structured log lines
//! - [`RecordingObserver`]: keeps every event (tests, post-run inspection)
//! - [`FanoutObserver`]: forwards to several observers in order

use super::{RepairEvent, RepairObserver};
use std::io::Write;
use std::sync::Mutex;

const MANUAL_ORDER_TIP: &str =
    "  Insert failed. Tip: set playlist to Custom/Manual order if position is rejected.";

/// Prints the run report to a writer (stdout in the binary)
pub struct ConsoleObserver<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsoleObserver<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn render(event: &RepairEvent) -> Vec<String> {
        match event {
            RepairEvent::ScanCompleted {
                total_entries,
                broken,
                ..
            } => {
                let mut lines = vec![format!(
                    "Playlist items: {} | Broken: {}",
                    total_entries, broken
                )];
                if *broken == 0 {
                    lines.push("No unavailable items found.".to_string());
                }
                lines
            }
            RepairEvent::SnapshotWritten { path } => {
                vec![format!("Backup saved: {}", path.display())]
            }
            RepairEvent::UnmappedTracks { count, sample } => {
                vec![format!(
                    "Unavailable tracks with no matching entry: {} (e.g. {})",
                    count,
                    sample.join("; ")
                )]
            }
            RepairEvent::RecordStarted {
                attempt,
                position,
                title,
            } => vec![format!("\n[#{}] pos={} title='{}'", attempt, position, title)],
            RepairEvent::CandidateChosen {
                content_id, score, ..
            } => vec![format!("  Candidate → {} (score {})", content_id, score)],
            RepairEvent::NoCandidate { .. } => vec!["  No candidates found.".to_string()],
            RepairEvent::DryRun { .. } => {
                vec!["  DRY-RUN: would insert at same position; then delete broken.".to_string()]
            }
            RepairEvent::Inserted { .. } => vec!["  Inserted.".to_string()],
            RepairEvent::OriginalDeleted { .. } => vec!["  Deleted broken item.".to_string()],
            RepairEvent::OriginalAlreadyGone { entry_id, .. } => vec![format!(
                "  Broken item {} was already removed; nothing to delete.",
                entry_id
            )],
            RepairEvent::OriginalKept { .. } => vec!["  Kept broken item.".to_string()],
            RepairEvent::InsertFailed { error, .. } => {
                vec![MANUAL_ORDER_TIP.to_string(), format!("  Error: {}", error)]
            }
            RepairEvent::DuplicateRisk { entry_id, error, .. } => vec![
                format!(
                    "  Delete failed after insert: playlist now holds both entries (remove {} manually).",
                    entry_id
                ),
                format!("  Error: {}", error),
            ],
            RepairEvent::RecordFinished { .. } => Vec::new(),
            RepairEvent::RunCompleted { summary } => {
                let mut lines = vec!["\nDone.".to_string()];
                if summary.broken > 0 {
                    let tally = summary.tally();
                    lines.push(format!(
                        "Processed: {} | Replaced: {} | Kept: {} | No candidate: {} | Failed: {} | Duplicate risk: {}",
                        summary.processed(),
                        tally.replaced,
                        tally.original_kept,
                        tally.no_candidate,
                        tally.insert_failed,
                        tally.duplicate_risk
                    ));
                }
                if summary.untouched > 0 {
                    lines.push(format!(
                        "{} broken items left for a later run.",
                        summary.untouched
                    ));
                }
                if summary.dry_run {
                    lines.push("Run again with --apply to make changes.".to_string());
                }
                lines
            }
        }
    }
}

impl<W: Write + Send> RepairObserver for ConsoleObserver<W> {
    fn on_event(&self, event: &RepairEvent) {
        let lines = Self::render(event);
        if lines.is_empty() {
            return;
        }
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        for line in lines {
            if let Err(e) = writeln!(out, "{}", line) {
                tracing::debug!(error = %e, "Console write failed");
                return;
            }
        }
        if let Err(e) = out.flush() {
            tracing::debug!(error = %e, "Console flush failed");
        }
    }
}

/// Logs every event through `tracing`
///
/// Per-record events go out at debug level; failures are already logged
/// at warn/error by the reconciler.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RepairObserver for TracingObserver {
    fn on_event(&self, event: &RepairEvent) {
        match event {
            RepairEvent::ScanCompleted {
                playlist_id,
                total_entries,
                broken,
            } => tracing::info!(playlist_id = %playlist_id, total_entries, broken, "Scan completed"),
            RepairEvent::SnapshotWritten { path } => {
                tracing::info!(path = %path.display(), "Snapshot written")
            }
            RepairEvent::UnmappedTracks { count, sample } => {
                tracing::info!(count, sample = ?sample, "Unmapped secondary tracks")
            }
            RepairEvent::RecordStarted {
                attempt,
                position,
                title,
            } => tracing::debug!(attempt, position, title = %title, "Repairing record"),
            RepairEvent::CandidateChosen {
                attempt,
                content_id,
                score,
                title,
            } => tracing::debug!(
                attempt,
                content_id = %content_id,
                score,
                candidate_title = %title,
                "Candidate chosen"
            ),
            RepairEvent::NoCandidate { attempt } => {
                tracing::debug!(attempt, "No replacement candidate")
            }
            RepairEvent::DryRun { attempt, position } => {
                tracing::debug!(attempt, position, "Dry run, no mutation")
            }
            RepairEvent::Inserted {
                attempt,
                entry_id,
                position,
            } => tracing::debug!(attempt, entry_id = %entry_id, position, "Replacement inserted"),
            RepairEvent::OriginalDeleted { attempt, entry_id } => {
                tracing::debug!(attempt, entry_id = %entry_id, "Original deleted")
            }
            RepairEvent::OriginalAlreadyGone { attempt, entry_id } => {
                tracing::debug!(attempt, entry_id = %entry_id, "Original already gone")
            }
            RepairEvent::OriginalKept { attempt } => tracing::debug!(attempt, "Original kept"),
            RepairEvent::InsertFailed { attempt, error } => {
                tracing::debug!(attempt, error = %error, "Insert failed")
            }
            RepairEvent::DuplicateRisk {
                attempt,
                entry_id,
                error,
            } => tracing::debug!(
                attempt,
                entry_id = %entry_id,
                error = %error,
                "Duplicate risk: delete failed after insert"
            ),
            RepairEvent::RecordFinished { outcome } => tracing::debug!(
                attempt = outcome.attempt,
                outcome = ?outcome.kind,
                path = ?outcome.progress.path(),
                "Record finished"
            ),
            RepairEvent::RunCompleted { summary } => tracing::info!(
                run_id = %summary.run_id,
                dry_run = summary.dry_run,
                processed = summary.processed(),
                untouched = summary.untouched,
                "Repair run completed"
            ),
        }
    }
}

/// Keeps a copy of every event
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RepairEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, in order
    pub fn events(&self) -> Vec<RepairEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of events matching `predicate`
    pub fn count(&self, predicate: impl Fn(&RepairEvent) -> bool) -> usize {
        self.events
            .lock()
            .map(|e| e.iter().filter(|ev| predicate(ev)).count())
            .unwrap_or(0)
    }
}

impl RepairObserver for RecordingObserver {
    fn on_event(&self, event: &RepairEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Forwards each event to every inner observer, in insertion order
#[derive(Default)]
pub struct FanoutObserver {
    observers: Vec<Box<dyn RepairObserver>>,
}

impl FanoutObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: impl RepairObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl RepairObserver for FanoutObserver {
    fn on_event(&self, event: &RepairEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn render(events: &[RepairEvent]) -> String {
        let console = ConsoleObserver::new(Vec::new());
        for event in events {
            console.on_event(event);
        }
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn test_console_record_lines() {
        let output = render(&[
            RepairEvent::ScanCompleted {
                playlist_id: "PL1".to_string(),
                total_entries: 12,
                broken: 1,
            },
            RepairEvent::RecordStarted {
                attempt: 1,
                position: 4,
                title: "Song".to_string(),
            },
            RepairEvent::CandidateChosen {
                attempt: 1,
                content_id: "v9".to_string(),
                score: 6,
                title: "Song (Official)".to_string(),
            },
            RepairEvent::DryRun {
                attempt: 1,
                position: 4,
            },
        ]);

        assert!(output.starts_with("Playlist items: 12 | Broken: 1\n"));
        assert!(output.contains("[#1] pos=4 title='Song'"));
        assert!(output.contains("  Candidate → v9 (score 6)"));
        assert!(output.contains("DRY-RUN: would insert at same position"));
        assert!(!output.contains("No unavailable items found."));
    }

    #[test]
    fn test_console_insert_failure_has_tip() {
        let output = render(&[RepairEvent::InsertFailed {
            attempt: 2,
            error: "API error 400: manualSortRequired".to_string(),
        }]);
        assert!(output.contains("Custom/Manual order"));
        assert!(output.contains("Error: API error 400: manualSortRequired"));
    }

    #[test]
    fn test_console_empty_scan() {
        let output = render(&[RepairEvent::ScanCompleted {
            playlist_id: "PL1".to_string(),
            total_entries: 3,
            broken: 0,
        }]);
        assert!(output.contains("No unavailable items found."));
    }

    #[test]
    fn test_console_original_already_gone() {
        let output = render(&[RepairEvent::OriginalAlreadyGone {
            attempt: 1,
            entry_id: "PLI_2".to_string(),
        }]);
        assert!(output.contains("PLI_2 was already removed"));
        assert!(!output.contains("Delete failed"));
    }

    #[test]
    fn test_console_survives_flush_failure() {
        struct NoFlush(Vec<u8>);
        impl Write for NoFlush {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.write(buf)
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
        }

        let console = ConsoleObserver::new(NoFlush(Vec::new()));
        console.on_event(&RepairEvent::NoCandidate { attempt: 1 });
        console.on_event(&RepairEvent::OriginalKept { attempt: 2 });

        let output = String::from_utf8(console.into_inner().0).unwrap();
        assert_eq!(output, "  No candidates found.\n  Kept broken item.\n");
    }

    #[test]
    fn test_fanout_preserves_order() {
        struct Shared(Arc<RecordingObserver>);
        impl RepairObserver for Shared {
            fn on_event(&self, event: &RepairEvent) {
                self.0.on_event(event);
            }
        }

        let first = Arc::new(RecordingObserver::new());
        let second = Arc::new(RecordingObserver::new());
        let fanout = FanoutObserver::new()
            .with(Shared(first.clone()))
            .with(Shared(second.clone()));
        assert_eq!(fanout.len(), 2);

        fanout.on_event(&RepairEvent::NoCandidate { attempt: 1 });
        fanout.on_event(&RepairEvent::OriginalKept { attempt: 2 });

        assert_eq!(first.events().len(), 2);
        assert_eq!(
            second.count(|e| matches!(e, RepairEvent::OriginalKept { .. })),
            1
        );
    }
}
