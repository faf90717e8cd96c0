//! Event types for the plfix event system
//!
//! Provides the public run event definitions and the EventBus used to
//! broadcast them to any listening front end (CLI, UI, test harness).

mod repair_types;

pub use repair_types::{OutcomeKind, OutcomeTally};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// plfix event types
///
/// Events are broadcast via EventBus and can be serialized for transmission.
/// Every event carries the `run_id` of the repair run that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlfixEvent {
    /// Playlist listing and availability classification finished
    ScanCompleted {
        run_id: Uuid,
        playlist_id: String,
        total_entries: usize,
        broken: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Pre-mutation snapshot persisted
    SnapshotWritten {
        run_id: Uuid,
        path: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Secondary catalog tracks that could not be mapped onto any entry
    UnmappedTracks {
        run_id: Uuid,
        count: usize,
        /// Capped sample of "title - artist" strings
        sample: Vec<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One broken record reached a terminal state
    RecordFinished {
        run_id: Uuid,
        /// 1-based attempt number within the run
        attempt: usize,
        position: u32,
        title: String,
        outcome: OutcomeKind,
        replacement: Option<String>,
        /// Raw backend error, when the outcome carries one
        error: Option<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Run finished
    RunCompleted {
        run_id: Uuid,
        dry_run: bool,
        processed: usize,
        untouched: usize,
        tally: OutcomeTally,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlfixEvent {
    /// Run the event belongs to
    pub fn run_id(&self) -> Uuid {
        match self {
            PlfixEvent::ScanCompleted { run_id, .. }
            | PlfixEvent::SnapshotWritten { run_id, .. }
            | PlfixEvent::UnmappedTracks { run_id, .. }
            | PlfixEvent::RecordFinished { run_id, .. }
            | PlfixEvent::RunCompleted { run_id, .. } => *run_id,
        }
    }
}

/// Broadcast bus for PlfixEvent
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlfixEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    ///
    /// # Examples
    ///
    /// ```
    /// use plfix_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlfixEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlfixEvent,
    ) -> Result<usize, broadcast::error::SendError<PlfixEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlfixEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_finished(run_id: Uuid) -> PlfixEvent {
        PlfixEvent::RecordFinished {
            run_id,
            attempt: 1,
            position: 4,
            title: "Song".to_string(),
            outcome: OutcomeKind::DuplicateRisk,
            replacement: Some("abc123".to_string()),
            error: Some("403 forbidden".to_string()),
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = record_finished(Uuid::new_v4());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "RecordFinished");
        assert_eq!(json["outcome"], "DUPLICATE_RISK");
        assert_eq!(json["position"], 4);
    }

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.emit(record_finished(Uuid::new_v4())).is_err());
        // Lossy variant never fails
        bus.emit_lossy(record_finished(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let run_id = Uuid::new_v4();

        assert_eq!(bus.emit(record_finished(run_id)).unwrap(), 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.run_id(), run_id);
        assert_eq!(bus.capacity(), 10);
    }
}
