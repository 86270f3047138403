//! Event types for the gatewatch event system
//!
//! Provides the shared event enum and EventBus used by the analysis engine
//! and the SSE stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Why an analysis session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEndReason {
    /// Video source reported end-of-stream
    EndOfStream,
    /// Stop was requested and observed by the loop
    Stopped,
    /// Video source or tracker failed; session is not retried
    SourceError,
}

/// Gatewatch event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GateEvent {
    /// An analysis session started for a camera
    SessionStarted {
        camera_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// An analysis session ended
    SessionEnded {
        camera_id: Uuid,
        reason: SessionEndReason,
        timestamp: DateTime<Utc>,
    },

    /// New track identifiers were counted for a frame
    ///
    /// `daily_total` is the committed running total for the camera's current
    /// calendar date after this frame's increment.
    DetectionsCounted {
        camera_id: Uuid,
        frame_index: u64,
        new_count: i64,
        daily_total: i64,
        timestamp: DateTime<Utc>,
    },

    /// The camera's daily total first reached its notification threshold
    ThresholdCrossed {
        camera_id: Uuid,
        total: i64,
        threshold: i64,
        timestamp: DateTime<Utc>,
    },

    /// A gate-open command was handed to the publisher (delivery best-effort)
    GateOpenRequested {
        camera_id: Uuid,
        topic: String,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast bus shared by all sessions and the SSE stream
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GateEvent>,
}

impl EventBus {
    /// Create a new bus buffering up to `capacity` events per receiver
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Broadcast an event, ignoring if no receivers are connected
    pub fn broadcast_lossy(&self, event: GateEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<GateEvent> {
        self.tx.subscribe()
    }

    /// Current number of receivers
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_subscriber() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.broadcast_lossy(GateEvent::SessionStarted {
            camera_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, GateEvent::SessionStarted { .. }));
    }

    #[test]
    fn test_broadcast_without_subscribers_is_ok() {
        let bus = EventBus::new(16);
        bus.broadcast_lossy(GateEvent::GateOpenRequested {
            camera_id: Uuid::new_v4(),
            topic: "gate/control".to_string(),
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = GateEvent::ThresholdCrossed {
            camera_id: Uuid::nil(),
            total: 6,
            threshold: 5,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ThresholdCrossed");
        assert_eq!(json["total"], 6);
    }
}
