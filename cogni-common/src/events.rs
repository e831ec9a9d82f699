//! Event types and EventBus
//!
//! Everything observable about a fusion session flows through [`EventBus`]:
//! committed transitions, rejected input, and session lifecycle. Sinks
//! (stdout JSON lines, a vehicle-bus bridge, tests) subscribe without the
//! decision core knowing about them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::record::TransitionRecord;
use crate::tier::SafetyTier;

/// Per-session counters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionStats {
    /// Well-formed observations processed
    pub cycles: u64,
    /// Candidates committed as the new tier
    pub committed: u64,
    /// Candidates suppressed by the debounce interval
    pub dropped: u64,
    /// Candidates equal to the current tier
    pub unchanged: u64,
    /// Frames rejected by the decoder
    pub malformed: u64,
}

/// How a session ended
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SessionEnd {
    /// Producer closed the stream
    ProducerClosed,
    /// Producer went silent past the receive timeout
    ReceiveTimeout,
    /// Transport failed
    StreamError { message: String },
    /// Process asked to shut down
    Shutdown,
}

/// CogniShield event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FusionEvent {
    /// Producer connected
    SessionStarted {
        session_id: Uuid,
        peer: String,
        timestamp: DateTime<Utc>,
    },

    /// Debounce state machine committed a new tier
    TierCommitted { record: TransitionRecord },

    /// A frame was rejected; no state changed
    MalformedInput {
        session_id: Uuid,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Session loop exited
    SessionEnded {
        session_id: Uuid,
        end: SessionEnd,
        stats: SessionStats,
        final_tier: SafetyTier,
        timestamp: DateTime<Utc>,
    },
}

impl FusionEvent {
    /// Event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            FusionEvent::SessionStarted { .. } => "SessionStarted",
            FusionEvent::TierCommitted { .. } => "TierCommitted",
            FusionEvent::MalformedInput { .. } => "MalformedInput",
            FusionEvent::SessionEnded { .. } => "SessionEnded",
        }
    }
}

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the decision loop)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use cogni_common::events::{EventBus, FusionEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(FusionEvent::SessionStarted {
///     session_id: uuid::Uuid::new_v4(),
///     peer: "127.0.0.1:50000".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FusionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<FusionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: FusionEvent,
    ) -> Result<usize, broadcast::error::SendError<FusionEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: FusionEvent) {
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

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        let result = bus.emit(FusionEvent::MalformedInput {
            session_id: Uuid::new_v4(),
            reason: "invalid JSON".to_string(),
            timestamp: Utc::now(),
        });
        assert!(result.is_err());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let session_id = Uuid::new_v4();

        bus.emit(FusionEvent::SessionEnded {
            session_id,
            end: SessionEnd::ProducerClosed,
            stats: SessionStats::default(),
            final_tier: SafetyTier::Normal,
            timestamp: Utc::now(),
        })
        .unwrap();

        match rx.recv().await.unwrap() {
            FusionEvent::SessionEnded { session_id: id, end, .. } => {
                assert_eq!(id, session_id);
                assert_eq!(end, SessionEnd::ProducerClosed);
            }
            other => panic!("unexpected event {}", other.event_type()),
        }
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = FusionEvent::SessionEnded {
            session_id: Uuid::nil(),
            end: SessionEnd::StreamError {
                message: "connection reset".to_string(),
            },
            stats: SessionStats {
                cycles: 3,
                ..Default::default()
            },
            final_tier: SafetyTier::Tier0Monotony,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SessionEnded");
        assert_eq!(json["end"]["reason"], "stream_error");
        assert_eq!(json["stats"]["cycles"], 3);
        assert_eq!(json["final_tier"], "TIER_0_MONOTONY");
    }

    #[test]
    fn test_capacity() {
        assert_eq!(EventBus::new(42).capacity(), 42);
    }
}
