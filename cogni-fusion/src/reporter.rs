//! Transition reporters
//!
//! The engine hands every committed transition to a [`TransitionReporter`]
//! and nothing else. Reporters cannot fail the cycle: a sink that has trouble
//! (no bus subscribers, closed stdout) deals with it locally.

use std::sync::{Arc, Mutex};

use cogni_common::events::{EventBus, FusionEvent};
use cogni_common::TransitionRecord;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Receives committed transitions
pub trait TransitionReporter: Send {
    fn emit(&mut self, record: &TransitionRecord);
}

impl<T: TransitionReporter + ?Sized> TransitionReporter for Box<T> {
    fn emit(&mut self, record: &TransitionRecord) {
        (**self).emit(record)
    }
}

/// Logs each transition as a structured tracing event plus a readable block
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl TransitionReporter for TracingReporter {
    fn emit(&mut self, record: &TransitionRecord) {
        let snapshot = &record.snapshot;
        info!(
            session_id = %record.session_id,
            sequence = record.sequence,
            tier = %record.tier,
            previous_tier = %record.previous_tier,
            rule = record.rule.as_deref().unwrap_or("none"),
            "Tier committed: {} -> {} (interventions: {})",
            record.previous_tier,
            record.tier,
            record.interventions.join(", ")
        );
        info!(
            "  [Vision] PERCLOS={:.2} Yawn={} Gaze={} Pose={}",
            snapshot.vision.perclos,
            u8::from(snapshot.vision.yawn_active),
            if snapshot.vision.gaze_distracted { "distracted" } else { "on-road" },
            snapshot.vision.head_pose
        );
        info!(
            "  [Physio] HRV={:.1} HRV_Status={}",
            snapshot.physio.hrv_value, snapshot.physio.hrv_status
        );
        info!(
            "  [Vehicle] Status={} Pedal={:.2} Steering={:.2}",
            snapshot.vehicle.input_status,
            snapshot.vehicle.pedal_input,
            snapshot.vehicle.steering_rate
        );
    }
}

/// Publishes transitions on the event bus
#[derive(Clone)]
pub struct BusReporter {
    bus: EventBus,
}

impl BusReporter {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl TransitionReporter for BusReporter {
    fn emit(&mut self, record: &TransitionRecord) {
        let event = FusionEvent::TierCommitted {
            record: record.clone(),
        };
        if self.bus.emit(event).is_err() {
            debug!("No bus subscribers for transition #{}", record.sequence);
        }
    }
}

/// Keeps every transition in memory; clones share the same log
#[derive(Debug, Default, Clone)]
pub struct MemoryReporter {
    records: Arc<Mutex<Vec<TransitionRecord>>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TransitionRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransitionReporter for MemoryReporter {
    fn emit(&mut self, record: &TransitionRecord) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
    }
}

/// Fans a transition out to several reporters, in insertion order
#[derive(Default)]
pub struct ReporterSet {
    reporters: Vec<Box<dyn TransitionReporter>>,
}

impl ReporterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: impl TransitionReporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl TransitionReporter for ReporterSet {
    fn emit(&mut self, record: &TransitionRecord) {
        for reporter in &mut self.reporters {
            reporter.emit(record);
        }
    }
}

/// Write every committed transition from the bus as one JSON line
///
/// Runs until the bus is dropped or the writer fails. Other event types are
/// ignored. Returns the number of records written.
pub async fn run_json_sink<W>(
    mut rx: tokio::sync::broadcast::Receiver<FusionEvent>,
    mut writer: W,
) -> std::io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    loop {
        match rx.recv().await {
            Ok(FusionEvent::TierCommitted { record }) => {
                let mut line = serde_json::to_vec(&record)?;
                line.push(b'\n');
                writer.write_all(&line).await?;
                writer.flush().await?;
                written += 1;
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("JSON sink lagged, {} events skipped", skipped);
            }
            Err(RecvError::Closed) => return Ok(written),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cogni_common::{
        HeadPose, PhysioReading, SafetyTier, Snapshot, VehicleReading, VisionObservation,
    };
    use uuid::Uuid;

    fn record(sequence: u64) -> TransitionRecord {
        TransitionRecord::new(
            Uuid::new_v4(),
            sequence,
            Utc::now(),
            SafetyTier::Normal,
            SafetyTier::Tier0Monotony,
            Some("yawning"),
            Snapshot {
                vision: VisionObservation::new(0.05, true, false, HeadPose::Forward).unwrap(),
                physio: PhysioReading::ok(60.0),
                vehicle: VehicleReading::normal(0.0, 0.5),
            },
        )
    }

    #[test]
    fn test_memory_reporter_clones_share_log() {
        let reporter = MemoryReporter::new();
        let mut handle = reporter.clone();
        handle.emit(&record(1));
        handle.emit(&record(2));
        assert_eq!(reporter.len(), 2);
        assert_eq!(reporter.records()[1].sequence, 2);
    }

    #[test]
    fn test_reporter_set_fans_out() {
        let a = MemoryReporter::new();
        let b = MemoryReporter::new();
        let mut set = ReporterSet::new()
            .with(a.clone())
            .with(TracingReporter)
            .with(b.clone());
        assert_eq!(set.len(), 3);

        set.emit(&record(1));
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
    }

    #[tokio::test]
    async fn test_bus_reporter_publishes_tier_committed() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let mut reporter = BusReporter::new(bus);

        reporter.emit(&record(5));

        match rx.recv().await.unwrap() {
            FusionEvent::TierCommitted { record } => assert_eq!(record.sequence, 5),
            other => panic!("unexpected event {}", other.event_type()),
        }
    }

    #[test]
    fn test_bus_reporter_without_subscribers_is_silent() {
        let mut reporter = BusReporter::new(EventBus::new(8));
        reporter.emit(&record(1));
    }

    #[tokio::test]
    async fn test_json_sink_writes_only_transitions() {
        let bus = EventBus::new(8);
        let rx = bus.subscribe();
        let mut out = Vec::new();

        bus.emit(FusionEvent::MalformedInput {
            session_id: Uuid::new_v4(),
            reason: "invalid JSON".to_string(),
            timestamp: Utc::now(),
        })
        .unwrap();
        bus.emit(FusionEvent::TierCommitted { record: record(1) }).unwrap();
        bus.emit(FusionEvent::TierCommitted { record: record(2) }).unwrap();
        drop(bus);

        let written = run_json_sink(rx, &mut out).await.unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: TransitionRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.sequence, 2);
        assert_eq!(parsed.tier, SafetyTier::Tier0Monotony);
    }
}
