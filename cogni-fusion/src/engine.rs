//! Fusion engine
//!
//! Owns the [`FusionState`] for one session and drives the cycle
//! receive → assemble → classify → debounce → report. Everything after
//! `receive` runs to completion before the next frame is read, so the state
//! has exactly one mutator and needs no locking.

use std::time::Duration;

use chrono::{DateTime, Utc};
use cogni_common::events::{EventBus, FusionEvent, SessionEnd, SessionStats};
use cogni_common::time::{Clock, SystemClock};
use cogni_common::{SafetyTier, TransitionRecord, VisionObservation};
use tokio::io::AsyncRead;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::classifier;
use crate::debounce::{FusionState, Transition, DEFAULT_DEBOUNCE_INTERVAL};
use crate::error::{Error, Result};
use crate::ingest::{Ingest, ObservationStream};
use crate::reporter::{TracingReporter, TransitionReporter};
use crate::snapshot;
use crate::sources::{FixedPhysio, FixedVehicle, PhysioSource, VehicleSource};

/// What one cycle did with its candidate tier
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// New tier committed and reported
    Committed(TransitionRecord),
    /// Candidate suppressed by the debounce interval
    Dropped {
        candidate: SafetyTier,
        remaining: Duration,
    },
    /// Candidate matched the committed tier
    Unchanged(SafetyTier),
}

/// Decision core for a single producer session
pub struct FusionEngine {
    session_id: Uuid,
    physio: Box<dyn PhysioSource>,
    vehicle: Box<dyn VehicleSource>,
    reporter: Box<dyn TransitionReporter>,
    clock: Box<dyn Clock>,
    event_bus: Option<EventBus>,
    state: FusionState,
    sequence: u64,
    stats: SessionStats,
}

impl FusionEngine {
    pub fn builder() -> FusionEngineBuilder {
        FusionEngineBuilder::default()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> &FusionState {
        &self.state
    }

    pub fn current_tier(&self) -> SafetyTier {
        self.state.current_tier()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn event_bus(&self) -> Option<&EventBus> {
        self.event_bus.as_ref()
    }

    /// Run one cycle for an observation, timed by the engine clock
    pub fn process(&mut self, vision: VisionObservation) -> CycleOutcome {
        let now = self.clock.now();
        self.process_at(vision, now)
    }

    /// Run one cycle for an observation received at `now`
    pub fn process_at(&mut self, vision: VisionObservation, now: DateTime<Utc>) -> CycleOutcome {
        self.stats.cycles += 1;

        let snapshot = snapshot::assemble(vision, &mut self.physio, &mut self.vehicle);
        let classification = classifier::evaluate(&snapshot);

        match self.state.propose(classification.tier, now) {
            Transition::Unchanged => {
                self.stats.unchanged += 1;
                CycleOutcome::Unchanged(classification.tier)
            }
            Transition::Dropped {
                candidate,
                remaining,
            } => {
                self.stats.dropped += 1;
                debug!(
                    "Debounce dropped {} (current {}, {:?} remaining)",
                    candidate,
                    self.state.current_tier(),
                    remaining
                );
                CycleOutcome::Dropped {
                    candidate,
                    remaining,
                }
            }
            Transition::Committed { from, to } => {
                self.stats.committed += 1;
                self.sequence += 1;
                let record = TransitionRecord::new(
                    self.session_id,
                    self.sequence,
                    now,
                    from,
                    to,
                    classification.rule,
                    snapshot,
                );
                self.reporter.emit(&record);
                CycleOutcome::Committed(record)
            }
        }
    }

    /// Note a rejected frame; the fusion state is not touched
    pub fn reject(&mut self, reason: &str) {
        self.stats.malformed += 1;
        warn!("Skipping malformed vision frame: {}", reason);
        self.publish(FusionEvent::MalformedInput {
            session_id: self.session_id,
            reason: reason.to_string(),
            timestamp: self.clock.now(),
        });
    }

    /// Announce a new producer connection
    pub fn start_session(&mut self, peer: &str) {
        info!(
            session_id = %self.session_id,
            "Vision producer connected from {}",
            peer
        );
        self.publish(FusionEvent::SessionStarted {
            session_id: self.session_id,
            peer: peer.to_string(),
            timestamp: self.clock.now(),
        });
    }

    /// Drive cycles until the producer closes the stream
    ///
    /// Returns the session counters on a clean end. Receive timeouts and
    /// transport errors end the session with `Err`. A `SessionEnded` event is
    /// published on every exit path.
    pub async fn run<R>(&mut self, stream: &mut ObservationStream<R>) -> Result<SessionStats>
    where
        R: AsyncRead + Unpin,
    {
        let result = self.drive(stream).await;

        let end = match &result {
            Ok(()) => SessionEnd::ProducerClosed,
            Err(Error::ReceiveTimeout(_)) => SessionEnd::ReceiveTimeout,
            Err(e) => SessionEnd::StreamError {
                message: e.to_string(),
            },
        };
        self.finish(end);

        result.map(|()| self.stats)
    }

    /// Close the session on process shutdown
    pub fn shutdown(&mut self) {
        self.finish(SessionEnd::Shutdown);
    }

    async fn drive<R>(&mut self, stream: &mut ObservationStream<R>) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            match stream.receive().await? {
                Ingest::Observation(vision) => {
                    self.process(vision);
                }
                Ingest::Malformed(e) => self.reject(&e.to_string()),
                Ingest::EndOfStream => return Ok(()),
            }
        }
    }

    fn finish(&mut self, end: SessionEnd) {
        match &end {
            SessionEnd::StreamError { message } => {
                error!(session_id = %self.session_id, "Session failed: {}", message)
            }
            SessionEnd::ReceiveTimeout => {
                error!(session_id = %self.session_id, "Vision producer went silent")
            }
            _ => info!(session_id = %self.session_id, "Session ended: {:?}", end),
        }
        info!(
            "Session stats: {} cycles, {} committed, {} dropped, {} unchanged, {} malformed; final tier {}",
            self.stats.cycles,
            self.stats.committed,
            self.stats.dropped,
            self.stats.unchanged,
            self.stats.malformed,
            self.state.current_tier()
        );

        self.publish(FusionEvent::SessionEnded {
            session_id: self.session_id,
            end,
            stats: self.stats,
            final_tier: self.state.current_tier(),
            timestamp: self.clock.now(),
        });
    }

    fn publish(&self, event: FusionEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(event);
        }
    }
}

/// Builder for [`FusionEngine`]
///
/// Unset collaborators default to healthy fixed sensors, the tracing
/// reporter, the system clock and a 2 s debounce interval.
pub struct FusionEngineBuilder {
    session_id: Option<Uuid>,
    physio: Box<dyn PhysioSource>,
    vehicle: Box<dyn VehicleSource>,
    reporter: Box<dyn TransitionReporter>,
    clock: Box<dyn Clock>,
    event_bus: Option<EventBus>,
    debounce_interval: Duration,
}

impl Default for FusionEngineBuilder {
    fn default() -> Self {
        Self {
            session_id: None,
            physio: Box::new(FixedPhysio::default()),
            vehicle: Box::new(FixedVehicle::default()),
            reporter: Box::new(TracingReporter),
            clock: Box::new(SystemClock),
            event_bus: None,
            debounce_interval: DEFAULT_DEBOUNCE_INTERVAL,
        }
    }
}

impl FusionEngineBuilder {
    pub fn session_id(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn physio(mut self, source: impl PhysioSource + 'static) -> Self {
        self.physio = Box::new(source);
        self
    }

    pub fn vehicle(mut self, source: impl VehicleSource + 'static) -> Self {
        self.vehicle = Box::new(source);
        self
    }

    pub fn physio_boxed(mut self, source: Box<dyn PhysioSource>) -> Self {
        self.physio = source;
        self
    }

    pub fn vehicle_boxed(mut self, source: Box<dyn VehicleSource>) -> Self {
        self.vehicle = source;
        self
    }

    pub fn reporter(mut self, reporter: impl TransitionReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn debounce_interval(mut self, interval: Duration) -> Self {
        self.debounce_interval = interval;
        self
    }

    /// Build the engine; its fusion state starts at the clock's current time
    pub fn build(self) -> FusionEngine {
        let start = self.clock.now();
        FusionEngine {
            session_id: self.session_id.unwrap_or_else(Uuid::new_v4),
            physio: self.physio,
            vehicle: self.vehicle,
            reporter: self.reporter,
            clock: self.clock,
            event_bus: self.event_bus,
            state: FusionState::new(start, self.debounce_interval),
            sequence: 0,
            stats: SessionStats::default(),
        }
    }
}
