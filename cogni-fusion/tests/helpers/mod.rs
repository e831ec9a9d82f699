//! Test helpers for cogni-fusion integration tests
//!
//! Provides a fusion engine wired to a manual clock, scripted sensor
//! channels and an in-memory reporter, plus builders for observations.

#![allow(dead_code)]

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use cogni_common::events::EventBus;
use cogni_common::time::ManualClock;
use cogni_common::{HeadPose, PhysioReading, VehicleReading, VisionObservation};
use cogni_fusion::reporter::MemoryReporter;
use cogni_fusion::sources::{ScriptedPhysio, ScriptedVehicle};
use cogni_fusion::FusionEngine;

/// Fixed start instant so timestamps in assertions are reproducible
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 8, 30, 0).unwrap()
}

/// Engine plus handles to its clock and reporter
pub struct TestEngine {
    pub engine: FusionEngine,
    pub clock: ManualClock,
    pub reporter: MemoryReporter,
}

impl TestEngine {
    /// Engine with healthy sensors and the default 2 s debounce
    pub fn new() -> Self {
        Self::with_sensors(Vec::new(), Vec::new(), Duration::from_secs(2), None)
    }

    /// Engine replaying the given sensor readings
    pub fn with_sensors(
        physio: Vec<PhysioReading>,
        vehicle: Vec<VehicleReading>,
        debounce: Duration,
        event_bus: Option<EventBus>,
    ) -> Self {
        let clock = ManualClock::new(start_time());
        let reporter = MemoryReporter::new();
        let mut builder = FusionEngine::builder()
            .clock(clock.clone())
            .reporter(reporter.clone())
            .physio(ScriptedPhysio::new(physio))
            .vehicle(ScriptedVehicle::new(vehicle))
            .debounce_interval(debounce);
        if let Some(bus) = event_bus {
            builder = builder.event_bus(bus);
        }
        Self {
            engine: builder.build(),
            clock,
            reporter,
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.clock.advance(Duration::from_millis(ms));
    }
}

/// Observation facing forward with the given PERCLOS and yawn flag
pub fn vision(perclos: f64, yawn_active: bool) -> VisionObservation {
    VisionObservation::new(perclos, yawn_active, false, HeadPose::Forward).unwrap()
}

/// Observation with the driver looking away
pub fn distracted(perclos: f64) -> VisionObservation {
    VisionObservation::new(perclos, false, true, HeadPose::Left).unwrap()
}

/// Healthy physiological reading
pub fn hrv_ok() -> PhysioReading {
    PhysioReading::ok(62.0)
}

/// Normal driving input
pub fn driving() -> VehicleReading {
    VehicleReading::normal(1.5, 0.45)
}
