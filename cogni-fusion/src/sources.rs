//! Auxiliary sensor sources
//!
//! The fusion engine samples one physiological and one vehicle reading per
//! cycle through [`PhysioSource`] and [`VehicleSource`]. Both are infallible:
//! a source that cannot produce a real measurement returns a reading whose
//! status says so.
//!
//! Implementations:
//! - [`SimulatedPhysio`] / [`SimulatedVehicle`]: seeded random simulators
//!   with field-observed fault rates (stand-ins for the ECG front end and
//!   the CAN-FD controller)
//! - [`FixedPhysio`] / [`FixedVehicle`]: constant readings
//! - [`ScriptedPhysio`] / [`ScriptedVehicle`]: replay a list of readings,
//!   repeating the last one when exhausted

use std::collections::VecDeque;

use cogni_common::config::SensorConfig;
use cogni_common::{PhysioReading, VehicleReading};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Physiological (ECG/HRV) channel
pub trait PhysioSource: Send {
    fn sample_physio(&mut self) -> PhysioReading;
}

/// Vehicle dynamics (steering/pedal) channel
pub trait VehicleSource: Send {
    fn sample_vehicle(&mut self) -> VehicleReading;
}

impl<T: PhysioSource + ?Sized> PhysioSource for Box<T> {
    fn sample_physio(&mut self) -> PhysioReading {
        (**self).sample_physio()
    }
}

impl<T: VehicleSource + ?Sized> VehicleSource for Box<T> {
    fn sample_vehicle(&mut self) -> VehicleReading {
        (**self).sample_vehicle()
    }
}

/// HRV range produced by a healthy simulated driver (ms)
const SIM_HRV_RANGE: std::ops::Range<f64> = 40.0..80.0;
/// Steering rate range during normal simulated driving (deg/s)
const SIM_STEERING_RANGE: std::ops::Range<f64> = -5.0..5.0;
/// Pedal range during normal simulated driving
const SIM_PEDAL_RANGE: std::ops::Range<f64> = 0.3..0.7;
/// Magnitude of a simulated steering jerk (deg/s)
const SIM_STEERING_JERK: f64 = 20.0;

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Randomized ECG/HRV simulator
pub struct SimulatedPhysio {
    rng: StdRng,
    anomaly_probability: f64,
    failure_probability: f64,
}

impl SimulatedPhysio {
    pub fn new(seed: Option<u64>, anomaly_probability: f64, failure_probability: f64) -> Self {
        Self {
            rng: seeded_rng(seed),
            anomaly_probability,
            failure_probability,
        }
    }

    pub fn from_config(config: &SensorConfig) -> Self {
        Self::new(
            config.seed,
            config.physio_anomaly_probability,
            config.physio_failure_probability,
        )
    }
}

impl PhysioSource for SimulatedPhysio {
    fn sample_physio(&mut self) -> PhysioReading {
        let hrv = self.rng.gen_range(SIM_HRV_RANGE);

        // Anomaly is drawn first; failure only when no anomaly was drawn
        if self.rng.gen_bool(self.anomaly_probability) {
            PhysioReading::anomaly()
        } else if self.rng.gen_bool(self.failure_probability) {
            PhysioReading::failure()
        } else {
            PhysioReading::ok(hrv)
        }
    }
}

/// Randomized steering/pedal simulator
pub struct SimulatedVehicle {
    rng: StdRng,
    erratic_probability: f64,
    zero_input_probability: f64,
}

impl SimulatedVehicle {
    pub fn new(seed: Option<u64>, erratic_probability: f64, zero_input_probability: f64) -> Self {
        Self {
            rng: seeded_rng(seed),
            erratic_probability,
            zero_input_probability,
        }
    }

    /// Uses a seed offset from the physio simulator's so the channels differ
    pub fn from_config(config: &SensorConfig) -> Self {
        Self::new(
            config.seed.map(|s| s.wrapping_add(1)),
            config.vehicle_erratic_probability,
            config.vehicle_zero_input_probability,
        )
    }
}

impl VehicleSource for SimulatedVehicle {
    fn sample_vehicle(&mut self) -> VehicleReading {
        let mut reading = VehicleReading::normal(
            self.rng.gen_range(SIM_STEERING_RANGE),
            self.rng.gen_range(SIM_PEDAL_RANGE),
        );

        if self.rng.gen_bool(self.erratic_probability) {
            if self.rng.gen_bool(0.5) {
                let direction = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                reading = VehicleReading::erratic(direction * SIM_STEERING_JERK, reading.pedal_input);
            } else {
                let pedal = if self.rng.gen_bool(0.5) { 1.0 } else { 0.0 };
                reading = VehicleReading::erratic(reading.steering_rate, pedal);
            }
        }

        // Hands off wheel and foot off pedal overrides an erratic draw
        if self.rng.gen_bool(self.zero_input_probability) {
            reading = VehicleReading::zero_input();
        }

        reading
    }
}

/// Always returns the same physiological reading
#[derive(Debug, Clone, Copy)]
pub struct FixedPhysio(pub PhysioReading);

impl Default for FixedPhysio {
    fn default() -> Self {
        Self(PhysioReading::ok(60.0))
    }
}

impl PhysioSource for FixedPhysio {
    fn sample_physio(&mut self) -> PhysioReading {
        self.0
    }
}

/// Always returns the same vehicle reading
#[derive(Debug, Clone, Copy)]
pub struct FixedVehicle(pub VehicleReading);

impl Default for FixedVehicle {
    fn default() -> Self {
        Self(VehicleReading::normal(0.0, 0.5))
    }
}

impl VehicleSource for FixedVehicle {
    fn sample_vehicle(&mut self) -> VehicleReading {
        self.0
    }
}

/// Replays a fixed sequence of physiological readings
#[derive(Debug, Clone)]
pub struct ScriptedPhysio {
    queue: VecDeque<PhysioReading>,
    last: PhysioReading,
}

impl ScriptedPhysio {
    /// Readings are returned in order; an empty script yields healthy readings
    pub fn new(readings: impl IntoIterator<Item = PhysioReading>) -> Self {
        Self {
            queue: readings.into_iter().collect(),
            last: FixedPhysio::default().0,
        }
    }
}

impl PhysioSource for ScriptedPhysio {
    fn sample_physio(&mut self) -> PhysioReading {
        if let Some(next) = self.queue.pop_front() {
            self.last = next;
        }
        self.last
    }
}

/// Replays a fixed sequence of vehicle readings
#[derive(Debug, Clone)]
pub struct ScriptedVehicle {
    queue: VecDeque<VehicleReading>,
    last: VehicleReading,
}

impl ScriptedVehicle {
    pub fn new(readings: impl IntoIterator<Item = VehicleReading>) -> Self {
        Self {
            queue: readings.into_iter().collect(),
            last: FixedVehicle::default().0,
        }
    }
}

impl VehicleSource for ScriptedVehicle {
    fn sample_vehicle(&mut self) -> VehicleReading {
        if let Some(next) = self.queue.pop_front() {
            self.last = next;
        }
        self.last
    }
}
