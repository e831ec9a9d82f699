//! Resolved runtime configuration for the fusion server
//!
//! [`FusionConfig`] is what the server actually runs with: the TOML
//! bootstrap settings with command-line/environment overrides applied and
//! millisecond fields turned into durations.

use std::time::Duration;

use cogni_common::config::{SensorConfig, SensorMode, TomlConfig};
use cogni_common::time::millis_to_duration;

use crate::error::Result;
use crate::ingest::IngestConfig;
use crate::sources::{
    FixedPhysio, FixedVehicle, PhysioSource, SimulatedPhysio, SimulatedVehicle, VehicleSource,
};

/// Values supplied on the command line or through environment variables
///
/// `None` leaves the TOML (or default) value in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debounce_ms: Option<u64>,
    pub receive_timeout_ms: Option<u64>,
    pub seed: Option<u64>,
    pub json_lines: bool,
}

/// Fusion server configuration
#[derive(Debug, Clone)]
pub struct FusionConfig {
    pub bind_addr: String,
    pub debounce_interval: Duration,
    pub ingest: IngestConfig,
    pub sensors: SensorConfig,
    pub json_lines: bool,
    pub event_bus_capacity: usize,
}

impl FusionConfig {
    /// Apply overrides to the bootstrap file and validate the result
    ///
    /// Validation runs on the merged values, so an override can replace an
    /// out-of-range file value.
    pub fn resolve(mut toml: TomlConfig, overrides: ConfigOverrides) -> Result<Self> {
        if let Some(host) = overrides.host {
            toml.server.host = host;
        }
        if let Some(port) = overrides.port {
            toml.server.port = port;
        }
        if let Some(ms) = overrides.debounce_ms {
            toml.fusion.debounce_ms = ms;
        }
        if let Some(ms) = overrides.receive_timeout_ms {
            toml.server.receive_timeout_ms = ms;
        }
        if overrides.seed.is_some() {
            toml.sensors.seed = overrides.seed;
        }
        if overrides.json_lines {
            toml.output.json_lines = true;
        }

        toml.validate()?;

        let receive_timeout = match toml.server.receive_timeout_ms {
            0 => None,
            ms => Some(millis_to_duration(ms)),
        };

        Ok(Self {
            bind_addr: format!("{}:{}", toml.server.host, toml.server.port),
            debounce_interval: millis_to_duration(toml.fusion.debounce_ms),
            ingest: IngestConfig {
                max_frame_bytes: toml.server.max_frame_bytes,
                receive_timeout,
            },
            sensors: toml.sensors,
            json_lines: toml.output.json_lines,
            event_bus_capacity: toml.output.event_bus_capacity,
        })
    }

    /// Auxiliary sensor sources for the configured mode
    pub fn sensor_sources(&self) -> (Box<dyn PhysioSource>, Box<dyn VehicleSource>) {
        match self.sensors.mode {
            SensorMode::Simulated => (
                Box::new(SimulatedPhysio::from_config(&self.sensors)),
                Box::new(SimulatedVehicle::from_config(&self.sensors)),
            ),
            SensorMode::Nominal => (
                Box::new(FixedPhysio::default()),
                Box::new(FixedVehicle::default()),
            ),
        }
    }
}
