//! Configuration loading and config file resolution
//!
//! Bootstrap settings come from a TOML file. Every field has a built-in
//! default, so an absent file (or an absent section) still yields a usable
//! configuration. Resolution priority, highest first:
//!
//! 1. Command-line argument
//! 2. Environment variable (handled by clap `env = ...` in the binaries)
//! 3. TOML config file
//! 4. Built-in default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "COGNI_CONFIG";

/// Complete bootstrap configuration as read from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub fusion: FusionSettings,

    #[serde(default)]
    pub sensors: SensorConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener settings for the vision stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Receive timeout on the producer stream; 0 disables it
    #[serde(default = "default_receive_timeout_ms")]
    pub receive_timeout_ms: u64,

    /// Largest accepted frame, excluding the newline
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

/// Decision-core settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FusionSettings {
    /// Minimum dwell time between committed tier changes
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

/// Which auxiliary sensor sources to wire in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SensorMode {
    /// Randomized simulators with field-observed fault rates
    Simulated,
    /// Constant healthy readings
    Nominal,
}

/// Auxiliary sensor source settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorConfig {
    #[serde(default = "default_sensor_mode")]
    pub mode: SensorMode,

    /// Seed for the simulators; random when absent
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_physio_anomaly_probability")]
    pub physio_anomaly_probability: f64,

    #[serde(default = "default_physio_failure_probability")]
    pub physio_failure_probability: f64,

    #[serde(default = "default_vehicle_erratic_probability")]
    pub vehicle_erratic_probability: f64,

    #[serde(default = "default_vehicle_zero_input_probability")]
    pub vehicle_zero_input_probability: f64,
}

/// Transition output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Write each committed transition to stdout as one JSON line
    #[serde(default)]
    pub json_lines: bool,

    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    65432
}

fn default_receive_timeout_ms() -> u64 {
    5000
}

fn default_max_frame_bytes() -> usize {
    4096
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_sensor_mode() -> SensorMode {
    SensorMode::Simulated
}

fn default_physio_anomaly_probability() -> f64 {
    0.01
}

fn default_physio_failure_probability() -> f64 {
    0.005
}

fn default_vehicle_erratic_probability() -> f64 {
    0.05
}

fn default_vehicle_zero_input_probability() -> f64 {
    0.02
}

fn default_event_bus_capacity() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            receive_timeout_ms: default_receive_timeout_ms(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            mode: default_sensor_mode(),
            seed: None,
            physio_anomaly_probability: default_physio_anomaly_probability(),
            physio_failure_probability: default_physio_failure_probability(),
            vehicle_erratic_probability: default_vehicle_erratic_probability(),
            vehicle_zero_input_probability: default_vehicle_zero_input_probability(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_lines: false,
            event_bus_capacity: default_event_bus_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Upper bound on the debounce interval (10 minutes)
pub const MAX_DEBOUNCE_MS: u64 = 600_000;

/// Lower bound on the frame size limit
pub const MIN_FRAME_BYTES: usize = 64;

impl TomlConfig {
    /// Parse TOML text
    ///
    /// Values are not range-checked here: command-line overrides are applied
    /// on top first, then the merged result is validated.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(Error::Config("server.host must not be empty".to_string()));
        }
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be non-zero".to_string()));
        }
        if self.server.max_frame_bytes < MIN_FRAME_BYTES {
            return Err(Error::Config(format!(
                "server.max_frame_bytes must be at least {}",
                MIN_FRAME_BYTES
            )));
        }
        if self.fusion.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(Error::Config(format!(
                "fusion.debounce_ms must not exceed {}",
                MAX_DEBOUNCE_MS
            )));
        }
        if self.output.event_bus_capacity == 0 {
            return Err(Error::Config(
                "output.event_bus_capacity must be non-zero".to_string(),
            ));
        }

        let probabilities = [
            ("sensors.physio_anomaly_probability", self.sensors.physio_anomaly_probability),
            ("sensors.physio_failure_probability", self.sensors.physio_failure_probability),
            ("sensors.vehicle_erratic_probability", self.sensors.vehicle_erratic_probability),
            ("sensors.vehicle_zero_input_probability", self.sensors.vehicle_zero_input_probability),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::Config(format!("{} must be within [0, 1], got {}", name, p)));
            }
        }

        Ok(())
    }
}

/// Locate the config file when none was named explicitly
///
/// Tries `<config_dir>/cognishield/fusion.toml`, then
/// `/etc/cognishield/fusion.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("cognishield").join("fusion.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/cognishield/fusion.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Load configuration from an explicit path or the default locations
///
/// An explicitly named file must exist and parse. When no file is named and
/// none is found at the default locations, built-in defaults are used.
/// Returns the unvalidated configuration and the path it was read from, if
/// any; callers validate after applying their overrides.
pub fn load_config(explicit: Option<&Path>) -> Result<(TomlConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => return Ok((TomlConfig::default(), None)),
        },
    };

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(source) => return Err(Error::Io { path, source }),
    };
    let config = TomlConfig::from_toml_str(&text)?;
    Ok((config, Some(path)))
}
