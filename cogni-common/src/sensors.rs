//! Auxiliary sensor readings (physiological and vehicle dynamics)
//!
//! Sensor unavailability is a reading, not an error: a detached ECG lead is
//! reported as [`HrvStatus::Failure`] and hands-off driving as
//! [`InputStatus::ZeroInput`]. The classifier depends on seeing both.

use serde::{Deserialize, Serialize};

/// Health of the heart-rate-variability channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HrvStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ANOMALY_DETECTED")]
    Anomaly,
    #[serde(rename = "FAILURE")]
    Failure,
}

impl std::fmt::Display for HrvStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HrvStatus::Ok => write!(f, "OK"),
            HrvStatus::Anomaly => write!(f, "ANOMALY_DETECTED"),
            HrvStatus::Failure => write!(f, "FAILURE"),
        }
    }
}

/// Driver input pattern reported by the vehicle bus
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputStatus {
    Normal,
    Erratic,
    ZeroInput,
}

impl std::fmt::Display for InputStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputStatus::Normal => write!(f, "NORMAL"),
            InputStatus::Erratic => write!(f, "ERRATIC"),
            InputStatus::ZeroInput => write!(f, "ZERO_INPUT"),
        }
    }
}

/// One sample of the physiological channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PhysioReading {
    /// HRV value in ms (0.0 on anomaly, -1.0 on sensor failure)
    pub hrv_value: f64,
    pub hrv_status: HrvStatus,
}

impl PhysioReading {
    pub fn ok(hrv_value: f64) -> Self {
        Self {
            hrv_value,
            hrv_status: HrvStatus::Ok,
        }
    }

    pub fn anomaly() -> Self {
        Self {
            hrv_value: 0.0,
            hrv_status: HrvStatus::Anomaly,
        }
    }

    pub fn failure() -> Self {
        Self {
            hrv_value: -1.0,
            hrv_status: HrvStatus::Failure,
        }
    }
}

/// One sample of the vehicle-dynamics channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VehicleReading {
    /// Steering wheel rate in deg/s
    pub steering_rate: f64,
    /// Normalized pedal position, 0.0 to 1.0
    pub pedal_input: f64,
    pub input_status: InputStatus,
}

impl VehicleReading {
    pub fn normal(steering_rate: f64, pedal_input: f64) -> Self {
        Self {
            steering_rate,
            pedal_input,
            input_status: InputStatus::Normal,
        }
    }

    pub fn erratic(steering_rate: f64, pedal_input: f64) -> Self {
        Self {
            steering_rate,
            pedal_input,
            input_status: InputStatus::Erratic,
        }
    }

    pub fn zero_input() -> Self {
        Self {
            steering_rate: 0.0,
            pedal_input: 0.0,
            input_status: InputStatus::ZeroInput,
        }
    }
}
