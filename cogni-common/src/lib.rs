//! # CogniShield Common Library
//!
//! Shared code for the CogniShield fusion server and its tools:
//! - Vision observation types and the line-delimited JSON wire codec
//! - Physiological and vehicle sensor readings
//! - Safety tiers and their alert protocol
//! - Snapshot and transition record (the audit/bus payload)
//! - Event types and EventBus
//! - Configuration loading
//! - Timestamp and clock utilities

pub mod config;
pub mod error;
pub mod events;
pub mod observation;
pub mod record;
pub mod sensors;
pub mod tier;
pub mod time;

pub use error::{Error, Result};
pub use observation::{DecodeError, HeadPose, VisionObservation};
pub use record::{Snapshot, TransitionRecord};
pub use sensors::{HrvStatus, InputStatus, PhysioReading, VehicleReading};
pub use tier::{AlertLevel, SafetyTier};
