//! # CogniShield Safety Fusion (cogni-fusion)
//!
//! Decision core of the driver-monitoring stack. Each vision observation is
//! fused with one physiological and one vehicle reading, classified into a
//! safety tier by an ordered rule table, and committed through a debounce
//! state machine. Committed transitions go to the configured reporters.
//!
//! **Architecture:** one producer session per process on a current-thread
//! tokio runtime; `ObservationStream::receive` is the only suspension point.

pub mod classifier;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod reporter;
pub mod server;
pub mod snapshot;
pub mod sources;

pub use classifier::{classify, evaluate, Classification};
pub use config::{ConfigOverrides, FusionConfig};
pub use debounce::{FusionState, Transition};
pub use engine::{CycleOutcome, FusionEngine, FusionEngineBuilder};
pub use error::{Error, Error as FusionError, Result};
pub use ingest::{Ingest, IngestConfig, ObservationStream};
pub use server::FusionServer;
