//! Error types for cogni-fusion
//!
//! Only session-fatal and startup conditions are errors. Malformed vision
//! frames are reported as [`crate::ingest::Ingest::Malformed`] and sensor
//! outages are reading values, so neither appears here.

use std::time::Duration;
use thiserror::Error;

/// Main error type for the fusion server
#[derive(Error, Debug)]
pub enum Error {
    /// Listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Producer stream I/O errors
    #[error("Stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Producer sent nothing within the receive timeout
    #[error("No vision frame received within {0:?}")]
    ReceiveTimeout(Duration),

    /// Configuration errors surfaced from cogni-common
    #[error(transparent)]
    Common(#[from] cogni_common::Error),
}

/// Convenience Result type using cogni-fusion Error
pub type Result<T> = std::result::Result<T, Error>;
