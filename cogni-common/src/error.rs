//! Common error types for CogniShield

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for CogniShield operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the fusion server and its tools
#[derive(Error, Debug)]
pub enum Error {
    /// Config file could not be read
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration parsing or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
