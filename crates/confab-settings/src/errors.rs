//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The env file could not be read.
    #[error("failed to read env file {path}: {source}")]
    Read {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
