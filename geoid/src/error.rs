//! Error types for the geoid library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when opening or querying a geoid grid.
#[derive(Error, Debug)]
pub enum GeoidError {
    /// The grid file could not be opened for reading.
    #[error("Cannot open geoid grid {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The header is not a valid 16-bit binary PGM header.
    #[error("Malformed geoid grid header: {0}")]
    Format(String),

    /// The `Offset` and/or `Scale` comments were not found in the header.
    #[error("Geoid grid header is missing the {missing} calibration comment")]
    CalibrationMissing { missing: &'static str },

    /// The maximum sample value is not 65535.
    #[error("Unsupported sample depth: maximum value {found} (expected 65535)")]
    Depth { found: String },

    /// Seek or read failure on an already open grid.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be read in full (truncated file).
    #[error("Short read on row {row}: expected {expected} bytes, got {got}")]
    ShortRead {
        row: usize,
        expected: usize,
        got: usize,
    },

    /// The grid was queried after [`close`](crate::GeoidGrid::close).
    #[error("Geoid grid is closed")]
    Closed,

    /// Coordinates that cannot be mapped onto the grid (NaN or infinite).
    #[error("Invalid coordinates: lat={lat}, lon={lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    /// The requested model has no grid file in the data directory.
    #[error("Geoid model not found: {name} (looked for {path})")]
    ModelNotFound { name: String, path: PathBuf },

    /// The model name contains characters that are not allowed.
    #[error("Invalid geoid model name: {name:?}")]
    InvalidModelName { name: String },
}

/// Result type alias using [`GeoidError`].
pub type Result<T> = std::result::Result<T, GeoidError>;
