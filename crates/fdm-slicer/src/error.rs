//! Error types for the slicer engine.

use thiserror::Error;

/// Errors that can occur while running the engine.
///
/// Exactly the three kinds the engine's contract allows; each carries a
/// free-form detail string so the caller-facing message is always the
/// `"{kind}: {detail}"` concatenation.
#[derive(Error, Debug)]
pub enum SlicerError {
    /// The input STL could not be parsed, or contained zero triangles
    /// after cleanup.
    #[error("InvalidMesh: {0}")]
    InvalidMesh(String),

    /// A non-recoverable numeric failure mid-pipeline (NaN/Inf, or a
    /// self-consistency check failure).
    #[error("GeometryError: {0}")]
    GeometryError(String),

    /// Input not readable or output not writable.
    #[error("IOError: {0}")]
    IOError(String),

    /// A configuration value is out of range. Can only occur before a
    /// job starts, not during `process`.
    #[error("InvalidSettings: {0}")]
    InvalidSettings(String),
}

impl From<std::io::Error> for SlicerError {
    fn from(err: std::io::Error) -> Self {
        SlicerError::IOError(err.to_string())
    }
}

/// Result type for slicer operations.
pub type Result<T> = std::result::Result<T, SlicerError>;
