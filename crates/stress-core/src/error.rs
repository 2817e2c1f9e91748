//! Error types for stress analysis
//!
//! Provides a unified error type for all stress-analysis crates.

use std::time::Duration;
use thiserror::Error;

/// Core error type for the analysis pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Not enough raw samples for the requested span or for a window
    #[error("Insufficient data: expected at least {expected} samples, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// The calibration period did not yield enough valid windows
    #[error("Insufficient baseline: need {required} valid calibration windows, got {valid}")]
    InsufficientBaseline { required: usize, valid: usize },

    /// Malformed or degenerate signal handed to the decomposition engine
    #[error("Decomposition error: {0}")]
    Decomposition(String),

    /// Non-finite feature values reached the classifier
    #[error("Classification error: {0}")]
    Classification(String),

    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Telemetry source could not produce samples
    #[error("Source error: {0}")]
    Source(String),

    /// Cache-related error
    #[error("Cache error: {0}")]
    Cache(String),

    /// The request deadline expired before the session finished
    #[error("Timed out after {limit:?}")]
    Timeout { limit: Duration },

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create an error for a short sample count
    pub fn insufficient_data(expected: usize, actual: usize) -> Self {
        Self::InsufficientData { expected, actual }
    }

    /// Create an error for NaN/Inf values in a signal
    pub fn non_finite(context: &str) -> Self {
        Self::Decomposition(format!("{context} contains NaN or infinite values"))
    }

    /// Create an error for a signal too short to decompose
    pub fn signal_too_short(min: usize, actual: usize) -> Self {
        Self::Decomposition(format!(
            "signal has {actual} samples, at least {min} required"
        ))
    }

    /// Whether this error only affects a single window.
    ///
    /// Window-level failures are recorded and excluded from the session score;
    /// everything else aborts the session.
    pub fn is_window_local(&self) -> bool {
        matches!(self, Error::Decomposition(_) | Error::Classification(_))
    }
}
