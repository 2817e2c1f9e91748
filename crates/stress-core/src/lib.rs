//! Core types, configuration and errors for stress analysis
//!
//! This crate holds everything the pipeline stages share: the data model
//! (raw samples, decompositions, features, baselines, per-minute results),
//! the content fingerprint used to key the decomposition cache, the unified
//! error type and the session configuration.
//!
//! # Example
//!
//! ```rust
//! use stress_core::{FeatureVector, MinuteResult, SessionResult, StressLevel};
//!
//! let minutes = vec![
//!     MinuteResult::new(1, StressLevel::Mild, 97.2, FeatureVector::new(2.1, 0.4)),
//!     MinuteResult::new(2, StressLevel::None, 99.1, FeatureVector::new(0.9, 0.1)),
//! ];
//! let session = SessionResult::from_minutes(minutes, vec![]);
//! assert_eq!(session.stress_score, "1/2");
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod fingerprint;
pub mod types;
pub mod utils;

// Re-export core types
pub use config::{
    AnalysisConfig, Band, BandPowerMethod, BaselineStatistic, CacheConfig, CalibrationConfig,
    ClassifierConfig, EmdConfig, Margin, OxygenPolicy, OxygenRange, SpectralConfig, WindowConfig,
    CALIBRATION_WINDOWS, MAX_ANALYSIS_MINUTES,
};
pub use context::{Deadline, SessionContext};
pub use error::{Error, Result};
pub use fingerprint::Fingerprint;
pub use types::{
    BandPower, Baseline, Decomposition, FeatureVector, MinuteResult, RawSample, SessionResult,
    SessionScore, StressLevel, WindowFailure,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
