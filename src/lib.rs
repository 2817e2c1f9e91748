//! # Stress Analysis
//!
//! Per-minute stress classification from wearable heart-rate and
//! electrodermal-activity telemetry.
//!
//! Each session starts with three calibration minutes that define a personal
//! baseline. Every following minute is decomposed with ensemble empirical mode
//! decomposition, reduced to two spectral features (the IBI LF/HF ratio and
//! the EDA low-frequency power) and compared against that baseline.
//!
//! ## Crates
//!
//! - [`core`]: shared types, configuration, errors and fingerprints
//! - [`cache`]: memory/file decomposition caches with compute-once semantics
//! - [`emd`]: EMD sifting and the seeded EEMD engine
//! - [`spectral`]: Hilbert transform, band power and feature extraction
//! - [`classify`]: baseline calibration, classification and oxygen policy
//! - [`pipeline`]: telemetry sources, windowing and the session [`Analyzer`]
//!
//! ## Example
//!
//! ```
//! use stress_analysis::prelude::*;
//!
//! let config = AnalysisConfig::default().with_emd(EmdConfig::plain());
//! let analyzer = Analyzer::from_config(config).unwrap();
//! let session = analyzer.analyze(1, "dummy").unwrap();
//! println!("stress score {}", session.stress_score);
//! ```

pub use stress_cache as cache;
pub use stress_classify as classify;
pub use stress_core as core;
pub use stress_emd as emd;
pub use stress_pipeline as pipeline;
pub use stress_spectral as spectral;

pub use stress_pipeline::Analyzer;

pub mod prelude {
    pub use stress_cache::{DecompositionCache, FileCache, MemoryCache, NoCache};
    pub use stress_classify::Classifier;
    pub use stress_core::{
        AnalysisConfig, Baseline, EmdConfig, Error, FeatureVector, MinuteResult, RawSample,
        Result, SessionResult, SessionScore, StressLevel,
    };
    pub use stress_emd::EmdEngine;
    pub use stress_pipeline::{Analyzer, SourceRouter, SyntheticSource, TelemetrySource};
    pub use stress_spectral::FeatureExtractor;
}
