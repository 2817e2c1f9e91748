//! Stress analysis pipeline
//!
//! Turns raw heart-rate and electrodermal-activity telemetry into per-minute
//! stress classifications:
//!
//! - [`source`]: telemetry sources and identifier routing
//!   ([`SyntheticSource`], [`FeedFileSource`], [`CsvSource`])
//! - [`windowing`]: time-bucketed calibration/analysis windows and derived
//!   IBI/EDA signals
//! - [`analyzer`]: the end-to-end [`Analyzer`] service
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stress_cache::MemoryCache;
//! use stress_core::{AnalysisConfig, EmdConfig};
//! use stress_pipeline::Analyzer;
//!
//! let config = AnalysisConfig::default().with_emd(EmdConfig::plain());
//! let analyzer = Analyzer::new(config, Arc::new(MemoryCache::new())).unwrap();
//!
//! let session = analyzer.analyze(2, "synthetic:1").unwrap();
//! assert_eq!(session.results.len() + session.failed_windows.len(), 2);
//! ```

pub mod analyzer;
pub mod csv_source;
pub mod feed;
pub mod source;
pub mod synthetic;
pub mod windowing;

pub use analyzer::Analyzer;
pub use csv_source::{read_csv, CsvSource};
pub use feed::{parse_feed, FeedFileSource};
pub use source::{FetchRequest, SourceRouter, TelemetrySource};
pub use synthetic::SyntheticSource;
pub use windowing::{
    derive, latest_complete, segment, DerivedSignals, SessionWindows, Window, WindowRole,
};
