//! Empirical mode decomposition for short physiological windows
//!
//! Splits a uniformly sampled signal into intrinsic mode functions (IMFs),
//! ordered from the highest to the lowest frequency, plus a residual trend.
//!
//! - [`extrema`]: local maxima/minima with plateau handling
//! - [`spline`]: natural cubic spline envelopes with mirrored boundaries
//! - [`sift`]: the sifting loop and plain EMD
//! - [`ensemble`]: noise-assisted ensemble EMD with seeded, schedule
//!   independent noise
//! - [`EmdEngine`]: validation plus cache consultation in front of it all
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use stress_cache::MemoryCache;
//! use stress_core::{Deadline, EmdConfig};
//! use stress_emd::EmdEngine;
//!
//! let signal: Vec<f64> = (0..120).map(|t| (t as f64 * 0.5).sin()).collect();
//! let engine = EmdEngine::new(EmdConfig::plain(), Arc::new(MemoryCache::new())).unwrap();
//! let decomposition = engine.decompose(&signal, &Deadline::none()).unwrap();
//! assert!(decomposition.imf_count() >= 1);
//! ```

pub mod engine;
pub mod ensemble;
pub mod extrema;
pub mod sift;
pub mod spline;

pub use engine::EmdEngine;
pub use ensemble::eemd;
pub use extrema::{find_extrema, Extrema};
pub use sift::{emd, sift, SiftOutcome};
pub use spline::CubicSpline;
