//! Spectral features of decomposed physiological signals
//!
//! Turns the IMFs of one window into the two scalar features the classifier
//! works with: the IBI LF/HF power ratio and the skin-conductance LF power.
//!
//! ```rust
//! use stress_core::{Decomposition, SpectralConfig};
//! use stress_spectral::FeatureExtractor;
//!
//! let tone: Vec<f64> = (0..60)
//!     .map(|i| (2.0 * std::f64::consts::PI * 0.1 * i as f64).sin())
//!     .collect();
//! let ibi = Decomposition::new(vec![tone.clone()], vec![0.0; 60]);
//! let eda = Decomposition::new(vec![tone], vec![0.0; 60]);
//!
//! let extractor = FeatureExtractor::new(SpectralConfig::default(), 1.0).unwrap();
//! let features = extractor.extract(&ibi, &eda).unwrap();
//! assert!(features.scl_lf_power > 0.0);
//! ```

pub mod analytic;
pub mod band_power;
pub mod features;

pub use analytic::{unwrap_phase, HilbertTransform};
pub use band_power::{band_power, hilbert_marginal, periodogram, Periodogram};
pub use features::{lf_hf_ratio, FeatureExtractor, RATIO_SENTINEL, ZERO_POWER_EPS};
