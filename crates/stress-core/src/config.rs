//! Configuration types for the analysis pipeline
//!
//! Every section implements `Default` with the values the service runs with,
//! and deserializes with `#[serde(default)]` so a JSON config file only needs
//! to mention what it overrides.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Number of leading one-minute windows reserved for calibration
pub const CALIBRATION_WINDOWS: usize = 3;

/// Largest analysis span a single request may ask for
pub const MAX_ANALYSIS_MINUTES: usize = 60;

/// Top-level configuration for an analysis session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub window: WindowConfig,
    pub emd: EmdConfig,
    pub spectral: SpectralConfig,
    pub calibration: CalibrationConfig,
    pub classifier: ClassifierConfig,
    pub cache: CacheConfig,
    /// Per-request deadline in milliseconds
    pub timeout_ms: Option<u64>,
}

impl AnalysisConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    pub fn with_emd(mut self, emd: EmdConfig) -> Self {
        self.emd = emd;
        self
    }

    pub fn with_spectral(mut self, spectral: SpectralConfig) -> Self {
        self.spectral = spectral;
        self
    }

    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache.directory = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;
        self.emd.validate()?;
        self.spectral.validate(self.window.sample_rate_hz)?;
        self.classifier.validate()?;
        Ok(())
    }
}

/// Windowing and signal derivation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Length of one window in seconds
    pub window_seconds: u32,
    /// Uniform rate derived signals are resampled to
    pub sample_rate_hz: f64,
    /// Raw samples a window must contain to be analysed
    pub min_samples_per_window: usize,
    /// Width of the centered moving average applied to EDA
    pub eda_smoothing_width: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_seconds: 60,
            sample_rate_hz: 1.0,
            min_samples_per_window: 60,
            eda_smoothing_width: 3,
        }
    }
}

impl WindowConfig {
    /// Points in each resampled derived signal
    pub fn samples_per_window(&self) -> usize {
        (self.window_seconds as f64 * self.sample_rate_hz).round() as usize
    }

    pub fn window_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.window_seconds as i64)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_seconds == 0 {
            return Err(Error::InvalidParameter("window_seconds must be positive".into()));
        }
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "sample_rate_hz must be positive, got {}",
                self.sample_rate_hz
            )));
        }
        if self.min_samples_per_window < 2 {
            return Err(Error::InvalidParameter(
                "min_samples_per_window must be at least 2".into(),
            ));
        }
        if self.samples_per_window() < 4 {
            return Err(Error::InvalidParameter(format!(
                "window of {}s at {} Hz yields fewer than 4 resampled points",
                self.window_seconds, self.sample_rate_hz
            )));
        }
        if self.eda_smoothing_width == 0 {
            return Err(Error::InvalidParameter("eda_smoothing_width must be at least 1".into()));
        }
        Ok(())
    }
}

/// Ensemble empirical mode decomposition parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmdConfig {
    /// Number of noise-assisted trials averaged per signal
    pub ensemble_size: usize,
    /// Injected noise std relative to the signal std
    pub noise_width: f64,
    /// Upper bound on extracted IMFs
    pub max_imfs: usize,
    /// Upper bound on sifting passes per IMF
    pub max_sift_iterations: usize,
    /// Cauchy-type SD threshold ending a sift
    pub sift_tolerance: f64,
    /// Stop once residual energy falls below this fraction of the input energy
    pub energy_ratio_threshold: f64,
    /// Shortest signal accepted for decomposition
    pub min_signal_len: usize,
    /// Base seed mixed with each signal fingerprint
    pub seed: u64,
    /// Run ensemble trials on the rayon pool
    pub parallel_trials: bool,
}

impl Default for EmdConfig {
    fn default() -> Self {
        Self {
            ensemble_size: 50,
            noise_width: 0.05,
            max_imfs: 8,
            max_sift_iterations: 50,
            sift_tolerance: 0.2,
            energy_ratio_threshold: 1e-4,
            min_signal_len: 16,
            seed: 42,
            parallel_trials: true,
        }
    }
}

impl EmdConfig {
    /// Single-pass EMD without injected noise
    pub fn plain() -> Self {
        Self {
            ensemble_size: 1,
            noise_width: 0.0,
            ..Self::default()
        }
    }

    /// Bytes binding cached results to the parameters that shape them
    pub fn cache_salt(&self) -> Vec<u8> {
        format!(
            "ensemble={};noise={:e};max_imfs={};max_sift={};tol={:e};energy={:e};seed={}",
            self.ensemble_size,
            self.noise_width,
            self.max_imfs,
            self.max_sift_iterations,
            self.sift_tolerance,
            self.energy_ratio_threshold,
            self.seed
        )
        .into_bytes()
    }

    pub fn validate(&self) -> Result<()> {
        if self.ensemble_size == 0 {
            return Err(Error::InvalidParameter("ensemble_size must be at least 1".into()));
        }
        if !(self.noise_width.is_finite() && self.noise_width >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "noise_width must be finite and non-negative, got {}",
                self.noise_width
            )));
        }
        if self.max_imfs == 0 || self.max_sift_iterations == 0 {
            return Err(Error::InvalidParameter(
                "max_imfs and max_sift_iterations must be positive".into(),
            ));
        }
        if !(self.sift_tolerance > 0.0 && self.energy_ratio_threshold >= 0.0) {
            return Err(Error::InvalidParameter("sift thresholds must be positive".into()));
        }
        if self.min_signal_len < 4 {
            return Err(Error::InvalidParameter("min_signal_len must be at least 4".into()));
        }
        Ok(())
    }
}

/// Closed frequency interval in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl Band {
    pub const fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }

    pub fn contains(&self, freq_hz: f64) -> bool {
        freq_hz >= self.low_hz && freq_hz <= self.high_hz
    }
}

/// How band power is measured from a set of components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BandPowerMethod {
    /// Instantaneous energy of each IMF binned by its instantaneous frequency
    #[default]
    HilbertMarginal,
    /// Hann-windowed periodogram of the IMF sum, integrated over the band
    Welch,
}

/// Spectral band layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    pub low_band: Band,
    pub high_band: Band,
    pub method: BandPowerMethod,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            low_band: Band::new(0.04, 0.15),
            high_band: Band::new(0.15, 0.40),
            method: BandPowerMethod::HilbertMarginal,
        }
    }
}

impl SpectralConfig {
    pub fn validate(&self, sample_rate_hz: f64) -> Result<()> {
        let nyquist = sample_rate_hz / 2.0;
        for (name, band) in [("low_band", self.low_band), ("high_band", self.high_band)] {
            if !(band.low_hz >= 0.0 && band.low_hz < band.high_hz && band.high_hz <= nyquist) {
                return Err(Error::InvalidParameter(format!(
                    "{name} [{}, {}] must be increasing and within [0, {nyquist}] Hz",
                    band.low_hz, band.high_hz
                )));
            }
        }
        Ok(())
    }
}

/// Statistic used to reduce calibration features into a baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BaselineStatistic {
    #[default]
    Median,
    Mean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CalibrationConfig {
    pub statistic: BaselineStatistic,
}

/// Margin a feature must clear over its baseline to count as exceeding it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Margin {
    /// `value > reference * (1 + r)`
    Relative(f64),
    /// `value > reference + a`
    Absolute(f64),
}

impl Default for Margin {
    fn default() -> Self {
        Margin::Relative(0.05)
    }
}

/// Inclusive numeric range for synthesized oxygen values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OxygenRange {
    pub min: f64,
    pub max: f64,
}

impl OxygenRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Stress-level-specific oxygen ranges
///
/// The oxygen value is a presentation heuristic layered over the real
/// classification; these ranges are policy, not physiology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OxygenPolicy {
    pub no_stress: OxygenRange,
    pub mild_stress: OxygenRange,
    pub high_stress: OxygenRange,
}

impl Default for OxygenPolicy {
    fn default() -> Self {
        Self {
            no_stress: OxygenRange::new(98.0, 100.0),
            mild_stress: OxygenRange::new(96.0, 98.0),
            high_stress: OxygenRange::new(94.0, 96.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClassifierConfig {
    pub margin: Margin,
    pub oxygen: OxygenPolicy,
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<()> {
        let m = match self.margin {
            Margin::Relative(r) => r,
            Margin::Absolute(a) => a,
        };
        if !(m.is_finite() && m >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "margin must be finite and non-negative, got {m}"
            )));
        }
        for range in [self.oxygen.no_stress, self.oxygen.mild_stress, self.oxygen.high_stress] {
            if !(range.min.is_finite() && range.max.is_finite() && range.min <= range.max) {
                return Err(Error::InvalidParameter(format!(
                    "oxygen range [{}, {}] is invalid",
                    range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

/// Where decompositions are persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory for the on-disk cache; `None` keeps results in memory only
    pub directory: Option<PathBuf>,
}
