//! Common types flowing through the analysis pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One acquisition tick from the telemetry source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Acquisition time
    pub timestamp: DateTime<Utc>,
    /// Heart rate in beats per minute
    pub heart_rate: f64,
    /// Electrodermal activity in microsiemens
    pub electrodermal_activity: f64,
}

impl RawSample {
    pub fn new(timestamp: DateTime<Utc>, heart_rate: f64, electrodermal_activity: f64) -> Self {
        Self {
            timestamp,
            heart_rate,
            electrodermal_activity,
        }
    }
}

/// Oscillatory components of one derived signal
///
/// `imfs` are ordered from highest to lowest frequency; `residue` is what
/// remains after the last extraction (trend). The number of IMFs is data
/// dependent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub imfs: Vec<Vec<f64>>,
    pub residue: Vec<f64>,
}

impl Decomposition {
    pub fn new(imfs: Vec<Vec<f64>>, residue: Vec<f64>) -> Self {
        Self { imfs, residue }
    }

    /// Number of intrinsic mode functions (the residue is not counted)
    pub fn imf_count(&self) -> usize {
        self.imfs.len()
    }

    /// Length of the decomposed signal
    pub fn signal_len(&self) -> usize {
        self.residue.len()
    }

    /// Sum of all IMFs, excluding the residue
    pub fn oscillatory_sum(&self) -> Vec<f64> {
        let mut sum = vec![0.0; self.signal_len()];
        for imf in &self.imfs {
            for (s, v) in sum.iter_mut().zip(imf) {
                *s += v;
            }
        }
        sum
    }

    /// Sum of all IMFs plus the residue
    pub fn reconstruct(&self) -> Vec<f64> {
        let mut sum = self.oscillatory_sum();
        for (s, r) in sum.iter_mut().zip(&self.residue) {
            *s += r;
        }
        sum
    }
}

/// Low/high frequency power aggregated over one signal's components
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BandPower {
    pub low: f64,
    pub high: f64,
}

/// Per-window scalar features used for calibration and classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// IBI low/high frequency power ratio
    pub ibi_lf_hf_ratio: f64,
    /// Skin conductance low frequency power
    pub scl_lf_power: f64,
}

impl FeatureVector {
    pub fn new(ibi_lf_hf_ratio: f64, scl_lf_power: f64) -> Self {
        Self {
            ibi_lf_hf_ratio,
            scl_lf_power,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.ibi_lf_hf_ratio.is_finite() && self.scl_lf_power.is_finite()
    }
}

/// Session reference thresholds derived from the calibration period
///
/// Fields are private: a baseline is produced once by the calibrator and only
/// read afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    reference_ratio: f64,
    reference_power: f64,
}

impl Baseline {
    pub fn new(reference_ratio: f64, reference_power: f64) -> Self {
        Self {
            reference_ratio,
            reference_power,
        }
    }

    pub fn reference_ratio(&self) -> f64 {
        self.reference_ratio
    }

    pub fn reference_power(&self) -> f64 {
        self.reference_power
    }
}

/// Discrete stress classification of one minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StressLevel {
    #[serde(rename = "No Stress")]
    None,
    #[serde(rename = "Mild Stress")]
    Mild,
    #[serde(rename = "High Stress")]
    High,
}

impl StressLevel {
    pub const ALL: [StressLevel; 3] = [StressLevel::None, StressLevel::Mild, StressLevel::High];

    /// Numeric label: 0 = none, 1 = mild, 2 = high
    pub fn numeric_label(self) -> u8 {
        match self {
            StressLevel::None => 0,
            StressLevel::Mild => 1,
            StressLevel::High => 2,
        }
    }

    pub fn from_numeric_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(StressLevel::None),
            1 => Some(StressLevel::Mild),
            2 => Some(StressLevel::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StressLevel::None => "No Stress",
            StressLevel::Mild => "Mild Stress",
            StressLevel::High => "High Stress",
        }
    }

    /// Mild and high both count towards the stressed-minute total
    pub fn is_stressed(self) -> bool {
        self != StressLevel::None
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification output for one analysis minute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuteResult {
    /// 1-based minute index over the analysis span
    pub minute: usize,
    pub stress_level: StressLevel,
    pub numeric_label: u8,
    /// Synthesized SpO2 estimate (presentation heuristic, not measured)
    pub oxygen_level: f64,
    pub ibi_lf_hf_ratio: f64,
    pub scl_lf_power: f64,
}

impl MinuteResult {
    pub fn new(minute: usize, level: StressLevel, oxygen_level: f64, features: FeatureVector) -> Self {
        Self {
            minute,
            stress_level: level,
            numeric_label: level.numeric_label(),
            oxygen_level,
            ibi_lf_hf_ratio: features.ibi_lf_hf_ratio,
            scl_lf_power: features.scl_lf_power,
        }
    }
}

/// A minute that could not be decomposed or classified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFailure {
    pub minute: usize,
    pub reason: String,
}

/// Output of one analysis session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Successful minutes, ordered by minute index
    pub results: Vec<MinuteResult>,
    /// `"{stressed_minutes}/{total_minutes}"`
    pub stress_score: String,
    pub total_minutes: usize,
    pub stressed_minutes: usize,
    pub oxygen_levels: Vec<f64>,
    /// Minutes excluded from the score, with the reason
    #[serde(default)]
    pub failed_windows: Vec<WindowFailure>,
}

impl SessionResult {
    /// Assemble a session from per-minute results, sorting them by minute
    pub fn from_minutes(mut results: Vec<MinuteResult>, mut failed_windows: Vec<WindowFailure>) -> Self {
        results.sort_by_key(|r| r.minute);
        failed_windows.sort_by_key(|f| f.minute);

        let score = SessionScore::from_results(&results);
        let oxygen_levels = results.iter().map(|r| r.oxygen_level).collect();

        Self {
            stress_score: score.to_string(),
            results,
            total_minutes: score.total,
            stressed_minutes: score.stressed,
            oxygen_levels,
            failed_windows,
        }
    }

    pub fn score(&self) -> SessionScore {
        SessionScore {
            stressed: self.stressed_minutes,
            total: self.total_minutes,
        }
    }
}

/// Stressed minutes (mild or high) over the minutes analysed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionScore {
    pub stressed: usize,
    pub total: usize,
}

impl SessionScore {
    pub fn from_results(results: &[MinuteResult]) -> Self {
        Self {
            stressed: results
                .iter()
                .filter(|r| r.stress_level.is_stressed())
                .count(),
            total: results.len(),
        }
    }

    pub fn unstressed(&self) -> usize {
        self.total - self.stressed
    }
}

impl fmt::Display for SessionScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.stressed, self.total)
    }
}
