//! Session baseline from the calibration windows

use stress_core::utils::{mean, median};
use stress_core::{
    Baseline, BaselineStatistic, CalibrationConfig, Error, FeatureVector, Result,
    CALIBRATION_WINDOWS,
};
use tracing::debug;

/// Reduce calibration-window features to the session baseline
///
/// Windows with non-finite features are ignored. At least
/// [`CALIBRATION_WINDOWS`] valid windows are required; otherwise the session
/// cannot be scored and `Error::InsufficientBaseline` is returned.
///
/// # Example
///
/// ```rust
/// use stress_classify::calibrate;
/// use stress_core::{CalibrationConfig, FeatureVector};
///
/// let windows = [
///     FeatureVector::new(1.0, 0.10),
///     FeatureVector::new(1.4, 0.12),
///     FeatureVector::new(0.9, 0.30),
/// ];
/// let baseline = calibrate(&windows, &CalibrationConfig::default()).unwrap();
/// assert_eq!(baseline.reference_ratio(), 1.0);
/// assert_eq!(baseline.reference_power(), 0.12);
/// ```
pub fn calibrate(features: &[FeatureVector], config: &CalibrationConfig) -> Result<Baseline> {
    let valid: Vec<&FeatureVector> = features.iter().filter(|f| f.is_finite()).collect();
    if valid.len() < CALIBRATION_WINDOWS {
        return Err(Error::InsufficientBaseline {
            required: CALIBRATION_WINDOWS,
            valid: valid.len(),
        });
    }

    let ratios: Vec<f64> = valid.iter().map(|f| f.ibi_lf_hf_ratio).collect();
    let powers: Vec<f64> = valid.iter().map(|f| f.scl_lf_power).collect();
    let reduce = |values: &[f64]| match config.statistic {
        BaselineStatistic::Median => median(values),
        BaselineStatistic::Mean => Some(mean(values)),
    };

    match (reduce(&ratios), reduce(&powers)) {
        (Some(ratio), Some(power)) if ratio.is_finite() && power.is_finite() => {
            debug!(
                ratio,
                power,
                windows = valid.len(),
                statistic = ?config.statistic,
                "baseline calibrated"
            );
            Ok(Baseline::new(ratio, power))
        }
        _ => Err(Error::InsufficientBaseline {
            required: CALIBRATION_WINDOWS,
            valid: 0,
        }),
    }
}
