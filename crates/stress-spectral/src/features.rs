//! Per-window feature extraction

use crate::band_power::band_power;
use stress_core::{BandPower, Decomposition, Error, FeatureVector, Result, SpectralConfig};
use tracing::debug;

/// Ratio reported when LF power is present but HF power is not
pub const RATIO_SENTINEL: f64 = 1e6;

/// Band power at or below this is treated as zero
pub const ZERO_POWER_EPS: f64 = 1e-12;

/// LF/HF ratio with a defined value for vanishing HF power
///
/// * `hf > ZERO_POWER_EPS`: `lf / hf`
/// * otherwise, `RATIO_SENTINEL` if `lf > ZERO_POWER_EPS`
/// * otherwise (no power at all): `0.0`
///
/// Never divides by zero and never returns NaN for finite inputs.
pub fn lf_hf_ratio(power: BandPower) -> f64 {
    if power.high > ZERO_POWER_EPS {
        power.low / power.high
    } else if power.low > ZERO_POWER_EPS {
        RATIO_SENTINEL
    } else {
        0.0
    }
}

/// Extracts window features from IBI and EDA decompositions
pub struct FeatureExtractor {
    config: SpectralConfig,
    sample_rate: f64,
}

impl FeatureExtractor {
    pub fn new(config: SpectralConfig, sample_rate: f64) -> Result<Self> {
        config.validate(sample_rate)?;
        Ok(Self {
            config,
            sample_rate,
        })
    }

    pub fn config(&self) -> &SpectralConfig {
        &self.config
    }

    /// LF/HF power of the IBI components
    pub fn ibi_band_power(&self, ibi: &Decomposition) -> Result<BandPower> {
        band_power(
            &ibi.imfs,
            self.sample_rate,
            self.config.low_band,
            self.config.high_band,
            self.config.method,
        )
    }

    /// LF power of the EDA components
    pub fn eda_lf_power(&self, eda: &Decomposition) -> Result<f64> {
        band_power(
            &eda.imfs,
            self.sample_rate,
            self.config.low_band,
            self.config.high_band,
            self.config.method,
        )
        .map(|p| p.low)
    }

    /// Feature vector for one window
    ///
    /// A decomposition without any IMF has no oscillatory power and yields
    /// zeros. Non-finite results are reported as `Error::Decomposition`.
    pub fn extract(&self, ibi: &Decomposition, eda: &Decomposition) -> Result<FeatureVector> {
        let ibi_power = self.ibi_band_power(ibi)?;
        let scl_lf_power = self.eda_lf_power(eda)?;
        let features = FeatureVector::new(lf_hf_ratio(ibi_power), scl_lf_power);

        debug!(
            ibi_lf = ibi_power.low,
            ibi_hf = ibi_power.high,
            ratio = features.ibi_lf_hf_ratio,
            scl_lf = features.scl_lf_power,
            "extracted window features"
        );

        if !features.is_finite() {
            return Err(Error::Decomposition(format!(
                "non-finite features (ratio {}, scl power {})",
                features.ibi_lf_hf_ratio, features.scl_lf_power
            )));
        }
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;
    use stress_core::BandPowerMethod;

    fn tone(n: usize, cycles: f64, amplitude: f64) -> Vec<f64> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * cycles * i as f64 / n as f64).sin())
            .collect()
    }

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(SpectralConfig::default(), 1.0).unwrap()
    }

    #[test]
    fn test_ratio_guard() {
        assert_eq!(lf_hf_ratio(BandPower { low: 2.0, high: 0.5 }), 4.0);
        assert_eq!(lf_hf_ratio(BandPower { low: 2.0, high: 0.0 }), RATIO_SENTINEL);
        assert_eq!(lf_hf_ratio(BandPower { low: 0.0, high: 0.0 }), 0.0);
        assert_eq!(lf_hf_ratio(BandPower { low: 1e-15, high: 1e-14 }), 0.0);
    }

    #[test]
    fn test_zero_hf_power_gives_sentinel_not_error() {
        // IBI oscillates only at 0.1 Hz: nothing in HF
        let ibi = Decomposition::new(vec![tone(60, 6.0, 0.05)], vec![0.8; 60]);
        let eda = Decomposition::new(vec![tone(60, 6.0, 0.2)], vec![0.0; 60]);
        let features = extractor().extract(&ibi, &eda).unwrap();
        assert_eq!(features.ibi_lf_hf_ratio, RATIO_SENTINEL);
        assert_relative_eq!(features.scl_lf_power, 0.02, epsilon = 1e-9);
    }

    #[test]
    fn test_ratio_from_two_components() {
        // 0.3 Hz amplitude 1 (HF 0.5), 0.1 Hz amplitude 2 (LF 2.0)
        let ibi = Decomposition::new(vec![tone(60, 18.0, 1.0), tone(60, 6.0, 2.0)], vec![0.0; 60]);
        let eda = Decomposition::new(vec![], vec![0.0; 60]);
        let features = extractor().extract(&ibi, &eda).unwrap();
        assert_relative_eq!(features.ibi_lf_hf_ratio, 4.0, epsilon = 1e-9);
        assert_eq!(features.scl_lf_power, 0.0);
    }

    #[test]
    fn test_welch_method_matches_band_placement() {
        let config = SpectralConfig {
            method: BandPowerMethod::Welch,
            ..SpectralConfig::default()
        };
        let extractor = FeatureExtractor::new(config, 1.0).unwrap();
        let ibi = Decomposition::new(vec![tone(60, 18.0, 1.0)], vec![0.0; 60]);
        let eda = Decomposition::new(vec![tone(60, 6.0, 1.0)], vec![0.0; 60]);
        let features = extractor.extract(&ibi, &eda).unwrap();
        assert!(features.ibi_lf_hf_ratio < 0.1);
        assert!(features.scl_lf_power > 0.0);
    }

    #[test]
    fn test_band_above_nyquist_rejected() {
        assert!(FeatureExtractor::new(SpectralConfig::default(), 0.5).is_err());
    }
}
