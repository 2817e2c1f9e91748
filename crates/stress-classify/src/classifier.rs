//! Threshold classification against the session baseline

use crate::oxygen::OxygenSynthesizer;
use stress_core::{Baseline, ClassifierConfig, Error, FeatureVector, Margin, Result, StressLevel};

/// Whether `value` clears `reference` by the configured margin
pub fn exceeds(value: f64, reference: f64, margin: Margin) -> bool {
    match margin {
        Margin::Relative(r) => value > reference * (1.0 + r),
        Margin::Absolute(a) => value > reference + a,
    }
}

/// Classify one window
///
/// Both features above baseline is high stress, exactly one is mild, neither
/// is no stress. Pure: the same inputs always give the same level.
///
/// # Errors
///
/// `Error::Classification` when either feature is NaN or infinite.
pub fn classify(features: &FeatureVector, baseline: &Baseline, margin: Margin) -> Result<StressLevel> {
    if !features.is_finite() {
        return Err(Error::Classification(format!(
            "non-finite features: ratio {}, scl power {}",
            features.ibi_lf_hf_ratio, features.scl_lf_power
        )));
    }

    let ratio_high = exceeds(features.ibi_lf_hf_ratio, baseline.reference_ratio(), margin);
    let power_high = exceeds(features.scl_lf_power, baseline.reference_power(), margin);
    Ok(match (ratio_high, power_high) {
        (true, true) => StressLevel::High,
        (true, false) | (false, true) => StressLevel::Mild,
        (false, false) => StressLevel::None,
    })
}

/// Classification settings bound together for a session
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    margin: Margin,
    oxygen: OxygenSynthesizer,
}

impl Classifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            margin: config.margin,
            oxygen: OxygenSynthesizer::new(config.oxygen.clone()),
        }
    }

    pub fn margin(&self) -> Margin {
        self.margin
    }

    pub fn oxygen(&self) -> &OxygenSynthesizer {
        &self.oxygen
    }

    pub fn classify(&self, features: &FeatureVector, baseline: &Baseline) -> Result<StressLevel> {
        classify(features, baseline, self.margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> Baseline {
        Baseline::new(1.0, 0.1)
    }

    #[test]
    fn test_ratio_only_is_mild() {
        let level = classify(&FeatureVector::new(3.0, 0.1), &baseline(), Margin::default()).unwrap();
        assert_eq!(level, StressLevel::Mild);
        assert_eq!(level.numeric_label(), 1);
    }

    #[test]
    fn test_both_is_high_neither_is_none() {
        let m = Margin::default();
        assert_eq!(
            classify(&FeatureVector::new(3.0, 0.5), &baseline(), m).unwrap(),
            StressLevel::High
        );
        assert_eq!(
            classify(&FeatureVector::new(0.5, 0.05), &baseline(), m).unwrap(),
            StressLevel::None
        );
        assert_eq!(
            classify(&FeatureVector::new(1.0, 0.3), &baseline(), m).unwrap(),
            StressLevel::Mild
        );
    }

    #[test]
    fn test_margin_boundaries() {
        // 1.05 is not strictly above 1.0 * 1.05
        assert!(!exceeds(1.05, 1.0, Margin::Relative(0.05)));
        assert!(exceeds(1.06, 1.0, Margin::Relative(0.05)));
        assert!(!exceeds(1.1, 1.0, Margin::Absolute(0.1)));
        assert!(exceeds(1.2, 1.0, Margin::Absolute(0.1)));
        assert!(exceeds(1.0 + 1e-12, 1.0, Margin::Relative(0.0)));
    }

    #[test]
    fn test_classifier_uses_configured_margin() {
        let config = ClassifierConfig {
            margin: Margin::Absolute(5.0),
            ..ClassifierConfig::default()
        };
        let classifier = Classifier::new(&config);
        let f = FeatureVector::new(3.0, 0.5);
        assert_eq!(classifier.classify(&f, &baseline()).unwrap(), StressLevel::None);
        assert_eq!(
            Classifier::default().classify(&f, &baseline()).unwrap(),
            StressLevel::High
        );
    }

    #[test]
    fn test_non_finite_features_rejected() {
        let err = classify(&FeatureVector::new(f64::NAN, 0.1), &baseline(), Margin::default())
            .unwrap_err();
        assert!(matches!(err, Error::Classification(_)));
        let err = classify(
            &FeatureVector::new(1.0, f64::INFINITY),
            &baseline(),
            Margin::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Classification(_)));
    }
}
