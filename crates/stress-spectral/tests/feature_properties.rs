//! Property tests for spectral features

use proptest::prelude::*;
use stress_core::{BandPower, BandPowerMethod, Decomposition, SpectralConfig};
use stress_spectral::{lf_hf_ratio, FeatureExtractor, RATIO_SENTINEL};

fn component(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-5.0f64..5.0, len)
}

proptest! {
    #[test]
    fn prop_ratio_is_finite_and_non_negative(low in 0.0f64..1e3, high in 0.0f64..1e3) {
        let ratio = lf_hf_ratio(BandPower { low, high });
        prop_assert!(ratio.is_finite());
        prop_assert!(ratio >= 0.0);
        prop_assert!(ratio <= RATIO_SENTINEL || high > 0.0);
    }

    #[test]
    fn prop_features_are_finite_for_finite_components(
        ibi in prop::collection::vec(component(60), 0..4),
        eda in prop::collection::vec(component(60), 0..4),
        welch in any::<bool>(),
    ) {
        let config = SpectralConfig {
            method: if welch { BandPowerMethod::Welch } else { BandPowerMethod::HilbertMarginal },
            ..SpectralConfig::default()
        };
        let extractor = FeatureExtractor::new(config, 1.0).unwrap();
        let features = extractor
            .extract(
                &Decomposition::new(ibi, vec![0.0; 60]),
                &Decomposition::new(eda, vec![0.0; 60]),
            )
            .unwrap();
        prop_assert!(features.is_finite());
        prop_assert!(features.ibi_lf_hf_ratio >= 0.0);
        prop_assert!(features.scl_lf_power >= 0.0);
    }

    #[test]
    fn prop_scaling_components_keeps_ratio(
        ibi in prop::collection::vec(component(60), 1..3),
        k in 0.5f64..4.0,
    ) {
        let extractor = FeatureExtractor::new(SpectralConfig::default(), 1.0).unwrap();
        let eda = Decomposition::new(vec![], vec![0.0; 60]);
        let base = extractor.ibi_band_power(&Decomposition::new(ibi.clone(), vec![0.0; 60])).unwrap();
        prop_assume!(base.high > 1e-6 && base.low > 1e-6);

        let scaled: Vec<Vec<f64>> = ibi.iter().map(|c| c.iter().map(|v| v * k).collect()).collect();
        let a = extractor.extract(&Decomposition::new(ibi, vec![0.0; 60]), &eda).unwrap();
        let b = extractor.extract(&Decomposition::new(scaled, vec![0.0; 60]), &eda).unwrap();
        prop_assert!((a.ibi_lf_hf_ratio - b.ibi_lf_hf_ratio).abs() <= 1e-6 * a.ibi_lf_hf_ratio.max(1.0));
    }
}
