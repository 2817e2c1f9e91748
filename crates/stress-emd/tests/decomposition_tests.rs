//! Behavioural tests for the decomposition engine

use proptest::prelude::*;
use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Duration;
use stress_cache::{DecompositionCache, MemoryCache};
use stress_core::{Deadline, EmdConfig, Error};
use stress_emd::EmdEngine;

fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let ma = a.iter().sum::<f64>() / n;
    let mb = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b) {
        cov += (x - ma) * (y - mb);
        va += (x - ma) * (x - ma);
        vb += (y - mb) * (y - mb);
    }
    cov / (va.sqrt() * vb.sqrt())
}

#[test]
fn test_first_imf_tracks_fast_component() {
    let n = 400;
    let fast: Vec<f64> = (0..n).map(|t| (2.0 * PI * 0.1 * t as f64).sin()).collect();
    let slow: Vec<f64> = (0..n).map(|t| 2.0 * (2.0 * PI * 0.01 * t as f64).sin()).collect();
    let signal: Vec<f64> = fast.iter().zip(&slow).map(|(a, b)| a + b).collect();

    let engine = EmdEngine::uncached(EmdConfig::plain()).unwrap();
    let d = engine.decompose(&signal, &Deadline::none()).unwrap();

    assert!(d.imf_count() >= 2, "expected at least two IMFs, got {}", d.imf_count());
    let r = correlation(&d.imfs[0], &fast);
    assert!(r > 0.8, "first IMF correlation with fast tone was {r}");
}

#[test]
fn test_ensemble_decomposition_is_deterministic_without_cache() {
    let signal: Vec<f64> = (0..180)
        .map(|t| {
            let t = t as f64;
            0.8 + 0.02 * (2.0 * PI * 0.3 * t).sin() + 0.05 * (2.0 * PI * 0.08 * t).sin()
        })
        .collect();
    let config = EmdConfig {
        ensemble_size: 8,
        ..EmdConfig::default()
    };

    let a = EmdEngine::uncached(config.clone()).unwrap();
    let b = EmdEngine::uncached(config).unwrap();
    assert_eq!(
        *a.decompose(&signal, &Deadline::none()).unwrap(),
        *b.decompose(&signal, &Deadline::none()).unwrap()
    );
}

#[test]
fn test_timeout_leaves_no_cache_entry() {
    let cache = Arc::new(MemoryCache::new());
    let engine = EmdEngine::new(EmdConfig::default(), cache.clone()).unwrap();
    let signal: Vec<f64> = (0..240).map(|t| (t as f64 * 0.4).sin()).collect();

    let err = engine
        .decompose(&signal, &Deadline::after(Duration::ZERO))
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
    assert!(cache.get(&engine.cache_key(&signal)).is_none());

    // A later request without a deadline computes and stores normally
    engine.decompose(&signal, &Deadline::none()).unwrap();
    assert!(cache.contains(&engine.cache_key(&signal)));
}

#[test]
fn test_engines_sharing_a_cache_reuse_results() {
    let cache: Arc<dyn DecompositionCache> = Arc::new(MemoryCache::new());
    let signal: Vec<f64> = (0..90).map(|t| (t as f64 * 0.3).cos()).collect();

    let first = EmdEngine::new(EmdConfig::plain(), Arc::clone(&cache)).unwrap();
    first.decompose(&signal, &Deadline::none()).unwrap();

    let second = EmdEngine::new(EmdConfig::plain(), cache).unwrap();
    second.decompose(&signal, &Deadline::none()).unwrap();
    assert_eq!(second.cache_stats().hits, 1);
    assert_eq!(second.cache_stats().misses, 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_reconstruction_matches_input(
        signal in prop::collection::vec(-50.0f64..50.0, 16..128),
    ) {
        let engine = EmdEngine::uncached(EmdConfig::plain()).unwrap();
        let d = engine.decompose(&signal, &Deadline::none()).unwrap();
        prop_assert_eq!(d.signal_len(), signal.len());
        prop_assert!(d.imfs.iter().all(|imf| imf.len() == signal.len()));
        for (r, s) in d.reconstruct().iter().zip(&signal) {
            prop_assert!((r - s).abs() < 1e-6);
        }
    }
}
