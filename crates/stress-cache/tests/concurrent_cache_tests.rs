//! Concurrency and persistence tests for the decomposition cache
//!
//! These tests hammer the same fingerprints from the rayon pool and check
//! that entries are never corrupted and computations are never duplicated.

use proptest::prelude::*;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stress_cache::{CacheOutcome, ComputeOnce, DecompositionCache, FileCache, MemoryCache};
use stress_core::{CacheConfig, Decomposition, Fingerprint};

fn scratch_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "stress-cache-it-{label}-{}-{:?}",
        std::process::id(),
        std::thread::current().id()
    ))
}

fn decomposition_for(seed: f64, len: usize) -> Decomposition {
    let imf: Vec<f64> = (0..len).map(|i| (seed + i as f64).sin()).collect();
    let residue: Vec<f64> = (0..len).map(|i| seed * 0.01 * i as f64).collect();
    Decomposition::new(vec![imf], residue)
}

#[test]
fn test_parallel_requests_share_one_computation_per_key() {
    let cache = ComputeOnce::new(MemoryCache::new());
    let computations = AtomicUsize::new(0);
    let keys: Vec<Fingerprint> = (0..4).map(|k| Fingerprint::of_signal(&[k as f64])).collect();

    let outcomes: Vec<CacheOutcome> = (0..64)
        .into_par_iter()
        .map(|i| {
            let key = keys[i % keys.len()];
            let (value, outcome) = cache
                .get_or_try_compute(&key, || {
                    computations.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(std::time::Duration::from_millis(5));
                    Ok(decomposition_for((i % keys.len()) as f64, 32))
                })
                .unwrap();
            assert_eq!(*value, decomposition_for((i % keys.len()) as f64, 32));
            outcome
        })
        .collect();

    assert_eq!(computations.load(Ordering::SeqCst), keys.len());
    assert_eq!(
        outcomes.iter().filter(|o| **o == CacheOutcome::Computed).count(),
        keys.len()
    );
    assert_eq!(cache.store().len(), keys.len());
}

#[test]
fn test_concurrent_file_writes_of_same_key_stay_readable() {
    let dir = scratch_dir("same-key");
    let cache = FileCache::open(&dir).unwrap();
    let fp = Fingerprint::of_signal(&[9.0, 8.0, 7.0]);
    let value = Arc::new(decomposition_for(3.0, 256));

    (0..32).into_par_iter().for_each(|_| {
        cache.put(&fp, Arc::clone(&value)).unwrap();
        let read = cache.get(&fp).expect("entry must always be complete");
        assert_eq!(*read, *value);
    });

    assert_eq!(cache.len().unwrap(), 1);
    let leftovers: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temporary files left behind");

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_compute_once_over_file_backend_survives_restart() {
    let dir = scratch_dir("restart");
    let fp = Fingerprint::of_signal(&[0.5; 60]);

    {
        let cache = ComputeOnce::new(FileCache::open(&dir).unwrap());
        let (_, outcome) = cache
            .get_or_try_compute(&fp, || Ok(decomposition_for(1.0, 60)))
            .unwrap();
        assert_eq!(outcome, CacheOutcome::Computed);
    }

    let cache = ComputeOnce::new(FileCache::open(&dir).unwrap());
    let (value, outcome) = cache
        .get_or_try_compute(&fp, || panic!("entry should have been persisted"))
        .unwrap();
    assert_eq!(outcome, CacheOutcome::Hit);
    assert_eq!(*value, decomposition_for(1.0, 60));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_from_config_selects_backend() {
    let memory = stress_cache::from_config(&CacheConfig::default()).unwrap();
    assert_eq!(memory.backend_name(), "memory");

    let dir = scratch_dir("config");
    let file = stress_cache::from_config(&CacheConfig {
        directory: Some(dir.clone()),
    })
    .unwrap();
    assert_eq!(file.backend_name(), "file");
    std::fs::remove_dir_all(dir).unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_memory_cache_roundtrip(
        signal in prop::collection::vec(-100.0f64..100.0, 1..32),
        imfs in prop::collection::vec(prop::collection::vec(-10.0f64..10.0, 8), 0..4),
        residue in prop::collection::vec(-10.0f64..10.0, 8),
    ) {
        let cache = MemoryCache::new();
        let fp = Fingerprint::of_signal(&signal);
        let d = Decomposition::new(imfs, residue);
        cache.put(&fp, Arc::new(d.clone())).unwrap();
        prop_assert_eq!(&*cache.get(&fp).unwrap(), &d);
    }

    #[test]
    fn prop_file_cache_roundtrip(
        signal in prop::collection::vec(-100.0f64..100.0, 1..32),
        imfs in prop::collection::vec(prop::collection::vec(-1e6f64..1e6, 8), 0..4),
        residue in prop::collection::vec(-1e6f64..1e6, 8),
    ) {
        let dir = scratch_dir("prop");
        let cache = FileCache::open(&dir).unwrap();
        let fp = Fingerprint::of_signal(&signal);
        let d = Decomposition::new(imfs, residue);
        cache.put(&fp, Arc::new(d.clone())).unwrap();
        let read = cache.get(&fp).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
        prop_assert_eq!(&*read, &d);
    }
}
