//! Compute-once coordination in front of a decomposition store
//!
//! Concurrent analysis windows can ask for the same fingerprint at the same
//! time (identical minutes, repeated requests). `ComputeOnce` guarantees at
//! most one in-flight computation per fingerprint:
//!
//! 1. **Lookup**: a hit in the backing store returns immediately.
//! 2. **Claim**: on a miss the caller registers the fingerprint as in flight
//!    and re-checks the store (another thread may have just published).
//! 3. **Wait**: callers finding the fingerprint already in flight block on a
//!    condition variable until the owner finishes, then loop back to lookup.
//! 4. **Publish**: the owner stores the result, releases the claim and wakes
//!    all waiters.
//!
//! A failed computation releases its claim without storing anything, so an
//! aborted or rejected decomposition never leaves a partial entry behind;
//! waiters then retry and surface their own error.
//!
//! Lock ordering is trivial: only `in_flight` is ever locked here, and never
//! while calling into the backing store or the computation.

use crate::store::DecompositionCache;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use stress_core::{Decomposition, Error, Fingerprint, Result};
use tracing::{debug, warn};

/// Whether a value came from the store or was computed by this call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Computed,
}

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Lookups served by the backing store
    pub hits: usize,
    /// Computations performed
    pub misses: usize,
    /// Times a caller blocked on another caller's computation
    pub waits: usize,
    /// Results that could not be written to the backing store
    pub store_failures: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

/// Per-fingerprint at-most-one-in-flight wrapper around a cache backend
pub struct ComputeOnce<C: DecompositionCache> {
    store: C,
    in_flight: Mutex<HashSet<Fingerprint>>,
    completed: Condvar,
    hits: AtomicUsize,
    misses: AtomicUsize,
    waits: AtomicUsize,
    store_failures: AtomicUsize,
}

/// Releases an in-flight claim on every exit path, including unwinding
struct Claim<'a, C: DecompositionCache> {
    owner: &'a ComputeOnce<C>,
    fingerprint: Fingerprint,
}

impl<C: DecompositionCache> Drop for Claim<'_, C> {
    fn drop(&mut self) {
        let mut in_flight = self.owner.lock_in_flight();
        in_flight.remove(&self.fingerprint);
        drop(in_flight);
        self.owner.completed.notify_all();
    }
}

impl<C: DecompositionCache> ComputeOnce<C> {
    pub fn new(store: C) -> Self {
        Self {
            store,
            in_flight: Mutex::new(HashSet::new()),
            completed: Condvar::new(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            waits: AtomicUsize::new(0),
            store_failures: AtomicUsize::new(0),
        }
    }

    /// The wrapped backend
    pub fn store(&self) -> &C {
        &self.store
    }

    // A poisoned set still holds valid fingerprints; keep going with it.
    fn lock_in_flight(&self) -> MutexGuard<'_, HashSet<Fingerprint>> {
        self.in_flight.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Return the stored decomposition for `fingerprint`, computing and
    /// storing it if absent
    ///
    /// `compute` runs outside every lock and at most once per call. Errors
    /// from `compute` are returned unchanged and leave the store untouched.
    /// Failure to write the result to the store is logged and counted but not
    /// returned: the caller still gets its value.
    pub fn get_or_try_compute<F>(
        &self,
        fingerprint: &Fingerprint,
        compute: F,
    ) -> Result<(Arc<Decomposition>, CacheOutcome)>
    where
        F: FnOnce() -> Result<Decomposition>,
    {
        let claim = loop {
            if let Some(found) = self.store.get(fingerprint) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok((found, CacheOutcome::Hit));
            }

            let mut in_flight = self.lock_in_flight();
            if in_flight.contains(fingerprint) {
                self.waits.fetch_add(1, Ordering::Relaxed);
                debug!(%fingerprint, "waiting for in-flight decomposition");
                while in_flight.contains(fingerprint) {
                    in_flight = self
                        .completed
                        .wait(in_flight)
                        .unwrap_or_else(|p| p.into_inner());
                }
                continue;
            }
            in_flight.insert(*fingerprint);
            drop(in_flight);

            let claim = Claim {
                owner: self,
                fingerprint: *fingerprint,
            };
            // Someone may have published between our miss and our claim
            if let Some(found) = self.store.get(fingerprint) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok((found, CacheOutcome::Hit));
            }
            break claim;
        };

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = Arc::new(compute()?);
        if !is_finite(&value) {
            return Err(Error::Decomposition(
                "decomposition produced non-finite components".into(),
            ));
        }

        if let Err(e) = self.store.put(fingerprint, Arc::clone(&value)) {
            self.store_failures.fetch_add(1, Ordering::Relaxed);
            warn!(
                %fingerprint,
                backend = self.store.backend_name(),
                error = %e,
                "failed to persist decomposition"
            );
        }
        drop(claim);
        Ok((value, CacheOutcome::Computed))
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        CacheStats {
            hits,
            misses,
            waits: self.waits.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64
            } else {
                0.0
            },
        }
    }
}

fn is_finite(d: &Decomposition) -> bool {
    d.imfs
        .iter()
        .chain(std::iter::once(&d.residue))
        .all(|c| c.iter().all(|v| v.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCache;
    use crate::store::NoCache;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    fn decomposition(v: f64) -> Decomposition {
        Decomposition::new(vec![vec![v, -v]], vec![0.0, 0.0])
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = ComputeOnce::new(MemoryCache::new());
        let fp = Fingerprint::of_signal(&[1.0]);

        let (first, outcome) = cache.get_or_try_compute(&fp, || Ok(decomposition(1.0))).unwrap();
        assert_eq!(outcome, CacheOutcome::Computed);

        let (second, outcome) = cache
            .get_or_try_compute(&fp, || panic!("must not recompute"))
            .unwrap();
        assert_eq!(outcome, CacheOutcome::Hit);
        assert_eq!(first, second);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_failed_compute_leaves_no_entry() {
        let cache = ComputeOnce::new(MemoryCache::new());
        let fp = Fingerprint::of_signal(&[2.0]);

        let err = cache
            .get_or_try_compute(&fp, || Err(Error::Decomposition("too short".into())))
            .unwrap_err();
        assert!(matches!(err, Error::Decomposition(_)));
        assert!(cache.store().is_empty());

        // Claim was released: a later request computes normally
        let (_, outcome) = cache.get_or_try_compute(&fp, || Ok(decomposition(2.0))).unwrap();
        assert_eq!(outcome, CacheOutcome::Computed);
    }

    #[test]
    fn test_non_finite_result_is_rejected() {
        let cache = ComputeOnce::new(MemoryCache::new());
        let fp = Fingerprint::of_signal(&[3.0]);
        let err = cache
            .get_or_try_compute(&fp, || Ok(decomposition(f64::NAN)))
            .unwrap_err();
        assert!(matches!(err, Error::Decomposition(_)));
        assert!(cache.store().is_empty());
    }

    #[test]
    fn test_concurrent_misses_compute_once() {
        let cache = Arc::new(ComputeOnce::new(MemoryCache::new()));
        let fp = Fingerprint::of_signal(&[4.0, 5.0]);
        let computations = Arc::new(AtomicUsize::new(0));
        let n_threads = 8;
        let barrier = Arc::new(Barrier::new(n_threads));

        let handles: Vec<_> = (0..n_threads)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let computations = Arc::clone(&computations);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_try_compute(&fp, || {
                            computations.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(50));
                            Ok(decomposition(4.0))
                        })
                        .unwrap()
                        .0
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(computations.load(Ordering::SeqCst), 1);
        for r in &results {
            assert_eq!(**r, decomposition(4.0));
        }
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_no_cache_backend_recomputes_sequential_requests() {
        let cache = ComputeOnce::new(NoCache);
        let fp = Fingerprint::of_signal(&[6.0]);
        let (_, a) = cache.get_or_try_compute(&fp, || Ok(decomposition(6.0))).unwrap();
        let (_, b) = cache.get_or_try_compute(&fp, || Ok(decomposition(6.0))).unwrap();
        assert_eq!(a, CacheOutcome::Computed);
        assert_eq!(b, CacheOutcome::Computed);
        assert_eq!(cache.stats().misses, 2);
    }
}
