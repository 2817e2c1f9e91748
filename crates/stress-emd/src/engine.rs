//! Cache-aware decomposition engine

use crate::ensemble::eemd;
use std::sync::Arc;
use stress_cache::{CacheOutcome, CacheStats, ComputeOnce, DecompositionCache, NoCache};
use stress_core::utils::first_non_finite;
use stress_core::{Deadline, Decomposition, EmdConfig, Error, Fingerprint, Result};
use tracing::{debug, instrument};

/// Decomposes derived signals, consulting the injected cache first
///
/// Identical signals (same values, same parameters) are decomposed at most
/// once per cache lifetime. Invalid signals are rejected before the cache is
/// touched and are never retried.
pub struct EmdEngine {
    config: EmdConfig,
    salt: Vec<u8>,
    cache: ComputeOnce<Arc<dyn DecompositionCache>>,
}

impl EmdEngine {
    /// Create an engine over a shared cache backend
    pub fn new(config: EmdConfig, cache: Arc<dyn DecompositionCache>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            salt: config.cache_salt(),
            config,
            cache: ComputeOnce::new(cache),
        })
    }

    /// Engine that never stores results
    pub fn uncached(config: EmdConfig) -> Result<Self> {
        Self::new(config, Arc::new(NoCache))
    }

    pub fn config(&self) -> &EmdConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Key under which the decomposition of `signal` is cached
    pub fn cache_key(&self, signal: &[f64]) -> Fingerprint {
        Fingerprint::of_signal(signal).salted(&self.salt)
    }

    /// Decompose `signal` into IMFs and a residue
    ///
    /// # Errors
    ///
    /// * `Error::Decomposition` for signals shorter than `min_signal_len` or
    ///   containing NaN/infinite values
    /// * `Error::Timeout` when `deadline` expires mid-computation; nothing is
    ///   cached in that case
    #[instrument(skip(self, signal, deadline), fields(len = signal.len()))]
    pub fn decompose(&self, signal: &[f64], deadline: &Deadline) -> Result<Arc<Decomposition>> {
        self.validate(signal)?;

        let fingerprint = Fingerprint::of_signal(signal);
        let key = fingerprint.salted(&self.salt);
        let seed = self.config.seed ^ fingerprint.seed();

        let (decomposition, outcome) = self
            .cache
            .get_or_try_compute(&key, || eemd(signal, &self.config, seed, deadline))?;

        match outcome {
            CacheOutcome::Hit => debug!(%key, "decomposition served from cache"),
            CacheOutcome::Computed => debug!(
                %key,
                imfs = decomposition.imf_count(),
                "decomposition computed"
            ),
        }
        Ok(decomposition)
    }

    /// Decompose without consulting or populating the cache
    pub fn decompose_uncached(&self, signal: &[f64], deadline: &Deadline) -> Result<Decomposition> {
        self.validate(signal)?;
        let seed = self.config.seed ^ Fingerprint::of_signal(signal).seed();
        eemd(signal, &self.config, seed, deadline)
    }

    fn validate(&self, signal: &[f64]) -> Result<()> {
        if signal.len() < self.config.min_signal_len {
            return Err(Error::signal_too_short(self.config.min_signal_len, signal.len()));
        }
        if let Some(pos) = first_non_finite(signal) {
            return Err(Error::non_finite(&format!("signal (first at index {pos})")));
        }
        Ok(())
    }
}
