//! Noise-assisted ensemble EMD
//!
//! Each trial decomposes the signal plus an independent white-noise
//! realisation; IMFs of equal index are averaged across trials. Scales a trial
//! did not produce contribute zero to the average. The averaged residue is
//! `signal - Σ imfs`, so reconstruction recovers the input rather than the
//! input plus averaged noise.
//!
//! Noise is drawn up front from one `ChaCha8Rng` stream, in trial order, so
//! the result depends only on the signal, the configuration and the seed,
//! never on how trials are scheduled across threads.

use crate::sift::emd;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use stress_core::utils::std_dev;
use stress_core::{Deadline, Decomposition, EmdConfig, Error, Result};
use tracing::debug;

/// Decompose `signal` with the ensemble described by `config`
///
/// `seed` should already mix the configured seed with the signal fingerprint.
pub fn eemd(
    signal: &[f64],
    config: &EmdConfig,
    seed: u64,
    deadline: &Deadline,
) -> Result<Decomposition> {
    let sigma = config.noise_width * std_dev(signal);
    if config.ensemble_size <= 1 || sigma == 0.0 {
        return emd(signal, config, deadline);
    }

    let normal = Normal::new(0.0, sigma)
        .map_err(|e| Error::InvalidParameter(format!("noise distribution: {e}")))?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let noisy: Vec<Vec<f64>> = (0..config.ensemble_size)
        .map(|_| signal.iter().map(|&x| x + normal.sample(&mut rng)).collect())
        .collect();

    // Inside a pool worker, a blocked join could steal a window waiting on
    // this signal's cache claim, so nested ensembles run inline.
    let parallel = config.parallel_trials && rayon::current_thread_index().is_none();
    debug!(
        trials = config.ensemble_size,
        sigma,
        parallel,
        "running ensemble decomposition"
    );

    let trials: Vec<Decomposition> = if parallel {
        noisy
            .par_iter()
            .map(|trial| emd(trial, config, deadline))
            .collect::<Result<_>>()?
    } else {
        noisy
            .iter()
            .map(|trial| emd(trial, config, deadline))
            .collect::<Result<_>>()?
    };

    Ok(average(signal, &trials))
}

/// Per-scale mean of trial IMFs, in trial order
fn average(signal: &[f64], trials: &[Decomposition]) -> Decomposition {
    let n = signal.len();
    let scales = trials.iter().map(|d| d.imf_count()).max().unwrap_or(0);
    let weight = 1.0 / trials.len() as f64;

    let mut imfs = vec![vec![0.0; n]; scales];
    for trial in trials {
        for (acc, imf) in imfs.iter_mut().zip(&trial.imfs) {
            for (a, v) in acc.iter_mut().zip(imf) {
                *a += v * weight;
            }
        }
    }

    let mut residue = signal.to_vec();
    for imf in &imfs {
        for (r, v) in residue.iter_mut().zip(imf) {
            *r -= v;
        }
    }
    Decomposition::new(imfs, residue)
}
