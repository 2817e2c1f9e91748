//! Sifting and single-pass empirical mode decomposition

use crate::extrema::find_extrema;
use crate::spline::envelope;
use stress_core::utils::energy;
use stress_core::{Deadline, Decomposition, EmdConfig, Result};

/// Residual extrema below which the residual is treated as a trend
const MIN_RESIDUAL_EXTREMA: usize = 3;

/// Outcome of sifting one IMF
#[derive(Debug, Clone)]
pub struct SiftOutcome {
    pub imf: Vec<f64>,
    pub iterations: usize,
    /// Last Cauchy SD value seen
    pub sd: f64,
}

/// Extract one intrinsic mode function from `residual`
///
/// Each pass subtracts the mean of the upper and lower spline envelopes.
/// Sifting stops when the Cauchy SD between passes
/// `Σ (h_prev - h)² / Σ h_prev²` drops below `tolerance`, when `max_iterations`
/// passes have run, or when the candidate no longer has both maxima and
/// minima.
pub fn sift(
    residual: &[f64],
    tolerance: f64,
    max_iterations: usize,
    deadline: &Deadline,
) -> Result<SiftOutcome> {
    let n = residual.len();
    let mut h = residual.to_vec();
    let mut iterations = 0;
    let mut sd = f64::INFINITY;

    while iterations < max_iterations {
        deadline.check()?;

        let extrema = find_extrema(&h);
        let (upper, lower) = match (
            envelope(&h, &extrema.maxima),
            envelope(&h, &extrema.minima),
        ) {
            (Some(u), Some(l)) => (u, l),
            _ => break,
        };

        let mut change = 0.0;
        let mut scale = 0.0;
        for i in 0..n {
            let mean = 0.5 * (upper[i] + lower[i]);
            scale += h[i] * h[i];
            change += mean * mean;
            h[i] -= mean;
        }
        iterations += 1;

        sd = if scale > 0.0 { change / scale } else { 0.0 };
        if sd < tolerance {
            break;
        }
    }

    Ok(SiftOutcome { imf: h, iterations, sd })
}

/// Plain EMD: repeatedly sift IMFs off the residual
///
/// Extraction stops after `max_imfs` components, when the residual energy
/// falls below `energy_ratio_threshold` times the input energy, or when the
/// residual is (nearly) monotonic. The residue is exactly `signal - Σ imfs`
/// up to floating point rounding.
pub fn emd(signal: &[f64], config: &EmdConfig, deadline: &Deadline) -> Result<Decomposition> {
    let total_energy = energy(signal);
    let mut residue = signal.to_vec();
    let mut imfs = Vec::new();

    while imfs.len() < config.max_imfs {
        deadline.check()?;

        if total_energy == 0.0 || energy(&residue) < config.energy_ratio_threshold * total_energy {
            break;
        }
        let extrema = find_extrema(&residue);
        if extrema.count() < MIN_RESIDUAL_EXTREMA || !extrema.can_envelope() {
            break;
        }

        let outcome = sift(
            &residue,
            config.sift_tolerance,
            config.max_sift_iterations,
            deadline,
        )?;
        for (r, v) in residue.iter_mut().zip(&outcome.imf) {
            *r -= v;
        }
        imfs.push(outcome.imf);
    }

    Ok(Decomposition::new(imfs, residue))
}
