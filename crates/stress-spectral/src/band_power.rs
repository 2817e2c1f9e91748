//! Band power over a set of IMFs
//!
//! Two estimators share one entry point, [`band_power`]:
//!
//! * **Hilbert marginal** (default): each IMF's instantaneous power
//!   `|z(t)|² / 2` is attributed to whichever band contains its instantaneous
//!   frequency at time t; band power is the time average summed over IMFs. A
//!   pure tone of amplitude A inside a band therefore contributes `A² / 2`,
//!   its variance.
//! * **Welch**: one Hann-windowed periodogram over the whole window of the
//!   IMF sum (constant detrend, density scaling, one-sided), integrated with
//!   the trapezoid rule over the bins inside each band.

use crate::analytic::{frequency_from_analytic, HilbertTransform};
use num_complex::Complex;
use rustfft::FftPlanner;
use std::f64::consts::PI;
use stress_core::{Band, BandPower, BandPowerMethod, Result};

/// Low/high band power of the given components
pub fn band_power(
    imfs: &[Vec<f64>],
    sample_rate: f64,
    low: Band,
    high: Band,
    method: BandPowerMethod,
) -> Result<BandPower> {
    match method {
        BandPowerMethod::HilbertMarginal => hilbert_marginal(imfs, sample_rate, &[low, high])
            .map(|p| BandPower { low: p[0], high: p[1] }),
        BandPowerMethod::Welch => {
            let Some(n) = imfs.first().map(Vec::len) else {
                return Ok(BandPower::default());
            };
            let mut sum = vec![0.0; n];
            for imf in imfs {
                for (s, v) in sum.iter_mut().zip(imf) {
                    *s += v;
                }
            }
            let psd = periodogram(&sum, sample_rate);
            Ok(BandPower {
                low: psd.integrate(low),
                high: psd.integrate(high),
            })
        }
    }
}

/// Hilbert marginal power of `imfs` in each of `bands`
///
/// Samples whose frequency falls in several (touching) bands count towards the
/// first one listed.
pub fn hilbert_marginal(imfs: &[Vec<f64>], sample_rate: f64, bands: &[Band]) -> Result<Vec<f64>> {
    let mut power = vec![0.0; bands.len()];
    let Some(n) = imfs.first().map(Vec::len) else {
        return Ok(power);
    };
    let transform = HilbertTransform::new(n);

    for imf in imfs {
        let z = transform.analytic(imf)?;
        let freq = frequency_from_analytic(&z, sample_rate);
        for (zt, ft) in z.iter().zip(&freq) {
            if let Some(b) = bands.iter().position(|band| band.contains(*ft)) {
                power[b] += 0.5 * zt.norm_sqr();
            }
        }
    }
    for p in &mut power {
        *p /= n as f64;
    }
    Ok(power)
}

/// One-sided power spectral density
#[derive(Debug, Clone)]
pub struct Periodogram {
    pub frequencies: Vec<f64>,
    pub density: Vec<f64>,
}

impl Periodogram {
    /// Trapezoid integral over bins with `band.low_hz <= f <= band.high_hz`
    pub fn integrate(&self, band: Band) -> f64 {
        let inside: Vec<(f64, f64)> = self
            .frequencies
            .iter()
            .zip(&self.density)
            .filter(|(f, _)| band.contains(**f))
            .map(|(f, p)| (*f, *p))
            .collect();
        inside
            .windows(2)
            .map(|w| 0.5 * (w[0].1 + w[1].1) * (w[1].0 - w[0].0))
            .sum()
    }
}

/// Hann-windowed periodogram of a single full-length segment
pub fn periodogram(signal: &[f64], sample_rate: f64) -> Periodogram {
    let n = signal.len();
    if n < 2 {
        return Periodogram {
            frequencies: Vec::new(),
            density: Vec::new(),
        };
    }

    // Periodic Hann window
    let window: Vec<f64> = (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect();
    let mean = signal.iter().sum::<f64>() / n as f64;
    let mut buffer: Vec<Complex<f64>> = signal
        .iter()
        .zip(&window)
        .map(|(x, w)| Complex::new((x - mean) * w, 0.0))
        .collect();
    FftPlanner::<f64>::new()
        .plan_fft_forward(n)
        .process(&mut buffer);

    let scale = 1.0 / (sample_rate * window.iter().map(|w| w * w).sum::<f64>());
    let bins = n / 2 + 1;
    let mut density: Vec<f64> = buffer[..bins].iter().map(|c| c.norm_sqr() * scale).collect();
    let last_doubled = if n % 2 == 0 { bins - 1 } else { bins };
    for p in &mut density[1..last_doubled] {
        *p *= 2.0;
    }
    let frequencies = (0..bins).map(|k| k as f64 * sample_rate / n as f64).collect();

    Periodogram {
        frequencies,
        density,
    }
}
