//! FFT-based analytic signal
//!
//! The analytic signal z(t) = x(t) + j·H[x](t) keeps only the non-negative
//! frequencies of x. Its magnitude is the instantaneous amplitude and the
//! derivative of its unwrapped phase is the instantaneous frequency.
//!
//! In the frequency domain the construction is a per-bin gain:
//! - DC (k = 0): 1
//! - positive frequencies (0 < k < N/2): 2
//! - Nyquist (k = N/2, even N only): 1
//! - negative frequencies: 0

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;
use stress_core::{Error, Result};

/// Analytic-signal processor for one signal length
///
/// FFT plans and the spectral gain are built once and reused, so keep one
/// instance per window length.
pub struct HilbertTransform {
    length: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    gain: Vec<f64>,
}

impl HilbertTransform {
    pub fn new(length: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(length);
        let inverse = planner.plan_fft_inverse(length);

        let gain = (0..length)
            .map(|k| {
                if k == 0 || (length % 2 == 0 && k == length / 2) {
                    1.0
                } else if k < length.div_ceil(2) {
                    2.0
                } else {
                    0.0
                }
            })
            .collect();

        Self {
            length,
            forward,
            inverse,
            gain,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    fn check_length(&self, signal: &[f64]) -> Result<()> {
        if signal.len() != self.length {
            return Err(Error::InvalidInput(format!(
                "signal length mismatch: expected {}, got {}",
                self.length,
                signal.len()
            )));
        }
        if self.length < 2 {
            return Err(Error::InvalidInput(format!(
                "signal too short for analysis: {} samples",
                self.length
            )));
        }
        Ok(())
    }

    /// Complex analytic signal of a real input
    pub fn analytic(&self, signal: &[f64]) -> Result<Vec<Complex<f64>>> {
        self.check_length(signal)?;

        let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
        self.forward.process(&mut buffer);
        for (bin, g) in buffer.iter_mut().zip(&self.gain) {
            *bin *= *g;
        }
        self.inverse.process(&mut buffer);

        // rustfft leaves the inverse unnormalised
        let norm = 1.0 / self.length as f64;
        Ok(buffer.into_iter().map(|c| c * norm).collect())
    }

    /// Instantaneous amplitude |z(t)|
    pub fn envelope(&self, signal: &[f64]) -> Result<Vec<f64>> {
        Ok(self.analytic(signal)?.iter().map(|z| z.norm()).collect())
    }

    /// Instantaneous frequency in Hz from the unwrapped phase
    pub fn instantaneous_frequency(&self, signal: &[f64], sample_rate: f64) -> Result<Vec<f64>> {
        let analytic = self.analytic(signal)?;
        Ok(frequency_from_analytic(&analytic, sample_rate))
    }
}

/// Instantaneous frequency (Hz) of an analytic signal
///
/// Central differences of the unwrapped phase in the interior, one-sided
/// differences at both ends.
pub fn frequency_from_analytic(analytic: &[Complex<f64>], sample_rate: f64) -> Vec<f64> {
    let phase: Vec<f64> = analytic.iter().map(|z| z.arg()).collect();
    let phase = unwrap_phase(&phase);
    let n = phase.len();
    if n < 2 {
        return vec![0.0; n];
    }

    let scale = sample_rate / (2.0 * PI);
    let mut freq = Vec::with_capacity(n);
    freq.push((phase[1] - phase[0]) * scale);
    for i in 1..n - 1 {
        freq.push((phase[i + 1] - phase[i - 1]) * scale / 2.0);
    }
    freq.push((phase[n - 1] - phase[n - 2]) * scale);
    freq
}

/// Remove 2π jumps from a wrapped phase sequence
pub fn unwrap_phase(phase: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(phase.len());
    let mut offset = 0.0;
    for (i, &p) in phase.iter().enumerate() {
        if i > 0 {
            let diff = p - phase[i - 1];
            if diff > PI {
                offset -= 2.0 * PI;
            } else if diff < -PI {
                offset += 2.0 * PI;
            }
        }
        out.push(p + offset);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn cosine(n: usize, cycles: f64) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * cycles * i as f64 / n as f64).cos())
            .collect()
    }

    #[test]
    fn test_real_part_is_the_input() {
        let signal = cosine(64, 5.0);
        let z = HilbertTransform::new(64).analytic(&signal).unwrap();
        for (zi, xi) in z.iter().zip(&signal) {
            assert_abs_diff_eq!(zi.re, *xi, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_cosine_quadrature_is_sine() {
        let n = 128;
        let signal = cosine(n, 8.0);
        let z = HilbertTransform::new(n).analytic(&signal).unwrap();
        for (i, zi) in z.iter().enumerate() {
            let expected = (2.0 * PI * 8.0 * i as f64 / n as f64).sin();
            assert_abs_diff_eq!(zi.im, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_odd_length_envelope_is_flat() {
        let n = 99;
        let signal: Vec<f64> = (0..n)
            .map(|i| 3.0 * (2.0 * PI * 9.0 * i as f64 / n as f64).sin())
            .collect();
        let env = HilbertTransform::new(n).envelope(&signal).unwrap();
        for e in env {
            assert_abs_diff_eq!(e, 3.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_instantaneous_frequency_of_tone() {
        let n = 240;
        let fs = 2.0;
        // 24 whole cycles over 120 s: 0.2 Hz
        let signal = cosine(n, 24.0);
        let freq = HilbertTransform::new(n)
            .instantaneous_frequency(&signal, fs)
            .unwrap();
        for f in &freq {
            assert_abs_diff_eq!(*f, 0.2, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_length_mismatch() {
        let transform = HilbertTransform::new(16);
        assert!(matches!(
            transform.analytic(&[0.0; 8]),
            Err(Error::InvalidInput(_))
        ));
        assert!(HilbertTransform::new(1).analytic(&[1.0]).is_err());
    }

    #[test]
    fn test_unwrap_phase_removes_jumps() {
        let wrapped = [3.0, -3.0, -2.5];
        let unwrapped = unwrap_phase(&wrapped);
        assert_abs_diff_eq!(unwrapped[1], -3.0 + 2.0 * PI, epsilon = 1e-12);
        assert_abs_diff_eq!(unwrapped[2] - unwrapped[1], 0.5, epsilon = 1e-12);
        assert!(unwrap_phase(&[]).is_empty());
    }
}
