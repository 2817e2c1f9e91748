//! Synthetic telemetry for demos and tests
//!
//! Generates 1 Hz heart rate and EDA with a slow baseline rhythm, randomly
//! placed stress episodes (raised, oscillating heart rate with a correlated
//! EDA rise) and Gaussian measurement noise. The same seed always produces the
//! same samples.

use crate::source::{FetchRequest, TelemetrySource};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;
use stress_core::{Error, RawSample, Result};

const SAMPLES_PER_MINUTE: usize = 60;
const HR_RANGE: (f64, f64) = (60.0, 105.0);
const EDA_RANGE: (f64, f64) = (1.0, 12.0);

/// Deterministic synthetic telemetry generator
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seed: u64,
    start: DateTime<Utc>,
    /// Stress episodes placed per minute of generated data
    episodes_per_minute: f64,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self {
            seed: 42,
            start: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            episodes_per_minute: 2.0,
        }
    }
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self::default().with_seed(seed)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    /// Episode density; zero gives a calm session
    pub fn with_episodes_per_minute(mut self, rate: f64) -> Self {
        self.episodes_per_minute = rate.max(0.0);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate `minutes` minutes of 1 Hz samples
    pub fn generate(&self, minutes: usize) -> Result<Vec<RawSample>> {
        let total = minutes * SAMPLES_PER_MINUTE;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut stress = vec![0.0; total];
        if total > 0 {
            let episodes = (minutes as f64 * self.episodes_per_minute).round() as usize;
            for _ in 0..episodes {
                let begin = rng.gen_range(0..total);
                let length = rng.gen_range(60..180);
                let intensity = rng.gen_range(0.3..0.8);
                let end = (begin + length).min(total);
                for (offset, s) in stress[begin..end].iter_mut().enumerate() {
                    *s = intensity * (15.0 + 10.0 * (2.0 * PI * offset as f64 / 30.0).sin());
                }
            }
        }

        let hr_noise = Normal::new(0.0, 2.0).map_err(|e| Error::Source(e.to_string()))?;
        let eda_noise = Normal::new(0.0, 0.3).map_err(|e| Error::Source(e.to_string()))?;

        Ok((0..total)
            .map(|i| {
                let t = i as f64;
                let hr = 70.0 + 5.0 * (2.0 * PI * t / 2000.0).sin() + stress[i] + hr_noise.sample(&mut rng);
                let eda = 4.0 + (2.0 * PI * t / 1500.0).sin() + 0.5 * stress[i] + eda_noise.sample(&mut rng);
                RawSample::new(
                    self.start + Duration::seconds(i as i64),
                    hr.clamp(HR_RANGE.0, HR_RANGE.1),
                    eda.clamp(EDA_RANGE.0, EDA_RANGE.1),
                )
            })
            .collect())
    }
}

impl TelemetrySource for SyntheticSource {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<RawSample>> {
        self.generate(request.minutes)
    }

    fn describe(&self) -> String {
        format!("synthetic(seed={})", self.seed)
    }
}
