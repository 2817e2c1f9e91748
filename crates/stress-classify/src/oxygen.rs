//! Oxygen saturation synthesis
//!
//! The telemetry carries no SpO2 channel. The reported oxygen value is drawn
//! uniformly from a stress-level-specific range so the dashboard has something
//! plausible to chart. It is a presentation heuristic layered over the real
//! classification and must not be read as a measurement.

use rand::{Rng, RngCore};
use stress_core::{OxygenPolicy, OxygenRange, StressLevel};

/// Draws oxygen values according to an [`OxygenPolicy`]
#[derive(Debug, Clone, Default)]
pub struct OxygenSynthesizer {
    policy: OxygenPolicy,
}

impl OxygenSynthesizer {
    pub fn new(policy: OxygenPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &OxygenPolicy {
        &self.policy
    }

    pub fn range_for(&self, level: StressLevel) -> OxygenRange {
        match level {
            StressLevel::None => self.policy.no_stress,
            StressLevel::Mild => self.policy.mild_stress,
            StressLevel::High => self.policy.high_stress,
        }
    }

    /// Uniform draw from the level's range, rounded to two decimals
    pub fn sample(&self, level: StressLevel, rng: &mut dyn RngCore) -> f64 {
        let range = self.range_for(level);
        let raw = rng.gen_range(range.min..=range.max);
        ((raw * 100.0).round() / 100.0).clamp(range.min, range.max)
    }
}
