//! Baseline calibration and stress classification
//!
//! The first minutes of a session establish what "calm" looks like for this
//! wearer; every later minute is compared against that baseline:
//!
//! | IBI LF/HF above baseline | SCL LF power above baseline | Level |
//! |---|---|---|
//! | yes | yes | High Stress (2) |
//! | yes | no | Mild Stress (1) |
//! | no | yes | Mild Stress (1) |
//! | no | no | No Stress (0) |

pub mod calibrator;
pub mod classifier;
pub mod oxygen;

pub use calibrator::calibrate;
pub use classifier::{classify, exceeds, Classifier};
pub use oxygen::OxygenSynthesizer;
