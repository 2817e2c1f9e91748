//! Window segmentation and derived-signal construction
//!
//! Samples are bucketed by acquisition time: bucket `k` holds every sample
//! with `floor((t - t0) / window) == k`, where `t0` is the earliest sample.
//! The first [`CALIBRATION_WINDOWS`] buckets calibrate the session; the
//! following buckets are analysis minutes 1, 2, ...

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use stress_core::{
    Error, RawSample, Result, WindowConfig, CALIBRATION_WINDOWS, MAX_ANALYSIS_MINUTES,
};
use tracing::debug;

/// What a window is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowRole {
    /// Calibration window `0..CALIBRATION_WINDOWS`
    Calibration(usize),
    /// Analysis window with its 1-based minute index
    Analysis(usize),
}

/// One contiguous, non-overlapping slice of the session
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub role: WindowRole,
    /// Start of the bucket, not of its first sample
    pub start: DateTime<Utc>,
    /// Samples in acquisition order
    pub samples: Vec<RawSample>,
}

impl Window {
    pub fn minute(&self) -> Option<usize> {
        match self.role {
            WindowRole::Analysis(m) => Some(m),
            WindowRole::Calibration(_) => None,
        }
    }
}

/// Calibration windows followed by the analysis windows of a request
#[derive(Debug, Clone, PartialEq)]
pub struct SessionWindows {
    pub calibration: Vec<Window>,
    pub analysis: Vec<Window>,
}

/// Uniformly resampled signals of one window
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSignals {
    /// Inter-beat interval in seconds (60 / HR)
    pub ibi: Vec<f64>,
    /// Smoothed, linearly detrended electrodermal activity
    pub eda: Vec<f64>,
}

/// Occupied buckets only; a stray timestamp far from the session costs one
/// entry, not one allocation per elapsed window.
struct Buckets {
    t0: DateTime<Utc>,
    buckets: BTreeMap<usize, Vec<RawSample>>,
    /// Samples beyond `limit` that were not kept
    dropped: usize,
}

/// Bucket samples by acquisition time, keeping buckets `0..limit` only
fn bucketize(samples: &[RawSample], config: &WindowConfig, limit: Option<usize>) -> Option<Buckets> {
    let mut sorted = samples.to_vec();
    sorted.sort_by_key(|s| s.timestamp);
    let t0 = sorted.first()?.timestamp;
    let window_ms = config.window_duration().num_milliseconds().max(1);

    let mut buckets: BTreeMap<usize, Vec<RawSample>> = BTreeMap::new();
    let mut dropped = 0;
    for sample in sorted {
        let elapsed = (sample.timestamp - t0).num_milliseconds();
        let k = usize::try_from(elapsed / window_ms).unwrap_or(usize::MAX);
        if limit.is_some_and(|limit| k >= limit) {
            dropped += 1;
            continue;
        }
        buckets.entry(k).or_default().push(sample);
    }
    Some(Buckets { t0, buckets, dropped })
}

fn bucket_start(t0: DateTime<Utc>, k: usize, config: &WindowConfig) -> Result<DateTime<Utc>> {
    i32::try_from(k)
        .ok()
        .and_then(|k| config.window_duration().checked_mul(k))
        .and_then(|offset| t0.checked_add_signed(offset))
        .ok_or_else(|| Error::InvalidInput(format!("window {k} starts out of the representable time range")))
}

fn require_bucket(buckets: &Buckets, k: usize, config: &WindowConfig) -> Result<Vec<RawSample>> {
    match buckets.buckets.get(&k) {
        Some(bucket) if bucket.len() >= config.min_samples_per_window => Ok(bucket.clone()),
        bucket => Err(Error::insufficient_data(
            config.min_samples_per_window,
            bucket.map_or(0, Vec::len),
        )),
    }
}

fn calibration_windows(buckets: &Buckets, config: &WindowConfig) -> Result<Vec<Window>> {
    (0..CALIBRATION_WINDOWS)
        .map(|k| {
            Ok(Window {
                role: WindowRole::Calibration(k),
                start: bucket_start(buckets.t0, k, config)?,
                samples: require_bucket(buckets, k, config)?,
            })
        })
        .collect()
}

/// Split samples into calibration windows plus `minutes` analysis windows
///
/// # Errors
///
/// * `Error::InvalidParameter` unless `1 <= minutes <= MAX_ANALYSIS_MINUTES`
/// * `Error::InsufficientData` when fewer than
///   `(CALIBRATION_WINDOWS + minutes) * min_samples_per_window` samples are
///   supplied, or when any window in the span is short
pub fn segment(samples: &[RawSample], minutes: usize, config: &WindowConfig) -> Result<SessionWindows> {
    if minutes == 0 || minutes > MAX_ANALYSIS_MINUTES {
        return Err(Error::InvalidParameter(format!(
            "minutes must be between 1 and {MAX_ANALYSIS_MINUTES}, got {minutes}"
        )));
    }
    let required = (CALIBRATION_WINDOWS + minutes) * config.min_samples_per_window;
    if samples.len() < required {
        return Err(Error::insufficient_data(required, samples.len()));
    }

    let buckets = bucketize(samples, config, Some(CALIBRATION_WINDOWS + minutes))
        .ok_or_else(|| Error::insufficient_data(required, 0))?;
    let calibration = calibration_windows(&buckets, config)?;
    let analysis = (1..=minutes)
        .map(|minute| {
            let k = CALIBRATION_WINDOWS + minute - 1;
            Ok(Window {
                role: WindowRole::Analysis(minute),
                start: bucket_start(buckets.t0, k, config)?,
                samples: require_bucket(&buckets, k, config)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        samples = samples.len(),
        minutes,
        ignored_samples = buckets.dropped,
        "segmented session"
    );
    Ok(SessionWindows {
        calibration,
        analysis,
    })
}

/// Calibration windows plus the most recent complete analysis window
///
/// The analysis window is the last bucket after calibration holding at least
/// `min_samples_per_window` samples; its minute index counts from the first
/// bucket after calibration, as in [`segment`].
pub fn latest_complete(samples: &[RawSample], config: &WindowConfig) -> Result<SessionWindows> {
    let required = (CALIBRATION_WINDOWS + 1) * config.min_samples_per_window;
    if samples.len() < required {
        return Err(Error::insufficient_data(required, samples.len()));
    }
    let buckets = bucketize(samples, config, None)
        .ok_or_else(|| Error::insufficient_data(required, 0))?;
    let calibration = calibration_windows(&buckets, config)?;

    let (k, latest) = buckets
        .buckets
        .range(CALIBRATION_WINDOWS..)
        .rev()
        .find(|(_, bucket)| bucket.len() >= config.min_samples_per_window)
        .ok_or_else(|| Error::insufficient_data(required, samples.len()))?;
    let k = *k;

    Ok(SessionWindows {
        calibration,
        analysis: vec![Window {
            role: WindowRole::Analysis(k + 1 - CALIBRATION_WINDOWS),
            start: bucket_start(buckets.t0, k, config)?,
            samples: latest.clone(),
        }],
    })
}

/// Build the uniformly sampled IBI and EDA signals of a window
///
/// Values are linearly interpolated onto `samples_per_window` points spaced
/// `1 / sample_rate_hz` apart from the window start, holding the first/last
/// value outside the sampled range. A zero heart rate produces an infinite
/// IBI, which the decomposition engine rejects.
pub fn derive(window: &Window, config: &WindowConfig) -> DerivedSignals {
    let n = config.samples_per_window();
    let times: Vec<f64> = window
        .samples
        .iter()
        .map(|s| (s.timestamp - window.start).num_milliseconds() as f64 / 1000.0)
        .collect();
    let grid: Vec<f64> = (0..n).map(|j| j as f64 / config.sample_rate_hz).collect();

    let ibi_raw: Vec<f64> = window.samples.iter().map(|s| 60.0 / s.heart_rate).collect();
    let eda_raw: Vec<f64> = window
        .samples
        .iter()
        .map(|s| s.electrodermal_activity)
        .collect();

    let ibi = resample(&times, &ibi_raw, &grid);
    let eda = detrend(&moving_average(
        &resample(&times, &eda_raw, &grid),
        config.eda_smoothing_width,
    ));
    DerivedSignals { ibi, eda }
}

/// Piecewise-linear interpolation of `(xs, ys)` at `grid`
///
/// `xs` must be non-decreasing. Duplicate abscissae keep the later value.
pub fn resample(xs: &[f64], ys: &[f64], grid: &[f64]) -> Vec<f64> {
    if xs.is_empty() {
        return vec![f64::NAN; grid.len()];
    }
    let last = xs.len() - 1;
    let mut j = 0;
    grid.iter()
        .map(|&g| {
            if g <= xs[0] {
                return ys[0];
            }
            if g >= xs[last] {
                return ys[last];
            }
            while j + 1 < last && xs[j + 1] <= g {
                j += 1;
            }
            let (x0, x1) = (xs[j], xs[j + 1]);
            if x1 <= x0 {
                return ys[j + 1];
            }
            let w = (g - x0) / (x1 - x0);
            ys[j] + w * (ys[j + 1] - ys[j])
        })
        .collect()
}

/// Centered moving average; the window shrinks at the edges
pub fn moving_average(x: &[f64], width: usize) -> Vec<f64> {
    if width <= 1 {
        return x.to_vec();
    }
    let half = width / 2;
    (0..x.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + width - half).min(x.len());
            x[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
        })
        .collect()
}

/// Subtract the least-squares line
pub fn detrend(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let nf = n as f64;
    let t_mean = (nf - 1.0) / 2.0;
    let x_mean = x.iter().sum::<f64>() / nf;
    let mut cov = 0.0;
    let mut var = 0.0;
    for (i, v) in x.iter().enumerate() {
        let dt = i as f64 - t_mean;
        cov += dt * (v - x_mean);
        var += dt * dt;
    }
    let slope = cov / var;
    x.iter()
        .enumerate()
        .map(|(i, v)| v - (x_mean + slope * (i as f64 - t_mean)))
        .collect()
}
