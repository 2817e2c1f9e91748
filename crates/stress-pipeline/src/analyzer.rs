//! End-to-end session analysis
//!
//! One request runs these stages:
//!
//! 1. **Fetch**: resolve the source identifier and pull raw samples
//! 2. **Segment**: bucket samples into calibration and analysis windows
//! 3. **Calibrate**: decompose and featurize the calibration windows, reduce
//!    them to a [`Baseline`]
//! 4. **Classify**: decompose, featurize and classify the analysis windows
//!    on the rayon pool
//! 5. **Assemble**: sort by minute, draw oxygen values in minute order and
//!    build the [`SessionResult`]
//!
//! Decomposition and classification failures are window-local: the minute
//! is reported in `failed_windows` and left out of the score. Anything else
//! (no data, no baseline, timeout) fails the whole request.

use crate::source::{FetchRequest, SourceRouter, TelemetrySource};
use crate::windowing::{derive, latest_complete, segment, SessionWindows, Window};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stress_cache::{CacheStats, DecompositionCache};
use stress_classify::{calibrate, Classifier};
use stress_core::{
    AnalysisConfig, Baseline, Deadline, Error, FeatureVector, MinuteResult, RawSample, Result,
    SessionContext, SessionResult, StressLevel, WindowFailure, CALIBRATION_WINDOWS,
    MAX_ANALYSIS_MINUTES,
};
use stress_emd::EmdEngine;
use stress_spectral::FeatureExtractor;
use tracing::{debug, info, instrument, warn};

/// Classified analysis window before oxygen synthesis
struct Classified {
    minute: usize,
    level: StressLevel,
    features: FeatureVector,
}

/// Stress analysis service
///
/// Cheap to share behind an `Arc`; concurrent requests share the
/// decomposition cache.
pub struct Analyzer {
    config: AnalysisConfig,
    engine: EmdEngine,
    extractor: FeatureExtractor,
    classifier: Classifier,
    router: SourceRouter,
    oxygen_rng: Mutex<Box<dyn RngCore + Send>>,
    timeout: Option<Duration>,
}

impl Analyzer {
    /// Build an analyzer over an injected cache backend
    pub fn new(config: AnalysisConfig, cache: Arc<dyn DecompositionCache>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: EmdEngine::new(config.emd.clone(), cache)?,
            extractor: FeatureExtractor::new(config.spectral.clone(), config.window.sample_rate_hz)?,
            classifier: Classifier::new(&config.classifier),
            router: SourceRouter::new(),
            oxygen_rng: Mutex::new(Box::new(StdRng::from_entropy())),
            timeout: config.timeout(),
            config,
        })
    }

    /// Build an analyzer whose cache is described by `config.cache`
    pub fn from_config(config: AnalysisConfig) -> Result<Self> {
        let cache = stress_cache::from_config(&config.cache)?;
        Self::new(config, cache)
    }

    pub fn with_router(mut self, router: SourceRouter) -> Self {
        self.router = router;
        self
    }

    /// Random source for oxygen synthesis
    pub fn with_oxygen_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.oxygen_rng = Mutex::new(Box::new(rng));
        self
    }

    /// Per-request time limit, overriding `config.timeout_ms`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn engine(&self) -> &EmdEngine {
        &self.engine
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.engine.cache_stats()
    }

    fn new_context(&self) -> SessionContext {
        SessionContext::new(Deadline::from_option(self.timeout))
    }

    /// Analyze `duration_minutes` minutes from the identified source
    ///
    /// The source must provide `CALIBRATION_WINDOWS + duration_minutes`
    /// minutes of data; the first minutes calibrate the session.
    #[instrument(skip(self))]
    pub fn analyze(&self, duration_minutes: usize, source_identifier: &str) -> Result<SessionResult> {
        check_minutes(duration_minutes)?;
        let source = self.router.resolve(source_identifier)?;
        self.analyze_source(source.as_ref(), duration_minutes)
    }

    /// Analyze `duration_minutes` minutes from an already constructed source
    pub fn analyze_source(
        &self,
        source: &dyn TelemetrySource,
        duration_minutes: usize,
    ) -> Result<SessionResult> {
        check_minutes(duration_minutes)?;
        let mut ctx = self.new_context();
        let request = FetchRequest {
            minutes: CALIBRATION_WINDOWS + duration_minutes,
        };
        let samples = ctx.time_stage("fetch", || source.fetch(&request))?;
        ctx.deadline.check()?;
        debug!(trace_id = %ctx.trace_id, source = %source.describe(), samples = samples.len(), "fetched telemetry");

        let windows = ctx.time_stage("segment", || {
            segment(&samples, duration_minutes, &self.config.window)
        })?;
        self.run_session(&mut ctx, windows)
    }

    /// Analyze samples already in memory
    #[instrument(skip(self, samples), fields(samples = samples.len()))]
    pub fn analyze_samples(&self, samples: &[RawSample], duration_minutes: usize) -> Result<SessionResult> {
        let mut ctx = self.new_context();
        let windows = ctx.time_stage("segment", || {
            segment(samples, duration_minutes, &self.config.window)
        })?;
        self.run_session(&mut ctx, windows)
    }

    /// Classify the most recent complete minute after calibration
    #[instrument(skip(self))]
    pub fn analyze_latest_minute(&self, source_identifier: &str) -> Result<MinuteResult> {
        let source = self.router.resolve(source_identifier)?;
        let mut ctx = self.new_context();
        let request = FetchRequest {
            minutes: CALIBRATION_WINDOWS + 1,
        };
        let deadline = ctx.deadline;
        let samples = ctx.time_stage("fetch", || source.fetch(&request))?;
        deadline.check()?;

        let windows = ctx.time_stage("segment", || latest_complete(&samples, &self.config.window))?;
        let baseline = ctx.time_stage("calibrate", || self.calibrate(&windows.calibration, &deadline))?;

        let window = windows
            .analysis
            .first()
            .ok_or_else(|| Error::insufficient_data(request.minutes, 0))?;
        let classified = self.classify_window(window, &baseline, &deadline)?;
        let mut rng = self.oxygen_rng.lock().unwrap_or_else(|p| p.into_inner());
        let oxygen = self
            .classifier
            .oxygen()
            .sample(classified.level, rng.as_mut());
        Ok(MinuteResult::new(
            classified.minute,
            classified.level,
            oxygen,
            classified.features,
        ))
    }

    fn run_session(&self, ctx: &mut SessionContext, windows: SessionWindows) -> Result<SessionResult> {
        let deadline = ctx.deadline;
        let baseline = ctx.time_stage("calibrate", || self.calibrate(&windows.calibration, &deadline))?;

        let outcomes: Vec<(usize, Result<Classified>)> = ctx.time_stage("classify", || {
            windows
                .analysis
                .par_iter()
                .map(|w| {
                    let minute = w.minute().unwrap_or_default();
                    (minute, self.classify_window(w, &baseline, &deadline))
                })
                .collect()
        });

        let mut classified = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (minute, outcome) in outcomes {
            match outcome {
                Ok(c) => classified.push(c),
                Err(e) if e.is_window_local() => {
                    warn!(trace_id = %ctx.trace_id, minute, error = %e, "window excluded from score");
                    failures.push(WindowFailure {
                        minute,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        classified.sort_by_key(|c| c.minute);

        let results: Vec<MinuteResult> = {
            let mut rng = self.oxygen_rng.lock().unwrap_or_else(|p| p.into_inner());
            classified
                .into_iter()
                .map(|c| {
                    let oxygen = self.classifier.oxygen().sample(c.level, rng.as_mut());
                    MinuteResult::new(c.minute, c.level, oxygen, c.features)
                })
                .collect()
        };

        let session = SessionResult::from_minutes(results, failures);
        info!(
            trace_id = %ctx.trace_id,
            score = %session.stress_score,
            failed = session.failed_windows.len(),
            elapsed_ms = ctx.elapsed().as_millis() as u64,
            "session analysed"
        );
        debug!(trace_id = %ctx.trace_id, stages = ?ctx.stage_timings(), "stage timings");
        Ok(session)
    }

    fn calibrate(&self, windows: &[Window], deadline: &Deadline) -> Result<Baseline> {
        let outcomes: Vec<Result<FeatureVector>> = windows
            .par_iter()
            .map(|w| self.window_features(w, deadline))
            .collect();

        let mut features = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(f) => features.push(f),
                Err(e) if e.is_window_local() => {
                    warn!(window = index, error = %e, "calibration window unusable");
                }
                Err(e) => return Err(e),
            }
        }
        calibrate(&features, &self.config.calibration)
    }

    fn window_features(&self, window: &Window, deadline: &Deadline) -> Result<FeatureVector> {
        deadline.check()?;
        let derived = derive(window, &self.config.window);
        let ibi = self.engine.decompose(&derived.ibi, deadline)?;
        let eda = self.engine.decompose(&derived.eda, deadline)?;
        self.extractor.extract(&ibi, &eda)
    }

    fn classify_window(&self, window: &Window, baseline: &Baseline, deadline: &Deadline) -> Result<Classified> {
        let minute = window
            .minute()
            .ok_or_else(|| Error::InvalidInput("calibration window passed to classifier".into()))?;
        let features = self.window_features(window, deadline)?;
        let level = self.classifier.classify(&features, baseline)?;
        Ok(Classified {
            minute,
            level,
            features,
        })
    }
}

fn check_minutes(minutes: usize) -> Result<()> {
    if minutes == 0 || minutes > MAX_ANALYSIS_MINUTES {
        return Err(Error::InvalidParameter(format!(
            "minutes must be between 1 and {MAX_ANALYSIS_MINUTES}, got {minutes}"
        )));
    }
    Ok(())
}
