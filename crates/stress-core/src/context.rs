//! Session execution context
//!
//! The SessionContext flows through every stage of one analysis request,
//! carrying its trace id, its deadline and per-stage timing information.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Caller-imposed time limit for a request
///
/// Long-running loops poll [`Deadline::check`] so work aborts cleanly at a
/// point where nothing partial has been published.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    /// A deadline that never expires
    pub fn none() -> Self {
        Self {
            started: Instant::now(),
            limit: None,
        }
    }

    /// Expire `limit` after now
    pub fn after(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit: Some(limit),
        }
    }

    pub fn from_option(limit: Option<Duration>) -> Self {
        match limit {
            Some(limit) => Self::after(limit),
            None => Self::none(),
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.limit {
            Some(limit) => self.started.elapsed() >= limit,
            None => false,
        }
    }

    /// `Err(Timeout)` once the limit has passed
    pub fn check(&self) -> Result<()> {
        match self.limit {
            Some(limit) if self.started.elapsed() >= limit => Err(Error::Timeout { limit }),
            _ => Ok(()),
        }
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}

/// Context that flows through one analysis session
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Unique trace ID for this session
    pub trace_id: Uuid,
    /// When the session started
    pub start_time: Instant,
    /// Request deadline
    pub deadline: Deadline,
    /// Stage timing information
    stage_timings: HashMap<String, Duration>,
}

impl SessionContext {
    /// Create a new session context
    pub fn new(deadline: Deadline) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            start_time: Instant::now(),
            deadline,
            stage_timings: HashMap::new(),
        }
    }

    /// Record timing for a stage
    pub fn record_stage_timing(&mut self, stage: impl Into<String>, duration: Duration) {
        self.stage_timings.insert(stage.into(), duration);
    }

    /// Time a stage execution
    pub fn time_stage<F, R>(&mut self, stage: impl Into<String>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let stage_name = stage.into();
        let start = Instant::now();
        let result = f();
        self.record_stage_timing(stage_name, start.elapsed());
        result
    }

    /// Get total elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get stage timings
    pub fn stage_timings(&self) -> &HashMap<String, Duration> {
        &self.stage_timings
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(Deadline::none())
    }
}
