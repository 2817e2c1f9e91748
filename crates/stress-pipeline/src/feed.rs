//! Channel-feed JSON exports
//!
//! The telemetry channel exports `{"feeds": [...]}` where each entry carries
//! a `created_at` timestamp, heart rate in `field1` and EDA in `field2`. Field
//! values arrive as strings (or numbers, or null). Timestamps are RFC 3339
//! strings or integer epoch seconds.

use crate::source::{FetchRequest, TelemetrySource};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use stress_core::{Error, RawSample, Result};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ChannelFeed {
    feeds: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    #[serde(default)]
    created_at: Option<serde_json::Value>,
    #[serde(default)]
    entry_id: Option<u64>,
    #[serde(default)]
    field1: Option<serde_json::Value>,
    #[serde(default)]
    field2: Option<serde_json::Value>,
}

fn field_value(value: Option<&serde_json::Value>) -> Option<f64> {
    match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn timestamp_value(value: Option<&serde_json::Value>) -> Option<DateTime<Utc>> {
    match value? {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        serde_json::Value::Number(n) => DateTime::<Utc>::from_timestamp(n.as_i64()?, 0),
        _ => None,
    }
}

/// Parse a channel-feed document
///
/// Entries with a missing or unparseable timestamp, heart rate or EDA value
/// are skipped.
/// A document without a `feeds` array is an `Error::Source`.
pub fn parse_feed(json: &str) -> Result<Vec<RawSample>> {
    let feed: ChannelFeed = serde_json::from_str(json)
        .map_err(|e| Error::Source(format!("invalid channel feed: {e}")))?;

    let total = feed.feeds.len();
    let samples: Vec<RawSample> = feed
        .feeds
        .into_iter()
        .filter_map(|entry| {
            let hr = field_value(entry.field1.as_ref());
            let eda = field_value(entry.field2.as_ref());
            let timestamp = timestamp_value(entry.created_at.as_ref());
            match (timestamp, hr, eda) {
                (Some(t), Some(hr), Some(eda)) => Some(RawSample::new(t, hr, eda)),
                _ => {
                    debug!(entry_id = ?entry.entry_id, "skipping incomplete feed entry");
                    None
                }
            }
        })
        .collect();

    if samples.len() < total {
        warn!(kept = samples.len(), total, "feed contained incomplete entries");
    }
    Ok(samples)
}

/// Channel-feed export stored on disk
#[derive(Debug, Clone)]
pub struct FeedFileSource {
    path: PathBuf,
}

impl FeedFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TelemetrySource for FeedFileSource {
    fn fetch(&self, _request: &FetchRequest) -> Result<Vec<RawSample>> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Source(format!("cannot read feed {}: {e}", self.path.display()))
        })?;
        parse_feed(&text)
    }

    fn describe(&self) -> String {
        format!("feed({})", self.path.display())
    }
}
