//! CSV telemetry exports with `timestamp,heart_rate,eda` columns

use crate::source::{FetchRequest, TelemetrySource};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use stress_core::{Error, RawSample, Result};
use tracing::warn;

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: DateTime<Utc>,
    heart_rate: Option<f64>,
    eda: Option<f64>,
}

/// Read samples from CSV with a header row
///
/// Rows with an empty heart rate or EDA cell are skipped. Malformed rows
/// (bad timestamp, non-numeric values) fail the whole read.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<RawSample>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut samples = Vec::new();
    let mut skipped = 0usize;

    for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(|e| Error::Source(format!("csv row {}: {e}", line + 1)))?;
        match (row.heart_rate, row.eda) {
            (Some(hr), Some(eda)) => samples.push(RawSample::new(row.timestamp, hr, eda)),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, kept = samples.len(), "csv contained incomplete rows");
    }
    Ok(samples)
}

/// CSV export stored on disk
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TelemetrySource for CsvSource {
    fn fetch(&self, _request: &FetchRequest) -> Result<Vec<RawSample>> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            Error::Source(format!("cannot open {}: {e}", self.path.display()))
        })?;
        read_csv(std::io::BufReader::new(file))
    }

    fn describe(&self) -> String {
        format!("csv({})", self.path.display())
    }
}
