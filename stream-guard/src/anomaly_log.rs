//! Append-only log of confirmed anomalies and its CSV export.
//!
//! The export format is an external contract: a header row exactly
//! `Time,Value,Mean,Deviation` followed by one row per record in detection
//! order. Exports replace the destination atomically; a failed export leaves
//! both the destination and the in-memory log as they were.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, instrument};

use crate::detector::DetectionResult;
use crate::error::{GuardError, Result};
use crate::source::Sample;

/// Column names of the exported file, in order.
pub const CSV_HEADER: [&str; 4] = ["Time", "Value", "Mean", "Deviation"];

/// A sample that was classified as anomalous, with the statistics that
/// condemned it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    #[serde(rename = "Time")]
    pub timestamp: u64,
    #[serde(rename = "Value")]
    pub value: f64,
    #[serde(rename = "Mean")]
    pub mean: f64,
    /// The z-score of the sample.
    #[serde(rename = "Deviation")]
    pub score: f64,
}

impl AnomalyRecord {
    pub fn new(timestamp: u64, value: f64, mean: f64, score: f64) -> Self {
        Self {
            timestamp,
            value,
            mean,
            score,
        }
    }

    /// Builds a record from a sample and the result that flagged it.
    pub fn from_detection(sample: &Sample, result: &DetectionResult) -> Self {
        Self::new(sample.timestamp, sample.value, result.mean, result.score)
    }
}

/// Summary of a completed export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    pub path: PathBuf,
    /// Data rows written, excluding the header.
    pub rows: usize,
}

/// Ordered collection of anomaly records; insertion order is detection order.
#[derive(Debug, Clone, Default)]
pub struct AnomalyLog {
    records: Vec<AnomalyRecord>,
}

impl AnomalyLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record. Records are never modified or removed afterwards.
    pub fn record(&mut self, record: AnomalyRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[AnomalyRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnomalyRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&AnomalyRecord> {
        self.records.last()
    }

    /// Writes the whole log as CSV to `destination`, replacing any previous
    /// contents.
    ///
    /// The rows go to a temporary file in the destination directory which is
    /// renamed over the destination once fully written. On any failure the
    /// temporary file is removed and nothing at `destination` changes.
    ///
    /// # Errors
    /// Returns [`GuardError::Export`] if the directory is not writable or any
    /// write fails.
    #[instrument(skip(self, destination), fields(rows = self.records.len()))]
    pub fn export(&self, destination: impl AsRef<Path>) -> Result<ExportReport> {
        let path = destination.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut staged =
            NamedTempFile::new_in(dir).map_err(|e| GuardError::export(path, e.to_string()))?;
        self.write_csv(staged.as_file_mut())
            .map_err(|e| GuardError::export(path, e.to_string()))?;
        staged
            .as_file()
            .sync_all()
            .map_err(|e| GuardError::export(path, e.to_string()))?;
        staged
            .persist(path)
            .map_err(|e| GuardError::export(path, e.error.to_string()))?;

        info!(path = %path.display(), rows = self.records.len(), "Anomalies saved");

        Ok(ExportReport {
            path: path.to_path_buf(),
            rows: self.records.len(),
        })
    }

    /// Writes the header and every record to `out`.
    pub fn write_csv<W: std::io::Write>(&self, out: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);
        writer.write_record(CSV_HEADER)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a AnomalyLog {
    type Item = &'a AnomalyRecord;
    type IntoIter = std::slice::Iter<'a, AnomalyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
