//! The driving loop.
//!
//! A [`StreamRunner`] pulls samples from a source, classifies each one,
//! records anomalies and forwards every accepted sample to a
//! [`DetectionSink`]. It can be drained synchronously or driven on a timer
//! with [`StreamRunner::run`], which accepts commands over a
//! `tokio::sync::watch` channel.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, instrument, warn};

use crate::anomaly_log::{AnomalyLog, AnomalyRecord, ExportReport};
use crate::config::DetectorConfig;
use crate::detector::{DetectionResult, ZScoreDetector};
use crate::error::{GuardError, Result};
use crate::logging::LogConfig;
use crate::sink::DetectionSink;
use crate::source::Sample;

/// Control messages for a running stream. Checked between samples only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StreamCommand {
    #[default]
    Run,
    Stop,
    /// Stop, then export the anomaly log to the given path.
    StopAndExport(PathBuf),
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Stopped,
    SampleLimit,
    SourceExhausted,
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Samples classified, excluding rejected ones.
    pub samples_processed: u64,
    pub anomalies: usize,
    /// Non-finite samples refused by the detector.
    pub rejected: u64,
    pub stop_reason: StopReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub export: Option<ExportReport>,
}

/// Drives one detector over one stream.
pub struct StreamRunner<S: DetectionSink> {
    detector: ZScoreDetector,
    log: AnomalyLog,
    sink: S,
    log_config: LogConfig,
    samples_processed: u64,
    rejected: u64,
}

impl<S: DetectionSink> StreamRunner<S> {
    /// Creates a runner with a fresh detector and an empty anomaly log.
    ///
    /// # Errors
    /// Returns an error if the detector configuration does not validate.
    pub fn new(config: DetectorConfig, sink: S) -> Result<Self> {
        Ok(Self {
            detector: ZScoreDetector::new(config)?,
            log: AnomalyLog::new(),
            sink,
            log_config: LogConfig::default(),
            samples_processed: 0,
            rejected: 0,
        })
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn detector(&self) -> &ZScoreDetector {
        &self.detector
    }

    pub fn anomaly_log(&self) -> &AnomalyLog {
        &self.log
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn samples_processed(&self) -> u64 {
        self.samples_processed
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Classifies one sample.
    ///
    /// Returns `Ok(None)` for a non-finite sample refused by the detector; such
    /// a sample is counted, logged and otherwise ignored.
    ///
    /// # Errors
    /// Fails only if the sink fails.
    pub fn process(&mut self, sample: Sample) -> Result<Option<DetectionResult>> {
        let result = match self.detector.detect(sample.value) {
            Ok(result) => result,
            Err(GuardError::NonFiniteSample { value }) => {
                self.rejected += 1;
                warn!(timestamp = sample.timestamp, value = %value, "Rejected non-finite sample");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        self.samples_processed += 1;

        crate::log_sample!(
            self.log_config,
            timestamp = sample.timestamp,
            value = sample.value,
            mean = result.mean,
            score = result.score,
            "Sample processed"
        );

        if result.is_anomaly {
            self.log.record(AnomalyRecord::from_detection(&sample, &result));
            if self.log_config.log_anomalies {
                info!(
                    timestamp = sample.timestamp,
                    value = sample.value,
                    mean = result.mean,
                    score = result.score,
                    "Anomaly detected"
                );
            }
        }

        self.sink.on_sample(&sample, &result)?;
        Ok(Some(result))
    }

    /// Processes samples until the source ends or `limit` samples have been
    /// pulled, whichever comes first.
    pub fn run_until_exhausted<I>(&mut self, source: I, limit: Option<u64>) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Sample>,
    {
        let started_at = Utc::now();
        let mut source = source.into_iter();
        let mut pulled = 0u64;

        let stop_reason = loop {
            if limit.is_some_and(|max| pulled >= max) {
                break StopReason::SampleLimit;
            }
            let Some(sample) = source.next() else {
                break StopReason::SourceExhausted;
            };
            pulled += 1;
            self.process(sample)?;
        };

        Ok(self.summary(stop_reason, started_at, None))
    }

    /// Processes one sample per `period` until told to stop, until
    /// `max_samples` samples have been pulled, or until the source ends.
    ///
    /// Pending commands win over a due tick, and the command already in the
    /// channel when the run starts is honored before the first sample.
    ///
    /// # Errors
    /// Returns an error for a zero `period`, if the sink fails, or if a
    /// requested export fails. In the latter case the anomaly log is intact and [`export`](Self::export) can
    /// be retried.
    #[instrument(skip_all, fields(period_ms = period.as_millis() as u64))]
    pub async fn run<I>(
        &mut self,
        source: I,
        period: Duration,
        mut commands: watch::Receiver<StreamCommand>,
        max_samples: Option<u64>,
    ) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Sample>,
    {
        if period.is_zero() {
            return Err(GuardError::invalid_config("tick period must be non-zero"));
        }

        let started_at = Utc::now();
        let mut source = source.into_iter();
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut pulled = 0u64;
        let mut command = commands.borrow_and_update().clone();

        info!(
            window_size = self.detector.config().window_size,
            threshold = self.detector.threshold(),
            "Stream started"
        );

        let (stop_reason, export_to) = loop {
            match &command {
                StreamCommand::Run => {}
                StreamCommand::Stop => break (StopReason::Stopped, None),
                StreamCommand::StopAndExport(path) => {
                    break (StopReason::Stopped, Some(path.clone()))
                }
            }
            if max_samples.is_some_and(|max| pulled >= max) {
                break (StopReason::SampleLimit, None);
            }

            tokio::select! {
                biased;
                Ok(()) = commands.changed() => {
                    command = commands.borrow_and_update().clone();
                }
                _ = ticker.tick() => {
                    let Some(sample) = source.next() else {
                        break (StopReason::SourceExhausted, None);
                    };
                    pulled += 1;
                    self.process(sample)?;
                }
            }
        };

        let export = match export_to {
            Some(path) => Some(self.export(&path)?),
            None => None,
        };

        let summary = self.summary(stop_reason, started_at, export);
        info!(
            samples = summary.samples_processed,
            anomalies = summary.anomalies,
            rejected = summary.rejected,
            reason = ?summary.stop_reason,
            "Stream stopped"
        );
        Ok(summary)
    }

    /// Exports the anomaly log collected so far.
    pub fn export(&self, destination: impl AsRef<Path>) -> Result<ExportReport> {
        self.log.export(destination)
    }

    fn summary(
        &self,
        stop_reason: StopReason,
        started_at: DateTime<Utc>,
        export: Option<ExportReport>,
    ) -> RunSummary {
        RunSummary {
            samples_processed: self.samples_processed,
            anomalies: self.log.len(),
            rejected: self.rejected,
            stop_reason,
            started_at,
            finished_at: Utc::now(),
            export,
        }
    }
}
