//! # stream-guard - Streaming z-score anomaly detection
//!
//! stream-guard watches a single stream of numeric samples and flags values
//! that deviate from the recent past. It keeps a sliding window of the most
//! recent values, scores each new value against the window's mean and
//! population standard deviation, and records every sample whose z-score
//! exceeds a threshold. The recorded anomalies can be exported as CSV.
//!
//! ## Quick Start
//!
//! ```rust
//! use stream_guard::prelude::*;
//!
//! # fn main() -> stream_guard::Result<()> {
//! let mut runner = StreamRunner::new(DetectorConfig::new(20, 3.0), NullSink)?;
//!
//! let mut values = vec![0.0; 19];
//! values.push(100.0);
//! let summary = runner.run_until_exhausted(ReplaySource::new(values), None)?;
//!
//! assert_eq!(summary.samples_processed, 20);
//! assert_eq!(runner.anomaly_log().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`detector`]: the sliding window, the statistics and the classifier
//! - [`anomaly_log`]: append-only anomaly records and atomic CSV export
//! - [`source`]: synthetic and replayed sample streams
//! - [`sink`]: presentation adapters fed with every classified sample
//! - [`runner`]: the driving loop, synchronous or paced with tokio
//!
//! Detection is deterministic for a given sequence of values. Pacing,
//! rendering and export only observe it.

pub mod anomaly_log;
pub mod config;
pub mod detector;
pub mod error;
pub mod logging;
pub mod runner;
pub mod sink;
pub mod source;

pub use error::{GuardError, Result};

/// Commonly used types.
pub mod prelude {
    pub use crate::anomaly_log::{AnomalyLog, AnomalyRecord, ExportReport};
    pub use crate::config::{DetectorConfig, NonFinitePolicy, StreamConfig};
    pub use crate::detector::{DetectionResult, DetectorState, ZScoreDetector};
    pub use crate::error::{GuardError, Result};
    pub use crate::runner::{RunSummary, StopReason, StreamCommand, StreamRunner};
    pub use crate::sink::{DetectionSink, DisplayBuffer, NullSink, TerminalSink};
    pub use crate::source::{ReplaySource, Sample, SyntheticParams, SyntheticSource};
}
