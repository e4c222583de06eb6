//! Detector and stream configuration.
//!
//! The detector recognizes exactly two tunables, the window capacity and the
//! z-score threshold, plus the policy for non-finite input. Everything else in
//! [`StreamConfig`] belongs to the driving loop and its adapters.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GuardError, Result};

/// Default detector window capacity.
pub const DEFAULT_WINDOW_SIZE: usize = 50;

/// Default z-score threshold.
pub const DEFAULT_Z_SCORE_THRESHOLD: f64 = 3.0;

/// Default number of samples kept for display.
pub const DEFAULT_DISPLAY_WINDOW: usize = 100;

/// Default pacing interval between samples, in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Default destination for exported anomalies.
pub const DEFAULT_EXPORT_PATH: &str = "anomalies_track.csv";

/// What the detector does with NaN and infinite samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonFinitePolicy {
    /// Refuse the sample before it reaches the window.
    #[default]
    Reject,
    /// Insert the sample like any other; IEEE arithmetic decides the statistics.
    PassThrough,
}

/// Immutable detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Capacity of the sliding window.
    pub window_size: usize,
    /// Samples with `|score|` strictly above this value are anomalies.
    pub z_score_threshold: f64,
    /// Handling of non-finite samples.
    pub non_finite: NonFinitePolicy,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            z_score_threshold: DEFAULT_Z_SCORE_THRESHOLD,
            non_finite: NonFinitePolicy::default(),
        }
    }
}

impl DetectorConfig {
    /// Creates a configuration with the given window size and threshold.
    pub fn new(window_size: usize, z_score_threshold: f64) -> Self {
        Self {
            window_size,
            z_score_threshold,
            non_finite: NonFinitePolicy::default(),
        }
    }

    /// Sets the window capacity.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Sets the z-score threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.z_score_threshold = threshold;
        self
    }

    /// Sets the non-finite input policy.
    pub fn with_non_finite_policy(mut self, policy: NonFinitePolicy) -> Self {
        self.non_finite = policy;
        self
    }

    /// Checks that the window holds at least one value and the threshold is
    /// finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(GuardError::invalid_config(
                "window_size must be at least 1",
            ));
        }
        let threshold = self.z_score_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(GuardError::invalid_config(format!(
                "z_score_threshold must be finite and non-negative, got: {threshold}"
            )));
        }
        Ok(())
    }
}

/// Configuration for a live stream: detector plus driving-loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub detector: DetectorConfig,
    /// Samples kept by the display buffer; independent of the detector window.
    pub display_window: usize,
    pub tick_interval_ms: u64,
    pub export_path: PathBuf,
    /// Seed for the synthetic source; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Stop and export after this many samples.
    pub max_samples: Option<u64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            display_window: DEFAULT_DISPLAY_WINDOW,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            seed: None,
            max_samples: None,
        }
    }
}

impl StreamConfig {
    /// Loads a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the detector section, the display window and the pacing
    /// interval.
    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        if self.display_window == 0 {
            return Err(GuardError::invalid_config(
                "display_window must be at least 1",
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(GuardError::invalid_config(
                "tick_interval_ms must be at least 1",
            ));
        }
        Ok(())
    }

    /// Pacing interval as a `Duration`.
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.detector.window_size, 50);
        assert_eq!(config.detector.z_score_threshold, 3.0);
        assert_eq!(config.detector.non_finite, NonFinitePolicy::Reject);
        assert_eq!(config.display_window, 100);
        assert_eq!(config.export_path, PathBuf::from("anomalies_track.csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_detector_config() {
        assert!(DetectorConfig::new(0, 3.0).validate().is_err());
        assert!(DetectorConfig::new(10, f64::NAN).validate().is_err());
        assert!(DetectorConfig::new(10, f64::INFINITY).validate().is_err());

        let err = DetectorConfig::new(10, -1.0).validate().unwrap_err();
        assert!(err.to_string().contains("non-negative"));

        assert!(DetectorConfig::new(1, 0.0).validate().is_ok());
    }

    #[test]
    fn test_zero_display_window_rejected() {
        let config = StreamConfig {
            display_window: 0,
            ..StreamConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let config = StreamConfig {
            tick_interval_ms: 0,
            ..StreamConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, GuardError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("tick_interval_ms"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tick_interval_ms": 0}}"#).unwrap();
        assert!(StreamConfig::from_json_file(file.path()).is_err());
    }

    #[test]
    fn test_from_json_file_with_partial_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"detector": {{"window_size": 20, "non_finite": "pass_through"}}, "seed": 7}}"#
        )
        .unwrap();

        let config = StreamConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.detector.window_size, 20);
        assert_eq!(config.detector.z_score_threshold, 3.0);
        assert_eq!(config.detector.non_finite, NonFinitePolicy::PassThrough);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.tick_interval_ms, 100);
    }

    #[test]
    fn test_from_json_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"detector": {{"window_size": 0}}}}"#).unwrap();

        let err = StreamConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, GuardError::InvalidConfiguration(_)));
    }
}
