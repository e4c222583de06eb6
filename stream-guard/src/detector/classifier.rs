use serde::{Deserialize, Serialize};
use tracing::debug;

use super::stats::{self, WindowStats};
use super::window::SlidingWindow;
use crate::config::{DetectorConfig, NonFinitePolicy};
use crate::error::{GuardError, Result};

/// Detector lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorState {
    /// The window has not reached capacity yet; nothing is classified.
    Warmup,
    /// The window has been full at least once. Terminal.
    Active,
}

/// Outcome of classifying one sample. Returned to the caller, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub is_anomaly: bool,
    pub mean: f64,
    pub std_dev: f64,
    /// `(value - mean) / std_dev`, or zero when no score is defined.
    pub score: f64,
}

impl DetectionResult {
    /// Result for a sample observed during warm-up.
    pub fn warmup() -> Self {
        Self {
            is_anomaly: false,
            mean: 0.0,
            std_dev: 0.0,
            score: 0.0,
        }
    }

    /// Result for a flat window: the mean is reported, nothing else.
    pub fn flat(mean: f64) -> Self {
        Self {
            is_anomaly: false,
            mean,
            std_dev: 0.0,
            score: 0.0,
        }
    }
}

/// Sliding-window z-score detector for a single stream.
///
/// Each call to [`detect`](Self::detect) inserts the value first and then
/// scores it against the post-insertion window, so the newest value is part
/// of its own baseline. Two consequences follow and are not bugs:
///
/// - a window of identical values has `std_dev == 0` and never flags,
///   however large the next value is once it has been averaged in;
/// - the largest reachable `|score|` in a window of `n` values is
///   `(n - 1) / sqrt(n)`, so with a threshold of 3.0 windows smaller than
///   eleven values cannot flag anything.
#[derive(Debug, Clone)]
pub struct ZScoreDetector {
    config: DetectorConfig,
    window: SlidingWindow,
    state: DetectorState,
}

impl ZScoreDetector {
    /// Creates a detector in the warm-up state.
    ///
    /// # Errors
    /// Returns an error if the configuration does not validate.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            window: SlidingWindow::new(config.window_size),
            config,
            state: DetectorState::Warmup,
        })
    }

    /// Creates a detector with a window of 50 and a threshold of 3.0.
    pub fn with_defaults() -> Self {
        let config = DetectorConfig::default();
        Self {
            window: SlidingWindow::new(config.window_size),
            config,
            state: DetectorState::Warmup,
        }
    }

    /// Observes `value` and classifies it.
    ///
    /// # Errors
    /// Only fails for a non-finite value under [`NonFinitePolicy::Reject`], in
    /// which case the window is left untouched.
    pub fn detect(&mut self, value: f64) -> Result<DetectionResult> {
        if !value.is_finite() && self.config.non_finite == NonFinitePolicy::Reject {
            return Err(GuardError::NonFiniteSample { value });
        }

        self.window.observe(value);

        if self.state == DetectorState::Warmup {
            if !self.window.is_full() {
                return Ok(DetectionResult::warmup());
            }
            debug!(
                window_size = self.window.capacity(),
                "Detector window filled, classification active"
            );
            self.state = DetectorState::Active;
        }

        // The window holds at least the value just observed.
        let Some(WindowStats { mean, std_dev }) = stats::compute(&self.window) else {
            return Ok(DetectionResult::warmup());
        };

        if std_dev == 0.0 {
            return Ok(DetectionResult::flat(mean));
        }

        let score = (value - mean) / std_dev;
        Ok(DetectionResult {
            is_anomaly: score.abs() > self.config.z_score_threshold,
            mean,
            std_dev,
            score,
        })
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn threshold(&self) -> f64 {
        self.config.z_score_threshold
    }

    /// Statistics of the current window, if it holds anything.
    pub fn current_stats(&self) -> Option<WindowStats> {
        stats::compute(&self.window)
    }
}

impl Default for ZScoreDetector {
    fn default() -> Self {
        Self::with_defaults()
    }
}
