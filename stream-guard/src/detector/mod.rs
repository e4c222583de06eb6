//! Streaming z-score anomaly detection.
//!
//! The detector is three small pieces composed in [`ZScoreDetector`]:
//!
//! - [`SlidingWindow`]: fixed-capacity FIFO of the most recent values
//! - [`stats`]: mean and population standard deviation over the window
//! - the classifier: a two-state machine (warm-up, active) that scores the
//!   newest value against the window and applies the threshold
//!
//! ## Example
//!
//! ```rust
//! use stream_guard::config::DetectorConfig;
//! use stream_guard::detector::ZScoreDetector;
//!
//! let mut detector = ZScoreDetector::new(DetectorConfig::new(20, 3.0)).unwrap();
//! for _ in 0..19 {
//!     assert!(!detector.detect(0.0).unwrap().is_anomaly);
//! }
//! let result = detector.detect(100.0).unwrap();
//! assert!(result.is_anomaly);
//! ```

mod classifier;
pub mod stats;
mod window;

pub use classifier::{DetectionResult, DetectorState, ZScoreDetector};
pub use stats::WindowStats;
pub use window::SlidingWindow;
