//! Property-based tests for the detector invariants.
//!
//! - warm-up: nothing is classified until the window is full
//! - the window never holds more than its capacity, and holds exactly that
//!   many values once warm-up is over
//! - eviction is first-in, first-out
//! - a window of identical values never produces an anomaly
//! - computing statistics does not change them

use proptest::prelude::*;
use stream_guard::config::DetectorConfig;
use stream_guard::detector::{stats, DetectionResult, DetectorState, SlidingWindow, ZScoreDetector};

fn finite_values(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1e6..1e6f64, 0..max_len)
}

proptest! {
    #[test]
    fn prop_warmup_results_are_neutral(
        window_size in 1usize..40,
        values in finite_values(80),
    ) {
        let mut detector = ZScoreDetector::new(DetectorConfig::new(window_size, 0.5)).unwrap();
        for (i, v) in values.iter().enumerate() {
            let result = detector.detect(*v).unwrap();
            if i + 1 < window_size {
                prop_assert_eq!(result, DetectionResult::warmup());
                prop_assert_eq!(detector.state(), DetectorState::Warmup);
            } else {
                prop_assert_eq!(detector.state(), DetectorState::Active);
            }
        }
    }

    #[test]
    fn prop_window_length_bounded(
        window_size in 1usize..40,
        values in finite_values(120),
    ) {
        let mut detector = ZScoreDetector::new(DetectorConfig::new(window_size, 3.0)).unwrap();
        for (i, v) in values.iter().enumerate() {
            detector.detect(*v).unwrap();
            let len = detector.window().len();
            prop_assert!(len <= window_size);
            if detector.state() == DetectorState::Active {
                prop_assert_eq!(len, window_size);
            } else {
                prop_assert_eq!(len, i + 1);
            }
        }
    }

    #[test]
    fn prop_window_holds_most_recent_in_order(
        capacity in 1usize..30,
        values in finite_values(100),
    ) {
        let mut window = SlidingWindow::new(capacity);
        for v in &values {
            window.observe(*v);
        }
        let start = values.len().saturating_sub(capacity);
        prop_assert_eq!(window.to_vec(), values[start..].to_vec());
    }

    #[test]
    fn prop_identical_values_never_flag(
        window_size in 1usize..60,
        value in -1e9..1e9f64,
        threshold in 0.0..10.0f64,
        repeats in 1usize..150,
    ) {
        let config = DetectorConfig::new(window_size, threshold);
        let mut detector = ZScoreDetector::new(config).unwrap();
        for _ in 0..repeats {
            let result = detector.detect(value).unwrap();
            prop_assert!(!result.is_anomaly);
            prop_assert_eq!(result.score, 0.0);
            prop_assert_eq!(result.std_dev, 0.0);
        }
    }

    #[test]
    fn prop_stats_idempotent(values in prop::collection::vec(-1e6..1e6f64, 1..60)) {
        let mut window = SlidingWindow::new(values.len());
        for v in &values {
            window.observe(*v);
        }
        let first = stats::compute(&window);
        let second = stats::compute(&window);
        prop_assert!(first.is_some());
        prop_assert_eq!(first, second);
        prop_assert_eq!(window.to_vec(), values);
    }

    #[test]
    fn prop_small_windows_cannot_flag_at_three(values in prop::collection::vec(-1e6..1e6f64, 1..11)) {
        // |score| <= (n - 1) / sqrt(n) < 3 for n <= 10.
        let mut detector = ZScoreDetector::new(DetectorConfig::new(values.len(), 3.0)).unwrap();
        for v in &values {
            prop_assert!(!detector.detect(*v).unwrap().is_anomaly);
        }
    }
}
