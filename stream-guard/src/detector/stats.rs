use serde::{Deserialize, Serialize};

use super::window::SlidingWindow;

/// Mean and population standard deviation of a window's contents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub mean: f64,
    /// Population standard deviation (divisor `n`, not `n - 1`).
    pub std_dev: f64,
}

impl WindowStats {
    /// Computes the statistics of `values`, or `None` when there are none.
    ///
    /// When every value is identical the mean is that value and `std_dev` is
    /// exactly zero; the two-pass sum would otherwise leave rounding residue.
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
        I::IntoIter: Clone,
    {
        let iter = values.into_iter();

        let mut count = 0usize;
        let mut sum = 0.0;
        let mut first = None;
        let mut all_equal = true;
        for v in iter.clone() {
            match first {
                None => first = Some(v),
                Some(f) => all_equal &= v == f,
            }
            sum += v;
            count += 1;
        }

        let first = first?;
        if all_equal {
            return Some(Self {
                mean: first,
                std_dev: 0.0,
            });
        }

        let n = count as f64;
        let mean = sum / n;
        let variance = iter.map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
        })
    }
}

/// Computes the statistics over exactly the values currently in `window`.
pub fn compute(window: &SlidingWindow) -> Option<WindowStats> {
    WindowStats::from_values(window.iter().copied())
}
