//! Presentation adapters.
//!
//! A [`DetectionSink`] receives every accepted sample together with its
//! classification, anomalous or not. Sinks only consume; nothing they do
//! flows back into the detector.

use std::collections::VecDeque;
use std::io::Write;

use crate::detector::DetectionResult;
use crate::error::Result;
use crate::source::Sample;

/// Lowest upper bound of the vertical axis.
pub const Y_AXIS_FLOOR: f64 = 200_000.0;

/// Headroom added above the tallest visible value.
pub const Y_AXIS_MARGIN: f64 = 5_000.0;

/// Receives per-sample detection output.
pub trait DetectionSink {
    fn on_sample(&mut self, sample: &Sample, result: &DetectionResult) -> Result<()>;
}

impl<S: DetectionSink + ?Sized> DetectionSink for Box<S> {
    fn on_sample(&mut self, sample: &Sample, result: &DetectionResult) -> Result<()> {
        (**self).on_sample(sample, result)
    }
}

/// Collects everything it is given. Mostly useful in tests.
impl DetectionSink for Vec<(Sample, DetectionResult)> {
    fn on_sample(&mut self, sample: &Sample, result: &DetectionResult) -> Result<()> {
        self.push((*sample, *result));
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DetectionSink for NullSink {
    fn on_sample(&mut self, _sample: &Sample, _result: &DetectionResult) -> Result<()> {
        Ok(())
    }
}

/// Rolling view of the most recent samples and the anomaly markers that are
/// still on screen.
///
/// Its capacity is a display concern and independent of the detector window.
#[derive(Debug, Clone)]
pub struct DisplayBuffer {
    capacity: usize,
    points: VecDeque<Sample>,
    markers: VecDeque<Sample>,
}

impl DisplayBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity),
            markers: VecDeque::new(),
        }
    }

    pub fn push(&mut self, sample: Sample, is_anomaly: bool) {
        self.points.push_back(sample);
        if self.points.len() > self.capacity {
            self.points.pop_front();
        }
        if is_anomaly {
            self.markers.push_back(sample);
        }
        if let Some(first) = self.points.front() {
            let first = first.timestamp;
            while self.markers.front().is_some_and(|m| m.timestamp < first) {
                self.markers.pop_front();
            }
        }
    }

    pub fn points(&self) -> &VecDeque<Sample> {
        &self.points
    }

    pub fn markers(&self) -> &VecDeque<Sample> {
        &self.markers
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Visible time span. Until the buffer is full the span is padded to the
    /// buffer's capacity so the axis does not rescale every tick.
    pub fn x_range(&self) -> Option<(u64, u64)> {
        let first = self.points.front()?.timestamp;
        let last = self.points.back()?.timestamp;
        if self.points.len() < self.capacity {
            Some((first, last.max(first + self.capacity as u64)))
        } else {
            Some((first, last))
        }
    }

    /// Vertical span: from zero to the tallest visible value (never below
    /// the floor) plus headroom.
    pub fn y_range(&self) -> (f64, f64) {
        let tallest = self
            .points
            .iter()
            .map(|p| p.value)
            .filter(|v| v.is_finite())
            .fold(Y_AXIS_FLOOR, f64::max);
        (0.0, tallest + Y_AXIS_MARGIN)
    }
}

/// Renders one text line per sample: the reading, its statistics, a bar
/// scaled to the display buffer's vertical range, and an anomaly marker.
pub struct TerminalSink<W: Write> {
    out: W,
    display: DisplayBuffer,
    bar_width: usize,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, display_window: usize) -> Self {
        Self {
            out,
            display: DisplayBuffer::new(display_window),
            bar_width: 40,
        }
    }

    pub fn with_bar_width(mut self, width: usize) -> Self {
        self.bar_width = width;
        self
    }

    pub fn display(&self) -> &DisplayBuffer {
        &self.display
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn bar(&self, value: f64) -> String {
        let (_, y_max) = self.display.y_range();
        let fraction = (value / y_max).clamp(0.0, 1.0);
        // NaN saturates to zero.
        let filled = (fraction * self.bar_width as f64).round() as usize;
        let mut bar = "#".repeat(filled);
        bar.push_str(&" ".repeat(self.bar_width - filled.min(self.bar_width)));
        bar
    }
}

impl<W: Write> DetectionSink for TerminalSink<W> {
    fn on_sample(&mut self, sample: &Sample, result: &DetectionResult) -> Result<()> {
        self.display.push(*sample, result.is_anomaly);
        let bar = self.bar(sample.value);
        let marker = if result.is_anomaly { " ANOMALY" } else { "" };
        writeln!(
            self.out,
            "{:>8} {:>14.2} mean {:>14.2} z {:>7.2} |{}|{}",
            sample.timestamp, sample.value, result.mean, result.score, bar, marker
        )?;
        Ok(())
    }
}
