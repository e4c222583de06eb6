//! Sample sources.
//!
//! A source is any `Iterator<Item = Sample>`: pull-based and lazy, consumed
//! one sample at a time by the driving loop. Two sources ship with the crate:
//! [`SyntheticSource`] for live demos and [`ReplaySource`] for recorded or
//! hand-written sequences.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{GuardError, Result};

/// One timestamped observation. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Caller-supplied, monotonically increasing.
    pub timestamp: u64,
    /// The detector does not assume this is non-negative.
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: u64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Shape of the synthetic signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticParams {
    /// Peak of the seasonal sine component.
    pub amplitude: f64,
    /// The seasonal component is `amplitude * sin(t / period)`.
    pub period: f64,
    pub noise_std_dev: f64,
    /// Chance per tick of adding a spike.
    pub spike_probability: f64,
    pub spike_min: f64,
    pub spike_max: f64,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            amplitude: 50_000.0,
            period: 100.0,
            noise_std_dev: 2_000.0,
            spike_probability: 0.05,
            spike_min: 50_000.0,
            spike_max: 150_000.0,
        }
    }
}

impl SyntheticParams {
    pub fn validate(&self) -> Result<()> {
        if !self.period.is_finite() || self.period == 0.0 {
            return Err(GuardError::invalid_config(format!(
                "period must be finite and non-zero, got: {}",
                self.period
            )));
        }
        if !(0.0..=1.0).contains(&self.spike_probability) {
            return Err(GuardError::invalid_config(format!(
                "spike_probability must be within [0, 1], got: {}",
                self.spike_probability
            )));
        }
        if !self.spike_min.is_finite()
            || !self.spike_max.is_finite()
            || self.spike_min >= self.spike_max
        {
            return Err(GuardError::invalid_config(format!(
                "spike range is empty: {}..{}",
                self.spike_min, self.spike_max
            )));
        }
        Ok(())
    }
}

/// Infinite seasonal signal with Gaussian noise and random upward spikes,
/// clamped to be non-negative.
///
/// Non-restartable: each sample advances the internal tick and RNG.
pub struct SyntheticSource {
    params: SyntheticParams,
    noise: Normal<f64>,
    rng: StdRng,
    tick: u64,
}

impl SyntheticSource {
    /// Creates a source. A seed makes the sequence reproducible; `None` seeds
    /// from OS entropy.
    ///
    /// # Errors
    /// Returns an error if the parameters do not describe a valid signal.
    pub fn new(params: SyntheticParams, seed: Option<u64>) -> Result<Self> {
        params.validate()?;
        let noise = Normal::new(0.0, params.noise_std_dev)
            .map_err(|e| GuardError::invalid_config(format!("noise_std_dev: {e}")))?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            params,
            noise,
            rng,
            tick: 0,
        })
    }

    /// Source with default parameters and the given seed.
    pub fn seeded(seed: u64) -> Result<Self> {
        Self::new(SyntheticParams::default(), Some(seed))
    }

    pub fn params(&self) -> &SyntheticParams {
        &self.params
    }

    fn generate(&mut self) -> f64 {
        let seasonal = self.params.amplitude * (self.tick as f64 / self.params.period).sin();
        let noise = self.noise.sample(&mut self.rng);
        let spike = if self.rng.random::<f64>() < self.params.spike_probability {
            self.rng
                .random_range(self.params.spike_min..self.params.spike_max)
        } else {
            0.0
        };
        (seasonal + noise + spike).max(0.0)
    }
}

impl Iterator for SyntheticSource {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let value = self.generate();
        let sample = Sample::new(self.tick, value);
        self.tick += 1;
        Some(sample)
    }
}

/// Replays a sequence of values, stamping them `0, 1, 2, ...`.
#[derive(Debug, Clone)]
pub struct ReplaySource<I> {
    values: I,
    tick: u64,
}

impl<I: Iterator<Item = f64>> ReplaySource<I> {
    pub fn new(values: impl IntoIterator<Item = f64, IntoIter = I>) -> Self {
        Self {
            values: values.into_iter(),
            tick: 0,
        }
    }
}

impl<I: Iterator<Item = f64>> Iterator for ReplaySource<I> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let value = self.values.next()?;
        let sample = Sample::new(self.tick, value);
        self.tick += 1;
        Some(sample)
    }
}
