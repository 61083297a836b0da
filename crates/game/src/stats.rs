//! Streaming statistics

use serde::{Deserialize, Serialize};

/// Two-sided confidence level for normal-approximation intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    P90,
    #[default]
    P95,
    P99,
}

impl ConfidenceLevel {
    /// Standard normal quantile for this level
    pub fn z(self) -> f64 {
        match self {
            ConfidenceLevel::P90 => 1.645,
            ConfidenceLevel::P95 => 1.960,
            ConfidenceLevel::P99 => 2.576,
        }
    }
}

/// Welford running mean and variance
///
/// A plain value: updates produce a new value, so it can sit behind an
/// atomically swapped pointer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics over `values`
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        values
            .into_iter()
            .fold(Self::new(), |stats, v| stats.with_sample(v))
    }

    /// Copy of these statistics with one more sample folded in
    pub fn with_sample(mut self, value: f64) -> Self {
        self.push(value);
        self
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Arithmetic mean, 0 without samples
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sum of squared deviations from the mean
    pub fn m2(&self) -> f64 {
        self.m2
    }

    /// Sample variance (n - 1 denominator), 0 below two samples
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        self.m2 / (self.count - 1) as f64
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Standard error of the mean
    pub fn std_error(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.std_dev() / (self.count as f64).sqrt()
    }

    /// Normal-approximation interval around the mean, `None` below two samples
    pub fn confidence_interval(&self, level: ConfidenceLevel) -> Option<(f64, f64)> {
        if self.count < 2 {
            return None;
        }
        let half_width = level.z() * self.std_error();
        Some((self.mean - half_width, self.mean + half_width))
    }
}
