//! Streaming mean and variance using Welford's algorithm.
//!
//! A monitored A/B test adds one observation per arm per look, so the
//! t-statistics are computed from these accumulators in O(1) per look
//! instead of rescanning every prefix.

/// Running count, mean and sum of squared deviations.
///
/// # Example
///
/// ```
/// use peekbias::stats::RunningMoments;
///
/// let mut moments = RunningMoments::new();
/// for x in [2.0, 4.0, 6.0, 8.0] {
///     moments.push(x);
/// }
/// assert_eq!(moments.count(), 4);
/// assert!((moments.mean() - 5.0).abs() < 1e-12);
/// assert!((moments.variance() - 20.0 / 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMoments {
    count: usize,
    mean: f64,
    /// Welford's M2: sum of squared deviations from the current mean.
    m2: f64,
}

impl RunningMoments {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an accumulator from a batch of observations.
    pub fn from_slice(values: &[f64]) -> Self {
        let mut moments = Self::new();
        for &x in values {
            moments.push(x);
        }
        moments
    }

    /// Add one observation.
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    /// Number of observations seen.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Running mean (0.0 when empty).
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance with Bessel's correction (n - 1).
    ///
    /// Returns 0.0 with fewer than two observations.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        // m2 can drift a hair below zero for constant input
        (self.m2 / (self.count - 1) as f64).max(0.0)
    }

    /// Variance of the sample mean, `s^2 / n`.
    pub fn mean_variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.variance() / self.count as f64
    }
}
