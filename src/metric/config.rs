// Configuration for post-experiment metric comparison
//
// A single fixed-horizon look at a continuous metric: one t-test, one rank
// test and a bootstrap interval, all judged at the same significance level.

use crate::config::validate_alpha;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for comparing a control and a variant metric sample
///
/// # Example
/// ```
/// use peekbias::metric::MetricConfig;
///
/// let config = MetricConfig::default();
/// assert_eq!(config.significance_level, 0.05); // 95% confidence
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    /// Statistical significance level (alpha) for hypothesis testing
    ///
    /// - 0.05 (default): 95% confidence level
    /// - 0.01: stricter, fewer false positives, more false negatives
    /// - 0.10: looser, more false positives, fewer false negatives
    ///
    /// Only valid for a single look. Checking the same metric repeatedly while
    /// the experiment runs inflates the realized false-positive rate well past
    /// this value (see `peeking`).
    pub significance_level: f64,

    /// Minimum observations per arm
    ///
    /// T-tests require at least 2 per arm; the default asks for more so the
    /// normal approximations behind Welch and Mann-Whitney hold.
    pub min_sample_size: usize,

    /// Pool variances (Student's t-test) instead of Welch's test
    pub equal_variance: bool,

    /// Bootstrap resamples for the standard error of the mean difference
    pub bootstrap_resamples: usize,

    /// Seed for the bootstrap; `None` uses OS entropy
    pub seed: Option<u64>,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            min_sample_size: 5,
            equal_variance: false,
            bootstrap_resamples: 1000,
            seed: None,
        }
    }
}

impl MetricConfig {
    /// Create a strict configuration (fewer false positives, more false negatives)
    pub fn strict() -> Self {
        Self {
            significance_level: 0.01,
            min_sample_size: 30,
            bootstrap_resamples: 5000,
            ..Self::default()
        }
    }

    /// Create a permissive configuration (more false positives, fewer false negatives)
    pub fn permissive() -> Self {
        Self {
            significance_level: 0.10,
            min_sample_size: 3,
            bootstrap_resamples: 500,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_alpha(self.significance_level)?;

        if self.min_sample_size < 2 {
            return Err(Error::Config(format!(
                "min_sample_size must be >= 2 for t-test, got {}",
                self.min_sample_size
            )));
        }

        if self.bootstrap_resamples < 2 {
            return Err(Error::Config(format!(
                "bootstrap_resamples must be >= 2, got {}",
                self.bootstrap_resamples
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricConfig::default();
        assert_eq!(config.significance_level, 0.05);
        assert_eq!(config.min_sample_size, 5);
        assert!(!config.equal_variance);
        assert_eq!(config.bootstrap_resamples, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strict_config() {
        let config = MetricConfig::strict();
        assert_eq!(config.significance_level, 0.01);
        assert_eq!(config.min_sample_size, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_permissive_config() {
        let config = MetricConfig::permissive();
        assert_eq!(config.significance_level, 0.10);
        assert_eq!(config.min_sample_size, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_significance_level() {
        let config = MetricConfig {
            significance_level: 1.5,
            ..MetricConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidAlpha(_))));
    }

    #[test]
    fn test_invalid_min_sample_size() {
        let config = MetricConfig {
            min_sample_size: 1,
            ..MetricConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_resamples() {
        let config = MetricConfig {
            bootstrap_resamples: 0,
            ..MetricConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
