// Configuration for monitoring-bias simulations
//
// Every knob is plain numeric data. A config can come from `Default`, from a
// named preset, or from a TOML file with `[simulation]` and `[metric]`
// tables; CLI flags are layered on top by the binary.

use crate::error::{Error, Result};
use crate::metric::MetricConfig;
use crate::peeking::LookSchedule;
use crate::stats::LocationTest;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Normal population both arms are drawn from
///
/// Control and variant always share these parameters, so the null
/// hypothesis holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Population {
    pub mean: f64,
    pub std_dev: f64,
}

impl Population {
    /// Validated population parameters
    pub fn new(mean: f64, std_dev: f64) -> Result<Self> {
        let population = Self { mean, std_dev };
        population.validate()?;
        Ok(population)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mean.is_finite() {
            return Err(Error::InvalidMean(self.mean));
        }
        if !(self.std_dev.is_finite() && self.std_dev > 0.0) {
            return Err(Error::InvalidStdDev(self.std_dev));
        }
        Ok(())
    }

    /// Analytical standard error of a sample mean of size `n`
    pub fn standard_error(&self, n: usize) -> f64 {
        self.std_dev / (n as f64).sqrt()
    }
}

/// Configuration for the peeking simulation
///
/// # Example
/// ```
/// use peekbias::config::SimulationConfig;
///
/// let config = SimulationConfig::default();
/// assert_eq!(config.n_trials, 300);
/// assert_eq!(config.alpha, 0.05);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Population mean shared by both arms
    pub mean: f64,

    /// Population standard deviation shared by both arms (> 0)
    pub std_dev: f64,

    /// Independent trials per sample-size budget
    ///
    /// Monte Carlo error of the FPR estimate shrinks as 1/sqrt(n_trials).
    pub n_trials: usize,

    /// Nominal Type-I error rate each individual look is calibrated to
    pub alpha: f64,

    /// Test applied at every look
    pub test: LocationTest,

    /// Look after every observation, or once at the horizon
    pub schedule: LookSchedule,

    /// Master seed; `None` draws one from the OS and logs it
    pub seed: Option<u64>,

    /// Worker threads sharing the trials of one budget
    ///
    /// Results do not depend on this value.
    pub workers: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mean: 5.0,
            std_dev: 1.0,
            n_trials: 300,
            alpha: 0.05,
            test: LocationTest::Welch,
            schedule: LookSchedule::Continuous,
            seed: None,
            workers: 1,
        }
    }
}

impl SimulationConfig {
    /// Fast, noisy estimate for interactive use
    pub fn quick() -> Self {
        Self {
            n_trials: 100,
            ..Self::default()
        }
    }

    /// Tight Monte Carlo error (about +/- 0.01 at FPR 0.3)
    pub fn thorough() -> Self {
        Self {
            n_trials: 2000,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            ..Self::default()
        }
    }

    pub fn population(&self) -> Population {
        Population {
            mean: self.mean,
            std_dev: self.std_dev,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.population().validate()?;

        if self.n_trials == 0 {
            return Err(Error::InvalidTrials(self.n_trials));
        }

        validate_alpha(self.alpha)?;

        if self.workers == 0 {
            return Err(Error::Config("workers must be >= 1".to_string()));
        }

        Ok(())
    }
}

/// Alpha must lie strictly inside (0, 1)
pub fn validate_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidAlpha(alpha))
    }
}

/// Contents of a `peekbias.toml` file
///
/// ```toml
/// [simulation]
/// n_trials = 2000
/// alpha = 0.01
/// seed = 7
///
/// [metric]
/// bootstrap_resamples = 5000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub simulation: SimulationConfig,
    pub metric: MetricConfig,
}

impl FileConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: FileConfig = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.simulation.validate()?;
        config.metric.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&text)
    }
}
