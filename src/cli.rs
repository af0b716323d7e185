//! CLI argument parsing for peekbias

use crate::config::SimulationConfig;
use crate::metric::MetricConfig;
use crate::peeking::{log_grid, LookSchedule};
use crate::stats::LocationTest;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for result curves
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "peekbias")]
#[command(version)]
#[command(
    about = "Simulate false-positive inflation from peeking at running A/B tests",
    long_about = None
)]
pub struct Cli {
    /// Enable debug tracing output (to stderr)
    #[arg(long, global = true)]
    pub debug: bool,

    /// TOML file with [simulation] and [metric] tables; flags override it
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub sim: SimulationArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct SimulationArgs {
    /// Master seed (drawn from the OS and logged when omitted)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Trials per sample-size budget
    #[arg(long, value_name = "N", global = true)]
    pub trials: Option<usize>,

    /// Nominal significance level
    #[arg(long, global = true)]
    pub alpha: Option<f64>,

    /// Population mean shared by both arms
    #[arg(long, allow_hyphen_values = true, global = true)]
    pub mean: Option<f64>,

    /// Population standard deviation shared by both arms
    #[arg(long = "std-dev", global = true)]
    pub std_dev: Option<f64>,

    /// Test applied at each look
    #[arg(long, value_enum, global = true)]
    pub test: Option<LocationTest>,

    /// When to look at the data
    #[arg(long, value_enum, global = true)]
    pub schedule: Option<LookSchedule>,

    /// Worker threads per budget
    #[arg(long, global = true)]
    pub workers: Option<usize>,
}

impl SimulationArgs {
    /// Layer the flags that were given on top of `config`
    pub fn apply(&self, config: &mut SimulationConfig) {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(trials) = self.trials {
            config.n_trials = trials;
        }
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(mean) = self.mean {
            config.mean = mean;
        }
        if let Some(std_dev) = self.std_dev {
            config.std_dev = std_dev;
        }
        if let Some(test) = self.test {
            config.test = test;
        }
        if let Some(schedule) = self.schedule {
            config.schedule = schedule;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
    }

    /// `--alpha` and `--seed` also drive metric comparisons
    pub fn apply_metric(&self, config: &mut MetricConfig) {
        if let Some(alpha) = self.alpha {
            config.significance_level = alpha;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(test) = self.test {
            config.equal_variance = test == LocationTest::Student;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Estimate the false-positive rate over a grid of sample sizes
    Sweep(SweepArgs),

    /// Continuous vs fixed-horizon false-positive rate for one sample size
    Simulate {
        /// Maximum paired observations per trial
        #[arg(short = 'n', long = "sample-size", default_value = "1000")]
        sample_size: usize,
    },

    /// Compare two files of metric observations at a single look
    Compare {
        /// Control arm observations, one number per line
        #[arg(long, value_name = "FILE")]
        control: PathBuf,

        /// Variant arm observations, one number per line
        #[arg(long, value_name = "FILE")]
        variant: PathBuf,

        /// Bootstrap resamples for the standard error
        #[arg(long)]
        resamples: Option<usize>,

        /// Minimum observations per arm
        #[arg(long = "min-sample-size")]
        min_sample_size: Option<usize>,
    },

    /// Compare true, analytical and bootstrap standard errors
    SeCheck {
        /// Sample size
        #[arg(short = 'n', long, default_value = "1000")]
        n: usize,

        /// Bootstrap resamples
        #[arg(long, default_value = "1000")]
        resamples: usize,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// Smallest sample size of the log-spaced grid (clamped to 2)
    #[arg(long, default_value = "1")]
    pub min: usize,

    /// Largest sample size of the log-spaced grid
    #[arg(long, default_value = "10000")]
    pub max: usize,

    /// Grid points before deduplication
    #[arg(long, default_value = "10")]
    pub points: usize,

    /// Explicit sample sizes instead of a grid (e.g., --sizes 10,100,1000)
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["min", "max", "points"])]
    pub sizes: Option<Vec<usize>>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write the curve to a file instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl SweepArgs {
    /// Explicit sizes as given, or the log grid clamped to at least 2
    pub fn sample_sizes(&self) -> crate::Result<Vec<usize>> {
        if let Some(sizes) = &self.sizes {
            return Ok(sizes.clone());
        }
        let mut grid: Vec<usize> = log_grid(self.min, self.max, self.points)?
            .into_iter()
            .map(|n| n.max(2))
            .collect();
        grid.dedup();
        Ok(grid)
    }
}
