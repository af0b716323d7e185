//! Error types for peekbias
//!
//! Every variant is a fail-fast configuration or data problem. Nothing here
//! is retried: a bad parameter aborts the enclosing trial or sweep.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Simulation and comparison errors
#[derive(Error, Debug)]
pub enum Error {
    /// Sample-size budget below the minimum a two-sample test needs
    #[error("sample_size must be >= 2, got {0}")]
    InvalidSampleSize(usize),

    /// Trial count of zero
    #[error("n_trials must be >= 1, got {0}")]
    InvalidTrials(usize),

    /// Alpha outside the open interval (0, 1)
    #[error("alpha must be in (0, 1), got {0}")]
    InvalidAlpha(f64),

    /// Zero, negative or non-finite spread is not a valid generative model
    #[error("std_dev must be finite and > 0, got {0}")]
    InvalidStdDev(f64),

    /// Non-finite population mean
    #[error("mean must be finite, got {0}")]
    InvalidMean(f64),

    /// Sample-size grid that cannot be built or swept
    #[error("invalid sample-size grid: {0}")]
    InvalidGrid(String),

    /// Too few observations for the requested statistic
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// statrs refused to construct a distribution
    #[error("distribution error: {0}")]
    Distribution(String),

    /// A trial worker thread panicked
    #[error("simulation worker thread panicked")]
    WorkerPanicked,

    /// Config file could not be read or parsed
    #[error("config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
