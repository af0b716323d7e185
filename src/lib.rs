//! peekbias - Monte Carlo estimates of false-positive inflation from peeking
//!
//! An A/B test evaluated once at a fixed horizon keeps its false-positive
//! rate at the nominal alpha. Checking the running test after every new
//! observation and stopping at the first p < alpha does not. This library
//! simulates A/A experiments under both monitoring schedules and reports the
//! realized false-positive rate as a function of the sample-size budget.
//!
//! It also carries the fixed-horizon tooling that the simulation argues for:
//! a one-shot comparison of two observed metric samples with bootstrap
//! standard errors.
//!
//! # Example
//! ```
//! use peekbias::peeking::sweep;
//!
//! let curve = sweep(&[20, 200], 100, 0.05, 42).unwrap();
//! assert_eq!(curve.len(), 2);
//! assert!(curve.iter().all(|(_, fpr)| (0.0..=1.0).contains(&fpr)));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod metric;
pub mod peeking;
pub mod stats;

pub use error::{Error, Result};
