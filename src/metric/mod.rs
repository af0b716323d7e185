// Fixed-horizon comparison of observed metric samples
//
// The counterpart to `peeking`: one look, taken after the experiment ends,
// at a control and a variant sample of a continuous metric.
//
// Implementation:
// - Uses aprender (crates.io) for the Welch/Student t-test
// - Uses trueno (crates.io) for SIMD-optimized vector statistics
// - Uses aprender's DescriptiveStats for quantiles and median calculation
// - Mann-Whitney U from `stats` as a distribution-free cross-check
// - Bootstrap standard errors to sanity-check the analytical s / sqrt(n)

mod bootstrap;
mod compare;
mod config;
mod observations;
mod verdict;

pub use bootstrap::{
    analytical_difference_standard_error, analytical_standard_error,
    bootstrap_difference_standard_error, bootstrap_standard_error, standard_error_check,
    StandardErrorCheck,
};
pub use compare::{compare_distributions, median, StatisticalTest};
pub use config::MetricConfig;
pub use observations::{parse_observations, read_observations};
pub use verdict::{assess_metric, DifferenceStandardError, MetricAssessment, MetricVerdict};
