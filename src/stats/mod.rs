//! Two-sample location tests used by the monitoring simulator
//!
//! - [`RunningMoments`]: Welford accumulator so each interim look is O(1)
//! - [`welch_t_test`] / [`student_t_test`]: t-tests from running moments
//! - [`mann_whitney_u`]: rank-sum test for skewed continuous metrics

mod moments;
mod rank;
mod ttest;

pub use moments::RunningMoments;
pub use rank::{mann_whitney_u, RankAccumulator, RankTest};
pub use ttest::{student_t_test, two_sided_pvalue, welch_t_test, TTest};

use crate::error::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which two-sample test is applied at every look
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationTest {
    /// Welch's unequal-variance t-test (default)
    #[default]
    Welch,
    /// Student's pooled-variance t-test
    Student,
    /// Mann-Whitney-Wilcoxon rank-sum test
    MannWhitney,
}

impl LocationTest {
    /// Two-sided p-value for the current prefixes.
    ///
    /// The t-tests read only the moments; Mann-Whitney reads the rank accumulator.
    pub fn pvalue(
        self,
        control_moments: &RunningMoments,
        variant_moments: &RunningMoments,
        ranks: &RankAccumulator,
    ) -> Result<f64> {
        match self {
            LocationTest::Welch => Ok(welch_t_test(control_moments, variant_moments)?.pvalue),
            LocationTest::Student => Ok(student_t_test(control_moments, variant_moments)?.pvalue),
            LocationTest::MannWhitney => Ok(ranks.test()?.pvalue),
        }
    }

    /// Whether the test needs the raw observations rather than moments
    pub fn needs_observations(self) -> bool {
        matches!(self, LocationTest::MannWhitney)
    }
}

impl fmt::Display for LocationTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LocationTest::Welch => "welch",
            LocationTest::Student => "student",
            LocationTest::MannWhitney => "mann-whitney",
        };
        f.write_str(name)
    }
}
