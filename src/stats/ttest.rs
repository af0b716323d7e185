// Two-sample t-tests computed from running moments
//
// Welch's unequal-variance test is the default for monitored experiments:
// control and variant are never assumed to share a variance, and the
// Welch-Satterthwaite degrees of freedom keep the single-look Type-I error
// at alpha even when the arms differ in spread.
//
// Student's pooled test is kept for comparison. At small n the two tests
// give different nominal baselines, which matters when looks start at k = 2.

use crate::error::{Error, Result};
use crate::stats::RunningMoments;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Outcome of a two-sample t-test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTest {
    /// t-statistic (control minus variant)
    pub statistic: f64,

    /// Degrees of freedom
    pub df: f64,

    /// Two-sided p-value, always in [0, 1]
    pub pvalue: f64,
}

impl TTest {
    /// A look with no spread in either arm carries no evidence against the null.
    fn degenerate(df: f64) -> Self {
        Self {
            statistic: 0.0,
            df,
            pvalue: 1.0,
        }
    }
}

fn require_two(a: &RunningMoments, b: &RunningMoments) -> Result<()> {
    if a.count() < 2 || b.count() < 2 {
        return Err(Error::InsufficientData(format!(
            "t-test needs at least 2 observations per arm, got {} and {}",
            a.count(),
            b.count()
        )));
    }
    Ok(())
}

/// Welch's unequal-variance t-test
///
/// A zero standard error (both prefixes constant) yields `p = 1.0`.
pub fn welch_t_test(control: &RunningMoments, variant: &RunningMoments) -> Result<TTest> {
    require_two(control, variant)?;

    let va = control.mean_variance();
    let vb = variant.mean_variance();
    let se2 = va + vb;
    let df_floor = (control.count() + variant.count() - 2) as f64;

    if se2 <= 0.0 || !se2.is_finite() {
        return Ok(TTest::degenerate(df_floor));
    }

    let statistic = (control.mean() - variant.mean()) / se2.sqrt();
    let df = se2 * se2
        / (va * va / (control.count() - 1) as f64 + vb * vb / (variant.count() - 1) as f64);

    Ok(TTest {
        statistic,
        df,
        pvalue: two_sided_pvalue(statistic, df)?,
    })
}

/// Student's pooled-variance t-test
pub fn student_t_test(control: &RunningMoments, variant: &RunningMoments) -> Result<TTest> {
    require_two(control, variant)?;

    let na = control.count() as f64;
    let nb = variant.count() as f64;
    let df = na + nb - 2.0;
    let pooled = ((na - 1.0) * control.variance() + (nb - 1.0) * variant.variance()) / df;
    let se2 = pooled * (1.0 / na + 1.0 / nb);

    if se2 <= 0.0 || !se2.is_finite() {
        return Ok(TTest::degenerate(df));
    }

    let statistic = (control.mean() - variant.mean()) / se2.sqrt();
    Ok(TTest {
        statistic,
        df,
        pvalue: two_sided_pvalue(statistic, df)?,
    })
}

/// `P(|T| >= |t|)` for a standard t distribution with `df` degrees of freedom
pub fn two_sided_pvalue(statistic: f64, df: f64) -> Result<f64> {
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| Error::Distribution(format!("StudentsT(df={df}): {e}")))?;
    let p = 2.0 * dist.sf(statistic.abs());
    Ok(p.clamp(0.0, 1.0))
}
