// One-shot comparison of two observed metric samples using aprender
//
// This module wraps aprender's hypothesis testing and trueno's vector primitives
// to compare a control and a variant arm after an experiment has ended.
//
// - Welch's t-test (default) does not assume equal variances between arms
// - Student's t-test is available for the pooled-variance comparison
// - Uses trueno::Vector for SIMD-optimized statistics (mean, variance)
// - Uses aprender::stats::DescriptiveStats for quantiles/median

use anyhow::{Context, Result};
use aprender::stats::DescriptiveStats;
use trueno::Vector;

/// Result of a t-test between control and variant samples
#[derive(Debug, Clone)]
pub struct StatisticalTest {
    /// t-statistic value
    pub statistic: f32,

    /// p-value (two-tailed)
    pub pvalue: f32,

    /// Degrees of freedom
    pub df: f32,

    /// Mean of control arm
    pub control_mean: f32,

    /// Mean of variant arm
    pub variant_mean: f32,

    /// Median of control arm
    pub control_median: f32,

    /// Median of variant arm
    pub variant_median: f32,

    /// Population variance of control arm
    pub control_variance: f32,

    /// Population variance of variant arm
    pub variant_variance: f32,
}

impl StatisticalTest {
    /// Variant mean minus control mean
    pub fn mean_difference(&self) -> f32 {
        self.variant_mean - self.control_mean
    }

    /// Relative lift of the variant over the control mean
    ///
    /// `None` when the control mean is zero.
    pub fn relative_lift(&self) -> Option<f32> {
        (self.control_mean.abs() > f32::EPSILON)
            .then(|| self.mean_difference() / self.control_mean.abs())
    }
}

/// Compare two arms using aprender's independent t-test
///
/// # Arguments
/// * `control` - Metric values observed in the control arm
/// * `variant` - Metric values observed in the variant arm
/// * `equal_variance` - `false` for Welch's test, `true` for Student's
///
/// # Example
/// ```
/// use peekbias::metric::compare_distributions;
///
/// let control = vec![10.0, 12.0, 11.0, 13.0, 10.0];
/// let variant = vec![25.0, 27.0, 26.0, 28.0, 25.0];
///
/// let result = compare_distributions(&control, &variant, false).unwrap();
/// assert!(result.pvalue < 0.05);
/// assert!((result.mean_difference() - 15.0).abs() < 1e-4);
/// ```
pub fn compare_distributions(
    control: &[f32],
    variant: &[f32],
    equal_variance: bool,
) -> Result<StatisticalTest> {
    if control.is_empty() || variant.is_empty() {
        anyhow::bail!("Cannot compare empty samples");
    }

    if control.len() < 2 || variant.len() < 2 {
        anyhow::bail!("Need at least 2 observations per arm for t-test");
    }

    let ttest_result = aprender::stats::hypothesis::ttest_ind(control, variant, equal_variance)
        .context("Failed to compute t-test")?;

    let control_vec = Vector::from_slice(control);
    let variant_vec = Vector::from_slice(variant);

    Ok(StatisticalTest {
        statistic: ttest_result.statistic,
        pvalue: ttest_result.pvalue,
        df: ttest_result.df,
        control_mean: control_vec
            .mean()
            .context("Failed to compute control mean")?,
        variant_mean: variant_vec
            .mean()
            .context("Failed to compute variant mean")?,
        control_median: median(&control_vec)?,
        variant_median: median(&variant_vec)?,
        control_variance: control_vec
            .variance()
            .context("Failed to compute control variance")?,
        variant_variance: variant_vec
            .variance()
            .context("Failed to compute variant variance")?,
    })
}

/// Calculate median using aprender's DescriptiveStats
///
/// Uses aprender's quantile(0.5) (R-7 method).
pub fn median(vector: &Vector<f32>) -> Result<f32> {
    let stats = DescriptiveStats::new(vector);
    stats
        .quantile(0.5)
        .map_err(|e| anyhow::anyhow!("Failed to compute median: {}", e))
}
