// Bootstrap and analytical standard errors for continuous metrics
//
// The bootstrap resamples each arm with replacement and takes the spread of
// the resampled means. For a well-behaved metric it should agree with the
// analytical s / sqrt(n); a large gap points at heavy tails or outliers.
//
// The true standard error of a sample mean is sigma / sqrt(n). It is
// compared to the estimates as-is, with no extra multiplier.

use crate::config::Population;
use anyhow::{Context, Result};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use trueno::Vector;

fn require_observations(sample: &[f32], what: &str) -> Result<()> {
    if sample.len() < 2 {
        anyhow::bail!(
            "Need at least 2 observations for {}, got {}",
            what,
            sample.len()
        );
    }
    Ok(())
}

/// Means of `resamples` bootstrap resamples of `sample`
fn resampled_means<R: Rng + ?Sized>(
    sample: &[f32],
    resamples: usize,
    rng: &mut R,
) -> Result<Vec<f32>> {
    let n = sample.len();
    let mut buffer = vec![0.0f32; n];
    let mut means = Vec::with_capacity(resamples);
    for _ in 0..resamples {
        for slot in buffer.iter_mut() {
            *slot = sample[rng.gen_range(0..n)];
        }
        let mean = Vector::from_slice(&buffer)
            .mean()
            .context("Failed to compute resample mean")?;
        means.push(mean);
    }
    Ok(means)
}

/// Bootstrap standard error of the sample mean
///
/// Standard deviation of the means of `resamples` resamples drawn with
/// replacement.
pub fn bootstrap_standard_error<R: Rng + ?Sized>(
    sample: &[f32],
    resamples: usize,
    rng: &mut R,
) -> Result<f32> {
    require_observations(sample, "bootstrap")?;
    if resamples < 2 {
        anyhow::bail!("Need at least 2 bootstrap resamples, got {}", resamples);
    }

    let means = resampled_means(sample, resamples, rng)?;
    Vector::from_slice(&means)
        .stddev()
        .context("Failed to compute bootstrap spread")
}

/// Bootstrap standard error of `mean(variant) - mean(control)`
///
/// Arms are resampled independently, matching an unpaired A/B design.
pub fn bootstrap_difference_standard_error<R: Rng + ?Sized>(
    control: &[f32],
    variant: &[f32],
    resamples: usize,
    rng: &mut R,
) -> Result<f32> {
    require_observations(control, "bootstrap")?;
    require_observations(variant, "bootstrap")?;
    if resamples < 2 {
        anyhow::bail!("Need at least 2 bootstrap resamples, got {}", resamples);
    }

    let control_means = resampled_means(control, resamples, rng)?;
    let variant_means = resampled_means(variant, resamples, rng)?;
    let differences: Vec<f32> = variant_means
        .iter()
        .zip(&control_means)
        .map(|(v, c)| v - c)
        .collect();

    Vector::from_slice(&differences)
        .stddev()
        .context("Failed to compute bootstrap spread")
}

/// Sample variance with Bessel's correction
fn sample_variance(sample: &[f32]) -> Result<f32> {
    let n = sample.len() as f32;
    // trueno's variance divides by n
    let population = Vector::from_slice(sample)
        .variance()
        .context("Failed to compute variance")?;
    Ok(population * n / (n - 1.0))
}

/// Analytical standard error of the mean, `s / sqrt(n)`
pub fn analytical_standard_error(sample: &[f32]) -> Result<f32> {
    require_observations(sample, "standard error")?;
    Ok((sample_variance(sample)? / sample.len() as f32).sqrt())
}

/// Analytical standard error of a difference in means, `sqrt(s1^2/n1 + s2^2/n2)`
pub fn analytical_difference_standard_error(control: &[f32], variant: &[f32]) -> Result<f32> {
    require_observations(control, "standard error")?;
    require_observations(variant, "standard error")?;
    let vc = sample_variance(control)? / control.len() as f32;
    let vv = sample_variance(variant)? / variant.len() as f32;
    Ok((vc + vv).sqrt())
}

/// True, analytical and bootstrap standard errors of one simulated sample
#[derive(Debug, Clone, PartialEq)]
pub struct StandardErrorCheck {
    pub n: usize,
    pub resamples: usize,
    /// `sigma / sqrt(n)` from the generating population
    pub true_se: f32,
    /// `s / sqrt(n)` from the drawn sample
    pub analytical_se: f32,
    /// Spread of bootstrap resample means
    pub bootstrap_se: f32,
}

impl StandardErrorCheck {
    /// `|estimate - true| / true`
    pub fn relative_error(&self, estimate: f32) -> f32 {
        (estimate - self.true_se).abs() / self.true_se
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!(
            "Standard error of the mean (n = {}, {} bootstrap resamples)\n\n",
            self.n, self.resamples
        ));
        report.push_str(&format!("  true        {:.6}\n", self.true_se));
        report.push_str(&format!(
            "  analytical  {:.6}  ({:.2}% off)\n",
            self.analytical_se,
            self.relative_error(self.analytical_se) * 100.0
        ));
        report.push_str(&format!(
            "  bootstrap   {:.6}  ({:.2}% off)\n",
            self.bootstrap_se,
            self.relative_error(self.bootstrap_se) * 100.0
        ));
        report
    }
}

/// Draw `n` observations from `population` and compare standard errors
pub fn standard_error_check<R: Rng + ?Sized>(
    n: usize,
    population: Population,
    resamples: usize,
    rng: &mut R,
) -> Result<StandardErrorCheck> {
    population.validate()?;
    let normal = Normal::new(population.mean as f32, population.std_dev as f32)
        .context("Invalid population")?;
    let sample: Vec<f32> = (0..n).map(|_| normal.sample(&mut *rng)).collect();

    Ok(StandardErrorCheck {
        n,
        resamples,
        true_se: population.standard_error(n) as f32,
        analytical_se: analytical_standard_error(&sample)?,
        bootstrap_se: bootstrap_standard_error(&sample, resamples, rng)?,
    })
}
