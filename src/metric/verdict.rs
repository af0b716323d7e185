// Metric verdict assessment for a finished A/B test
//
// The configured t-test (aprender's Welch or Student) alone decides the
// verdict, so a single look keeps its nominal Type I error rate. Mann-Whitney
// and the bootstrap standard error are reported alongside as diagnostics.

use crate::metric::bootstrap::{
    analytical_difference_standard_error, bootstrap_difference_standard_error,
};
use crate::metric::compare::{compare_distributions, StatisticalTest};
use crate::metric::config::MetricConfig;
use crate::stats::{mann_whitney_u, RankTest};
use anyhow::Result;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Final verdict for a control/variant metric comparison
#[derive(Debug, Clone, PartialEq)]
pub enum MetricVerdict {
    /// The t-test did not reject the null
    NoDifference,

    /// The t-test rejected the null (p < significance_level)
    Significant {
        /// Deciding test ("welch" or "student")
        test: String,
        /// Variant mean minus control mean
        mean_difference: f32,
    },

    /// Not enough data to make statistical determination
    InsufficientData { reason: String },
}

/// Standard errors of the mean difference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferenceStandardError {
    pub analytical: f32,
    pub bootstrap: f32,
}

/// Detailed metric assessment result
#[derive(Debug, Clone)]
pub struct MetricAssessment {
    /// Final verdict
    pub verdict: MetricVerdict,

    /// t-test result, if it could be computed
    pub t_test: Option<StatisticalTest>,

    /// Mann-Whitney result, if it could be computed (diagnostic only)
    pub rank_test: Option<RankTest>,

    /// Analytical and bootstrap SE of the mean difference
    pub standard_error: Option<DifferenceStandardError>,

    /// Observations per arm
    pub control_size: usize,
    pub variant_size: usize,

    /// Configuration used for assessment
    pub config: MetricConfig,
}

impl MetricAssessment {
    fn t_test_name(&self) -> &'static str {
        if self.config.equal_variance {
            "student"
        } else {
            "welch"
        }
    }

    /// t interval for the mean difference at `1 - significance_level`
    ///
    /// Uses the deciding t-test's own standard error and degrees of freedom,
    /// so the interval excludes zero exactly when the verdict is significant.
    pub fn confidence_interval(&self) -> Option<(f32, f32)> {
        let t_test = self.t_test.as_ref()?;
        let diff = f64::from(t_test.mean_difference());
        let t = f64::from(t_test.statistic);
        let se = if t.abs() > f64::EPSILON {
            (diff / t).abs()
        } else {
            f64::from(self.standard_error?.analytical)
        };
        let quantile = StudentsT::new(0.0, 1.0, f64::from(t_test.df))
            .ok()?
            .inverse_cdf(1.0 - self.config.significance_level / 2.0);
        let half_width = quantile * se;
        Some(((diff - half_width) as f32, (diff + half_width) as f32))
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        match &self.verdict {
            MetricVerdict::NoDifference => {
                report.push_str("✅ NO SIGNIFICANT DIFFERENCE\n\n");
            }
            MetricVerdict::Significant {
                test,
                mean_difference,
            } => {
                report.push_str(&format!("❌ SIGNIFICANT DIFFERENCE ({})\n\n", test));
                report.push_str(&format!("Mean difference: {:+.4}\n", mean_difference));
            }
            MetricVerdict::InsufficientData { reason } => {
                report.push_str("⚠️  INSUFFICIENT DATA\n\n");
                report.push_str(&format!("Reason: {}\n", reason));
            }
        }

        report.push_str(&format!(
            "Observations: control={}, variant={}\n",
            self.control_size, self.variant_size
        ));
        report.push_str(&format!(
            "Significance level: {} ({}% confidence, single look)\n",
            self.config.significance_level,
            (1.0 - self.config.significance_level) * 100.0
        ));

        if self.t_test.is_some() || self.rank_test.is_some() {
            report.push_str("\n📊 Statistical Tests:\n");
        }
        if let Some(test) = &self.t_test {
            report.push_str(&format!(
                "  {} (t={:.3}, df={:.1}, p={:.4}, control_mean={:.3}, variant_mean={:.3})\n",
                self.t_test_name(),
                test.statistic,
                test.df,
                test.pvalue,
                test.control_mean,
                test.variant_mean
            ));
            report.push_str(&format!(
                "  medians (control={:.3}, variant={:.3})\n",
                test.control_median, test.variant_median
            ));
        }
        if let Some(test) = &self.rank_test {
            report.push_str(&format!(
                "  mann-whitney (U={:.1}, z={:.3}, p={:.4}, diagnostic)\n",
                test.statistic, test.z, test.pvalue
            ));
        }

        if let Some(se) = &self.standard_error {
            report.push_str(&format!(
                "\n📏 Standard error of difference: analytical={:.4}, bootstrap={:.4} ({} resamples)\n",
                se.analytical, se.bootstrap, self.config.bootstrap_resamples
            ));
        }
        if let Some((lo, hi)) = self.confidence_interval() {
            report.push_str(&format!(
                "   {:.0}% t interval for difference: [{:+.4}, {:+.4}]\n",
                (1.0 - self.config.significance_level) * 100.0,
                lo,
                hi
            ));
        }

        report
    }
}

/// Assess whether a variant moved a continuous metric
///
/// # Arguments
/// * `control` - Metric values from the control arm
/// * `variant` - Metric values from the variant arm
/// * `config` - Significance level, minimum sample size, bootstrap settings
///
/// # Example
/// ```
/// use peekbias::metric::{assess_metric, MetricConfig, MetricVerdict};
///
/// let control = vec![10.0, 11.0, 10.0, 12.0, 10.0, 11.0];
/// let variant = vec![10.0, 11.0, 10.0, 13.0, 10.0, 11.0];
///
/// let config = MetricConfig { seed: Some(1), ..MetricConfig::default() };
/// let assessment = assess_metric(&control, &variant, &config).unwrap();
/// assert_eq!(assessment.verdict, MetricVerdict::NoDifference);
/// ```
pub fn assess_metric(
    control: &[f32],
    variant: &[f32],
    config: &MetricConfig,
) -> Result<MetricAssessment> {
    config.validate()?;

    let mut assessment = MetricAssessment {
        verdict: MetricVerdict::NoDifference,
        t_test: None,
        rank_test: None,
        standard_error: None,
        control_size: control.len(),
        variant_size: variant.len(),
        config: config.clone(),
    };

    if control.len() < config.min_sample_size || variant.len() < config.min_sample_size {
        assessment.verdict = MetricVerdict::InsufficientData {
            reason: format!(
                "need at least {} observations per arm (control={}, variant={})",
                config.min_sample_size,
                control.len(),
                variant.len()
            ),
        };
        return Ok(assessment);
    }

    match compare_distributions(control, variant, config.equal_variance) {
        Ok(test) => assessment.t_test = Some(test),
        Err(e) => {
            tracing::warn!("Failed to run t-test: {}", e);
        }
    }

    let control64: Vec<f64> = control.iter().map(|&x| f64::from(x)).collect();
    let variant64: Vec<f64> = variant.iter().map(|&x| f64::from(x)).collect();
    match mann_whitney_u(&control64, &variant64) {
        Ok(test) => assessment.rank_test = Some(test),
        Err(e) => {
            tracing::warn!("Failed to run Mann-Whitney test: {}", e);
        }
    }

    let seed = config
        .seed
        .unwrap_or_else(|| rand::rngs::OsRng.next_u64());
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let analytical = analytical_difference_standard_error(control, variant)?;
    let bootstrap =
        bootstrap_difference_standard_error(control, variant, config.bootstrap_resamples, &mut rng)?;
    assessment.standard_error = Some(DifferenceStandardError {
        analytical,
        bootstrap,
    });

    assessment.verdict = match &assessment.t_test {
        None => MetricVerdict::InsufficientData {
            reason: format!("{} t-test could not be computed", assessment.t_test_name()),
        },
        Some(test) if f64::from(test.pvalue) < config.significance_level => {
            MetricVerdict::Significant {
                test: assessment.t_test_name().to_string(),
                mean_difference: test.mean_difference(),
            }
        }
        Some(_) => MetricVerdict::NoDifference,
    };

    Ok(assessment)
}
