// Mann-Whitney-Wilcoxon rank-sum test
//
// Nonparametric alternative to the t-test for continuous metrics with heavy
// tails (revenue per user, session length). Uses the normal approximation
// with tie correction and a 0.5 continuity correction, two-sided.

use crate::error::{Error, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// Outcome of a Mann-Whitney U test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankTest {
    /// U statistic of the control arm
    pub statistic: f64,

    /// Standardized statistic after continuity correction
    pub z: f64,

    /// Two-sided p-value, always in [0, 1]
    pub pvalue: f64,
}

/// Mann-Whitney U test of `control` against `variant`
///
/// # Example
/// ```
/// use peekbias::stats::mann_whitney_u;
///
/// let control = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
/// let variant = [11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0];
/// let test = mann_whitney_u(&control, &variant).unwrap();
/// assert_eq!(test.statistic, 0.0);
/// assert!(test.pvalue < 0.01);
/// ```
pub fn mann_whitney_u(control: &[f64], variant: &[f64]) -> Result<RankTest> {
    let n1 = control.len();
    let n2 = variant.len();
    if n1 == 0 || n2 == 0 {
        return Err(Error::InsufficientData(format!(
            "Mann-Whitney needs at least 1 observation per arm, got {n1} and {n2}"
        )));
    }

    let (control_rank_sum, tie_term) = rank_sum(control, variant);
    let n1f = n1 as f64;
    let u1 = control_rank_sum - n1f * (n1f + 1.0) / 2.0;

    rank_test_from_u(u1, n1, n2, tie_term)
}

/// Normal approximation for a U statistic with tie term `sum(t^3 - t)`
fn rank_test_from_u(u1: f64, n1: usize, n2: usize, tie_term: f64) -> Result<RankTest> {
    let n1f = n1 as f64;
    let n2f = n2 as f64;
    let n = n1f + n2f;

    let mu = n1f * n2f / 2.0;
    let sigma2 = n1f * n2f / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if sigma2 <= 0.0 || !sigma2.is_finite() {
        // Every observation tied
        return Ok(RankTest {
            statistic: u1,
            z: 0.0,
            pvalue: 1.0,
        });
    }

    let u = u1.max(n1f * n2f - u1);
    let z = (u - mu - 0.5) / sigma2.sqrt();

    let normal = Normal::new(0.0, 1.0).map_err(|e| Error::Distribution(e.to_string()))?;
    let pvalue = (2.0 * normal.sf(z)).clamp(0.0, 1.0);

    Ok(RankTest {
        statistic: u1,
        z,
        pvalue,
    })
}

/// Incrementally maintained Mann-Whitney statistic
///
/// Each arm is kept sorted. A new observation adds its pair count against
/// the other arm to U (ties count one half) and its tie group growth to the
/// tie term, so a look costs O(log k) plus the insertion shift instead of
/// re-ranking the whole pooled prefix.
#[derive(Debug, Clone, Default)]
pub struct RankAccumulator {
    control: Vec<f64>,
    variant: Vec<f64>,
    u1: f64,
    tie_term: f64,
}

/// `(count < x, count == x)` in a sorted slice
fn count_below_and_equal(sorted: &[f64], x: f64) -> (usize, usize) {
    let below = sorted.partition_point(|&y| y < x);
    let not_above = sorted.partition_point(|&y| y <= x);
    (below, not_above - below)
}

impl RankAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            control: Vec::with_capacity(capacity),
            variant: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn from_slices(control: &[f64], variant: &[f64]) -> Self {
        let mut ranks = Self::with_capacity(control.len().max(variant.len()));
        for &x in control {
            ranks.push_control(x);
        }
        for &x in variant {
            ranks.push_variant(x);
        }
        ranks
    }

    fn grow_tie_group(&mut self, x: f64) -> (usize, usize, usize, usize) {
        let (control_below, control_equal) = count_below_and_equal(&self.control, x);
        let (variant_below, variant_equal) = count_below_and_equal(&self.variant, x);
        // t^3 - t grows by 3t^2 + 3t when a group of t gains one member
        let t = (control_equal + variant_equal) as f64;
        self.tie_term += 3.0 * t * t + 3.0 * t;
        (control_below, control_equal, variant_below, variant_equal)
    }

    pub fn push_control(&mut self, x: f64) {
        let (control_below, _, variant_below, variant_equal) = self.grow_tie_group(x);
        self.u1 += variant_below as f64 + 0.5 * variant_equal as f64;
        self.control.insert(control_below, x);
    }

    pub fn push_variant(&mut self, x: f64) {
        let (control_below, control_equal, variant_below, _) = self.grow_tie_group(x);
        let control_above = self.control.len() - control_below - control_equal;
        self.u1 += control_above as f64 + 0.5 * control_equal as f64;
        self.variant.insert(variant_below, x);
    }

    pub fn control_len(&self) -> usize {
        self.control.len()
    }

    pub fn variant_len(&self) -> usize {
        self.variant.len()
    }

    /// Mann-Whitney U test over everything pushed so far
    pub fn test(&self) -> Result<RankTest> {
        let (n1, n2) = (self.control.len(), self.variant.len());
        if n1 == 0 || n2 == 0 {
            return Err(Error::InsufficientData(format!(
                "Mann-Whitney needs at least 1 observation per arm, got {n1} and {n2}"
            )));
        }
        rank_test_from_u(self.u1, n1, n2, self.tie_term)
    }
}

/// Sum of midranks of the control arm and the tie term `sum(t^3 - t)`.
fn rank_sum(control: &[f64], variant: &[f64]) -> (f64, f64) {
    let mut pooled: Vec<(f64, bool)> = control
        .iter()
        .map(|&x| (x, true))
        .chain(variant.iter().map(|&x| (x, false)))
        .collect();
    pooled.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut control_rank_sum = 0.0;
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < pooled.len() {
        let mut j = i + 1;
        while j < pooled.len() && pooled[j].0 == pooled[i].0 {
            j += 1;
        }
        // Ranks i+1 ..= j share their average
        let midrank = (i + 1 + j) as f64 / 2.0;
        let ties = (j - i) as f64;
        tie_term += ties * ties * ties - ties;
        control_rank_sum += midrank * pooled[i..j].iter().filter(|(_, c)| *c).count() as f64;
        i = j;
    }

    (control_rank_sum, tie_term)
}
