//! Result curve: empirical false-positive rate per sample-size budget
//!
//! Output formats follow the trace writers: a human-readable text report,
//! JSON via serde, and CSV for spreadsheets and plotting scripts.

use crate::error::{Error, Result};
use crate::peeking::simulate::Tally;
use crate::peeking::LookSchedule;
use crate::stats::LocationTest;
use serde::{Deserialize, Serialize};

/// Empirical FPR for one budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Maximum paired observations per trial
    pub sample_size: usize,
    /// Trials with at least one look below alpha
    pub significant_trials: usize,
    /// `significant_trials / n_trials`
    pub false_positive_rate: f64,
    /// Mean prefix length where significant trials stopped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_stopping_look: Option<f64>,
}

impl CurvePoint {
    pub fn from_tally(sample_size: usize, tally: &Tally) -> Self {
        Self {
            sample_size,
            significant_trials: tally.significant,
            false_positive_rate: tally.false_positive_rate(),
            mean_stopping_look: tally.mean_stopping_look(),
        }
    }
}

/// Ordered mapping from budget to empirical FPR
///
/// Points keep the order the budgets were swept in. `alpha` is carried so a
/// renderer can draw the nominal reference line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultCurve {
    pub alpha: f64,
    pub test: LocationTest,
    pub schedule: LookSchedule,
    pub n_trials: usize,
    pub seed: u64,
    pub points: Vec<CurvePoint>,
}

impl ResultCurve {
    /// FPR recorded for `sample_size`
    pub fn get(&self, sample_size: usize) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.sample_size == sample_size)
            .map(|p| p.false_positive_rate)
    }

    /// `(sample_size, fpr)` pairs in sweep order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.points
            .iter()
            .map(|p| (p.sample_size, p.false_positive_rate))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Largest realized FPR divided by the nominal alpha
    pub fn max_inflation(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.false_positive_rate / self.alpha)
            .max_by(|a, b| a.total_cmp(b))
    }

    /// Monte Carlo standard error of a point estimate, `sqrt(p(1-p)/n)`
    pub fn standard_error(&self, false_positive_rate: f64) -> f64 {
        (false_positive_rate * (1.0 - false_positive_rate) / self.n_trials as f64).sqrt()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// CSV with a header row; the alpha column repeats the reference line
    pub fn to_csv(&self) -> String {
        let mut csv = String::from("sample_size,false_positive_rate,significant_trials,n_trials,alpha\n");
        for point in &self.points {
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                point.sample_size,
                point.false_positive_rate,
                point.significant_trials,
                self.n_trials,
                self.alpha
            ));
        }
        csv
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!(
            "False-positive rate under {} monitoring ({} test)\n",
            match self.schedule {
                LookSchedule::Continuous => "continuous",
                LookSchedule::FixedHorizon => "fixed-horizon",
            },
            self.test
        ));
        report.push_str(&format!(
            "Nominal alpha: {} | trials per budget: {} | seed: {}\n\n",
            self.alpha, self.n_trials, self.seed
        ));

        report.push_str(&format!(
            "{:>12}  {:>8}  {:>8}  {:>10}  {:>10}\n",
            "sample_size", "fpr", "+/-se", "x alpha", "mean_stop"
        ));
        for point in &self.points {
            let stop = point
                .mean_stopping_look
                .map(|k| format!("{k:.1}"))
                .unwrap_or_else(|| "-".to_string());
            report.push_str(&format!(
                "{:>12}  {:>8.4}  {:>8.4}  {:>10.2}  {:>10}\n",
                point.sample_size,
                point.false_positive_rate,
                self.standard_error(point.false_positive_rate),
                point.false_positive_rate / self.alpha,
                stop
            ));
        }

        if let Some(inflation) = self.max_inflation() {
            report.push_str(&format!(
                "\nWorst case: realized FPR is {inflation:.2}x the nominal alpha\n"
            ));
        }

        report
    }
}

/// Logarithmically spaced, ceiling-rounded, strictly increasing budgets
///
/// `log_grid(1, 10_000, 10)` is the reference grid: dense at small N where
/// each additional look changes the FPR most. Values that round to the same
/// integer are emitted once, so the grid may hold fewer than `points` budgets.
///
/// # Example
/// ```
/// use peekbias::peeking::log_grid;
///
/// let grid = log_grid(1, 10_000, 10).unwrap();
/// assert_eq!(grid.first(), Some(&1));
/// assert_eq!(grid.last(), Some(&10_000));
/// assert!(grid.windows(2).all(|w| w[0] < w[1]));
/// ```
pub fn log_grid(start: usize, stop: usize, points: usize) -> Result<Vec<usize>> {
    if start == 0 {
        return Err(Error::InvalidGrid("start must be >= 1".to_string()));
    }
    if stop <= start {
        return Err(Error::InvalidGrid(format!(
            "stop ({stop}) must exceed start ({start})"
        )));
    }
    if points < 2 {
        return Err(Error::InvalidGrid(format!(
            "need at least 2 points, got {points}"
        )));
    }

    let lo = (start as f64).log10();
    let hi = (stop as f64).log10();
    let step = (hi - lo) / (points - 1) as f64;

    let mut grid: Vec<usize> = Vec::with_capacity(points);
    for i in 0..points {
        // Pin the endpoints; 10f64.powf(4.0) may land a hair above 10_000
        let value = if i == 0 {
            start
        } else if i == points - 1 {
            stop
        } else {
            10f64.powf(lo + step * i as f64).ceil() as usize
        };
        if grid.last().map_or(true, |&last| value > last) {
            grid.push(value);
        }
    }
    Ok(grid)
}
