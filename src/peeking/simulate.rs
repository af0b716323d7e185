// Monte Carlo estimate of the false-positive rate under continuous monitoring
//
// Each trial draws both arms from the same population, scans the p-value
// stream and stops at the first look with p < alpha. Trials are
// independent: trial i of budget n always uses the same ChaCha stream, so a
// fixed seed reproduces bit-identical rates for any number of workers.

use crate::config::SimulationConfig;
use crate::error::{Error, Result};
use crate::peeking::curve::{CurvePoint, ResultCurve};
use crate::peeking::stream::PValueStream;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

/// Golden-ratio increment used to spread budgets across seed space
const BUDGET_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Result of one simulated experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialOutcome {
    /// Whether any look crossed alpha before the budget ran out
    pub significant: bool,

    /// Prefix length of the first crossing
    pub stopped_at: Option<usize>,

    /// Looks evaluated, including the crossing one
    pub looks: usize,
}

/// Aggregate over all trials of one budget
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tally {
    pub trials: usize,
    pub significant: usize,
    pub looks: u64,
    stop_sum: u64,
}

impl Tally {
    pub fn record(&mut self, outcome: TrialOutcome) {
        self.trials += 1;
        self.looks += outcome.looks as u64;
        if outcome.significant {
            self.significant += 1;
        }
        if let Some(k) = outcome.stopped_at {
            self.stop_sum += k as u64;
        }
    }

    pub fn merge(&mut self, other: Tally) {
        self.trials += other.trials;
        self.significant += other.significant;
        self.looks += other.looks;
        self.stop_sum += other.stop_sum;
    }

    pub fn false_positive_rate(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.significant as f64 / self.trials as f64
    }

    /// Mean prefix length at which significant trials stopped
    pub fn mean_stopping_look(&self) -> Option<f64> {
        (self.significant > 0).then(|| self.stop_sum as f64 / self.significant as f64)
    }
}

/// Monitoring-bias simulator bound to one configuration and master seed
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulationConfig,
    seed: u64,
}

impl Simulator {
    /// Validate `config` and fix the master seed
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::rngs::OsRng.next_u64();
                tracing::info!(seed, "no seed configured, drew one from the OS");
                seed
            }
        };
        Ok(Self { config, seed })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generator owned by trial `trial` of budget `sample_size`
    pub fn trial_rng(&self, sample_size: usize, trial: usize) -> ChaCha8Rng {
        let budget_seed = self
            .seed
            .wrapping_add((sample_size as u64).wrapping_mul(BUDGET_SEED_STRIDE));
        let mut rng = ChaCha8Rng::seed_from_u64(budget_seed);
        rng.set_stream(trial as u64);
        rng
    }

    /// Run one trial, stopping at the first look with p < alpha
    pub fn run_trial(&self, sample_size: usize, trial: usize) -> Result<TrialOutcome> {
        let mut rng = self.trial_rng(sample_size, trial);
        let mut stream = PValueStream::new(
            sample_size,
            self.config.population(),
            self.config.test,
            self.config.schedule,
            &mut rng,
        )?;
        let scanned = scan(&mut stream, self.config.alpha)?;
        Ok(TrialOutcome {
            significant: scanned.crossed,
            stopped_at: if scanned.crossed {
                stream.current_look()
            } else {
                None
            },
            looks: scanned.looks,
        })
    }

    /// Tally every trial of one budget
    pub fn simulate(&self, sample_size: usize) -> Result<Tally> {
        if sample_size < 2 {
            return Err(Error::InvalidSampleSize(sample_size));
        }

        let n_trials = self.config.n_trials;
        let workers = self.config.workers.clamp(1, n_trials);

        let tally = if workers == 1 {
            self.tally_trials(sample_size, 0, 1)?
        } else {
            crossbeam::thread::scope(|scope| {
                let handles: Vec<_> = (0..workers)
                    .map(|worker| {
                        scope.spawn(move |_| self.tally_trials(sample_size, worker, workers))
                    })
                    .collect();

                let mut total = Tally::default();
                for handle in handles {
                    let partial = handle.join().map_err(|_| Error::WorkerPanicked)??;
                    total.merge(partial);
                }
                Ok::<_, Error>(total)
            })
            .map_err(|_| Error::WorkerPanicked)??
        };

        tracing::debug!(
            sample_size,
            trials = tally.trials,
            significant = tally.significant,
            fpr = tally.false_positive_rate(),
            "simulated budget"
        );
        Ok(tally)
    }

    /// Trials `first, first + stride, ...` of one budget
    fn tally_trials(&self, sample_size: usize, first: usize, stride: usize) -> Result<Tally> {
        let mut tally = Tally::default();
        for trial in (first..self.config.n_trials).step_by(stride) {
            tally.record(self.run_trial(sample_size, trial)?);
        }
        Ok(tally)
    }

    /// Fraction of trials that ever reached significance
    pub fn simulate_false_positive_rate(&self, sample_size: usize) -> Result<f64> {
        Ok(self.simulate(sample_size)?.false_positive_rate())
    }

    /// Simulate each budget in order and collect the result curve
    pub fn sweep(&self, sample_sizes: &[usize]) -> Result<ResultCurve> {
        validate_grid(sample_sizes)?;

        tracing::info!(
            budgets = sample_sizes.len(),
            n_trials = self.config.n_trials,
            alpha = self.config.alpha,
            test = %self.config.test,
            seed = self.seed,
            "starting sweep"
        );

        let mut points = Vec::with_capacity(sample_sizes.len());
        for &sample_size in sample_sizes {
            let tally = self.simulate(sample_size)?;
            points.push(CurvePoint::from_tally(sample_size, &tally));
        }

        Ok(ResultCurve {
            alpha: self.config.alpha,
            test: self.config.test,
            schedule: self.config.schedule,
            n_trials: self.config.n_trials,
            seed: self.seed,
            points,
        })
    }
}

/// How far a trial's stream was read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scan {
    /// Looks evaluated, including the crossing one
    pub looks: usize,

    /// Whether the last evaluated look had p < alpha
    pub crossed: bool,
}

/// Consume a stream until the first p < alpha or exhaustion
///
/// Nothing past the crossing look is pulled from the stream.
pub fn scan<I>(stream: I, alpha: f64) -> Result<Scan>
where
    I: Iterator<Item = Result<f64>>,
{
    let mut looks = 0;
    for pvalue in stream {
        let pvalue = pvalue?;
        looks += 1;
        if pvalue < alpha {
            return Ok(Scan {
                looks,
                crossed: true,
            });
        }
    }
    Ok(Scan {
        looks,
        crossed: false,
    })
}

fn validate_grid(sample_sizes: &[usize]) -> Result<()> {
    if sample_sizes.is_empty() {
        return Err(Error::InvalidGrid("no sample sizes given".to_string()));
    }
    let mut seen = HashSet::with_capacity(sample_sizes.len());
    for &n in sample_sizes {
        if n < 2 {
            return Err(Error::InvalidSampleSize(n));
        }
        if !seen.insert(n) {
            return Err(Error::InvalidGrid(format!("duplicate sample size {n}")));
        }
    }
    Ok(())
}

/// Empirical FPR of continuous Welch monitoring for one budget
///
/// Both arms are drawn from N(5, 1).
pub fn simulate_false_positive_rate(
    sample_size: usize,
    n_trials: usize,
    alpha: f64,
    seed: u64,
) -> Result<f64> {
    let simulator = Simulator::new(SimulationConfig {
        n_trials,
        alpha,
        seed: Some(seed),
        ..SimulationConfig::default()
    })?;
    simulator.simulate_false_positive_rate(sample_size)
}

/// Result curve for several budgets with the default population
pub fn sweep(sample_sizes: &[usize], n_trials: usize, alpha: f64, seed: u64) -> Result<ResultCurve> {
    let simulator = Simulator::new(SimulationConfig {
        n_trials,
        alpha,
        seed: Some(seed),
        ..SimulationConfig::default()
    })?;
    simulator.sweep(sample_sizes)
}
