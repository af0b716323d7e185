//! Lazy p-value stream over growing prefixes of a simulated A/B test.
//!
//! One control and one variant observation are drawn per step, never ahead
//! of the look being evaluated, so a consumer that stops at the first
//! significant look leaves the rest of the budget undrawn.

use crate::config::Population;
use crate::error::{Error, Result};
use crate::stats::{LocationTest, RankAccumulator, RunningMoments};
use clap::ValueEnum;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

/// When interim significance tests are evaluated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookSchedule {
    /// Test after every observation, k = 2 .. sample_size - 1
    #[default]
    Continuous,
    /// Test exactly once at k = sample_size - 1
    FixedHorizon,
}

impl LookSchedule {
    /// Number of p-values a stream with this budget produces
    pub fn looks(self, sample_size: usize) -> usize {
        match self {
            LookSchedule::Continuous => sample_size.saturating_sub(2),
            LookSchedule::FixedHorizon => usize::from(sample_size >= 3),
        }
    }

    fn first_look(self, sample_size: usize) -> usize {
        match self {
            LookSchedule::Continuous => 2,
            LookSchedule::FixedHorizon => sample_size.saturating_sub(1).max(2),
        }
    }
}

/// Finite, non-restartable sequence of p-values
///
/// Yields `Err` at most once (a distribution could not be evaluated) and is
/// fused afterwards.
pub struct PValueStream<'r, R: Rng + ?Sized> {
    rng: &'r mut R,
    population: Normal<f64>,
    test: LocationTest,
    schedule: LookSchedule,
    sample_size: usize,
    /// Prefix length of the next look
    next_look: usize,
    /// Only fed when the test is rank based
    ranks: RankAccumulator,
    control_moments: RunningMoments,
    variant_moments: RunningMoments,
    drawn: usize,
    failed: bool,
}

impl<'r, R: Rng + ?Sized> PValueStream<'r, R> {
    pub fn new(
        sample_size: usize,
        population: Population,
        test: LocationTest,
        schedule: LookSchedule,
        rng: &'r mut R,
    ) -> Result<Self> {
        if sample_size < 2 {
            return Err(Error::InvalidSampleSize(sample_size));
        }
        population.validate()?;
        let normal = Normal::new(population.mean, population.std_dev)
            .map_err(|_| Error::InvalidStdDev(population.std_dev))?;

        let buffered = if test.needs_observations() {
            sample_size
        } else {
            0
        };

        Ok(Self {
            rng,
            population: normal,
            test,
            schedule,
            sample_size,
            next_look: schedule.first_look(sample_size),
            ranks: RankAccumulator::with_capacity(buffered),
            control_moments: RunningMoments::new(),
            variant_moments: RunningMoments::new(),
            drawn: 0,
            failed: false,
        })
    }

    /// Paired observations drawn so far
    pub fn observations_drawn(&self) -> usize {
        self.drawn
    }

    /// Prefix length the most recent p-value was computed on
    pub fn current_look(&self) -> Option<usize> {
        (self.drawn >= 2).then_some(self.drawn)
    }

    fn remaining(&self) -> usize {
        if self.failed || self.next_look >= self.sample_size {
            return 0;
        }
        match self.schedule {
            LookSchedule::Continuous => self.sample_size - self.next_look,
            LookSchedule::FixedHorizon => 1,
        }
    }

    fn draw_pair(&mut self) {
        let c = self.population.sample(&mut *self.rng);
        let v = self.population.sample(&mut *self.rng);
        self.control_moments.push(c);
        self.variant_moments.push(v);
        if self.test.needs_observations() {
            self.ranks.push_control(c);
            self.ranks.push_variant(v);
        }
        self.drawn += 1;
    }
}

impl<R: Rng + ?Sized> Iterator for PValueStream<'_, R> {
    type Item = Result<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next_look >= self.sample_size {
            return None;
        }

        while self.drawn < self.next_look {
            self.draw_pair();
        }

        let pvalue = self
            .test
            .pvalue(&self.control_moments, &self.variant_moments, &self.ranks);

        self.next_look = match self.schedule {
            LookSchedule::Continuous => self.next_look + 1,
            LookSchedule::FixedHorizon => self.sample_size,
        };
        if pvalue.is_err() {
            self.failed = true;
        }
        Some(pvalue)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (0, Some(remaining))
    }
}

impl<R: Rng + ?Sized> FusedIterator for PValueStream<'_, R> {}

/// Welch p-values after every observation, both arms drawn from N(mean, std_dev)
///
/// Yields one p-value per prefix length `k = 2, 3, ..., sample_size - 1`; a
/// budget below 3 yields nothing.
///
/// # Example
/// ```
/// use peekbias::peeking::generate_p_values;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let mut rng = ChaCha8Rng::seed_from_u64(1);
/// let pvalues: Vec<f64> = generate_p_values(10, 5.0, 1.0, &mut rng)
///     .unwrap()
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(pvalues.len(), 8);
/// assert!(pvalues.iter().all(|p| (0.0..=1.0).contains(p)));
/// ```
pub fn generate_p_values<R: Rng + ?Sized>(
    sample_size: usize,
    mean: f64,
    std_dev: f64,
    rng: &mut R,
) -> Result<PValueStream<'_, R>> {
    PValueStream::new(
        sample_size,
        Population::new(mean, std_dev)?,
        LocationTest::Welch,
        LookSchedule::Continuous,
        rng,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn population() -> Population {
        Population::new(5.0, 1.0).unwrap()
    }

    fn collect(stream: PValueStream<'_, ChaCha8Rng>) -> Vec<f64> {
        stream.collect::<Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn test_yields_sample_size_minus_two_values() {
        for sample_size in [2, 3, 4, 10, 57] {
            let mut rng = ChaCha8Rng::seed_from_u64(sample_size as u64);
            let pvalues = collect(generate_p_values(sample_size, 5.0, 1.0, &mut rng).unwrap());
            assert_eq!(pvalues.len(), sample_size - 2);
            assert!(pvalues.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_budget_two_is_empty_and_draws_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut stream = generate_p_values(2, 5.0, 1.0, &mut rng).unwrap();
        assert!(stream.next().is_none());
        assert_eq!(stream.observations_drawn(), 0);
    }

    #[test]
    fn test_invalid_arguments() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            generate_p_values(1, 5.0, 1.0, &mut rng),
            Err(Error::InvalidSampleSize(1))
        ));
        assert!(matches!(
            generate_p_values(10, 5.0, 0.0, &mut rng),
            Err(Error::InvalidStdDev(_))
        ));
        assert!(matches!(
            generate_p_values(10, 5.0, -2.0, &mut rng),
            Err(Error::InvalidStdDev(_))
        ));
    }

    #[test]
    fn test_draws_only_up_to_current_look() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut stream = generate_p_values(1000, 5.0, 1.0, &mut rng).unwrap();

        stream.next().unwrap().unwrap();
        assert_eq!(stream.observations_drawn(), 2);
        assert_eq!(stream.current_look(), Some(2));

        for _ in 0..9 {
            stream.next().unwrap().unwrap();
        }
        assert_eq!(stream.observations_drawn(), 11);
    }

    #[test]
    fn test_early_stop_leaves_rng_untouched_past_the_look() {
        // Stopping after 5 looks must consume exactly as much entropy as a
        // stream whose whole budget is those 5 looks.
        let mut rng_a = ChaCha8Rng::seed_from_u64(11);
        {
            let stream = generate_p_values(500, 5.0, 1.0, &mut rng_a).unwrap();
            let _ = stream.take(5).count();
        }
        let mut rng_b = ChaCha8Rng::seed_from_u64(11);
        {
            let stream = generate_p_values(8, 5.0, 1.0, &mut rng_b).unwrap();
            assert_eq!(stream.count(), 6);
        }
        // Budget 8 draws 7 pairs, the early-stopped stream drew 6
        let mut rng_c = ChaCha8Rng::seed_from_u64(11);
        {
            let stream = generate_p_values(7, 5.0, 1.0, &mut rng_c).unwrap();
            assert_eq!(stream.count(), 5);
        }
        assert_eq!(rng_a.gen::<u64>(), rng_c.gen::<u64>());
        assert_ne!(rng_a.gen::<u64>(), rng_b.gen::<u64>());
    }

    #[test]
    fn test_prefix_pvalues_are_shared_between_budgets() {
        // A larger budget extends, never reshuffles, the smaller budget's prefixes
        let mut rng_small = ChaCha8Rng::seed_from_u64(5);
        let small = collect(generate_p_values(20, 5.0, 1.0, &mut rng_small).unwrap());
        let mut rng_large = ChaCha8Rng::seed_from_u64(5);
        let large = collect(generate_p_values(200, 5.0, 1.0, &mut rng_large).unwrap());
        assert_eq!(&large[..small.len()], &small[..]);
    }

    #[test]
    fn test_fixed_horizon_single_look() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut stream = PValueStream::new(
            100,
            population(),
            LocationTest::Welch,
            LookSchedule::FixedHorizon,
            &mut rng,
        )
        .unwrap();
        assert_eq!(stream.size_hint(), (0, Some(1)));
        stream.next().unwrap().unwrap();
        assert_eq!(stream.observations_drawn(), 99);
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_fixed_horizon_matches_last_continuous_look() {
        let mut rng_cont = ChaCha8Rng::seed_from_u64(21);
        let continuous = collect(generate_p_values(40, 5.0, 1.0, &mut rng_cont).unwrap());

        let mut rng_fixed = ChaCha8Rng::seed_from_u64(21);
        let fixed = collect(
            PValueStream::new(
                40,
                population(),
                LocationTest::Welch,
                LookSchedule::FixedHorizon,
                &mut rng_fixed,
            )
            .unwrap(),
        );
        assert_eq!(fixed.len(), 1);
        assert!((fixed[0] - continuous[continuous.len() - 1]).abs() < 1e-12);
    }

    #[test]
    fn test_schedule_look_counts() {
        assert_eq!(LookSchedule::Continuous.looks(0), 0);
        assert_eq!(LookSchedule::Continuous.looks(2), 0);
        assert_eq!(LookSchedule::Continuous.looks(1000), 998);
        assert_eq!(LookSchedule::FixedHorizon.looks(2), 0);
        assert_eq!(LookSchedule::FixedHorizon.looks(3), 1);
        assert_eq!(LookSchedule::FixedHorizon.looks(1000), 1);
    }

    #[test]
    fn test_mann_whitney_stream() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let stream = PValueStream::new(
            30,
            population(),
            LocationTest::MannWhitney,
            LookSchedule::Continuous,
            &mut rng,
        )
        .unwrap();
        let pvalues = collect(stream);
        assert_eq!(pvalues.len(), 28);
        assert!(pvalues.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_mann_whitney_stream_matches_batch_ranking() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let pvalues = collect(
            PValueStream::new(
                60,
                population(),
                LocationTest::MannWhitney,
                LookSchedule::Continuous,
                &mut rng,
            )
            .unwrap(),
        );

        // Replay the same draws and rank each prefix from scratch
        let mut replay = ChaCha8Rng::seed_from_u64(12);
        let normal = Normal::new(5.0, 1.0).unwrap();
        let mut control = Vec::new();
        let mut variant = Vec::new();
        for _ in 0..59 {
            control.push(normal.sample(&mut replay));
            variant.push(normal.sample(&mut replay));
        }
        for (i, p) in pvalues.iter().enumerate() {
            let k = i + 2;
            let batch = crate::stats::mann_whitney_u(&control[..k], &variant[..k]).unwrap();
            assert!((p - batch.pvalue).abs() < 1e-12, "look {k}: {p} vs {}", batch.pvalue);
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = ChaCha8Rng::seed_from_u64(77);
        let mut b = ChaCha8Rng::seed_from_u64(77);
        let first = collect(generate_p_values(64, 5.0, 1.0, &mut a).unwrap());
        let second = collect(generate_p_values(64, 5.0, 1.0, &mut b).unwrap());
        assert_eq!(first, second);
    }
}
