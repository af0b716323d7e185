//! Statistical integration tests: peeking inflates the false-positive rate
//!
//! These run thousands of A/A trials and take a few seconds in release-like
//! test profiles. Tolerances are several Monte Carlo standard errors wide.

use peekbias::config::SimulationConfig;
use peekbias::metric::compare_distributions;
use peekbias::peeking::{sweep, LookSchedule, Simulator};
use peekbias::stats::{welch_t_test, LocationTest, RunningMoments};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

fn config(schedule: LookSchedule, n_trials: usize, seed: u64) -> SimulationConfig {
    SimulationConfig {
        n_trials,
        schedule,
        seed: Some(seed),
        workers: 4,
        ..SimulationConfig::default()
    }
}

#[test]
fn test_continuous_monitoring_inflates_fpr() {
    let simulator = Simulator::new(config(LookSchedule::Continuous, 2000, 2024)).unwrap();
    let fpr = simulator.simulate_false_positive_rate(1000).unwrap();

    // Roughly 0.3-0.4 for Welch at alpha = 0.05 with ~1000 looks
    assert!(fpr > 0.15, "continuous FPR {fpr} not inflated");
    assert!(fpr < 0.8, "continuous FPR {fpr} implausibly high");
}

#[test]
fn test_fixed_horizon_stays_nominal() {
    let simulator = Simulator::new(config(LookSchedule::FixedHorizon, 2000, 2024)).unwrap();
    let fpr = simulator.simulate_false_positive_rate(1000).unwrap();

    // se = sqrt(0.05 * 0.95 / 2000) ~ 0.0049; allow four of them
    assert!((fpr - 0.05).abs() < 0.02, "fixed-horizon FPR {fpr}");
}

#[test]
fn test_fpr_grows_with_budget() {
    let curve = sweep(&[20, 1000], 1000, 0.05, 7).unwrap();
    let small = curve.get(20).unwrap();
    let large = curve.get(1000).unwrap();
    assert!(
        large > small,
        "fpr(1000) = {large} should exceed fpr(20) = {small}"
    );
    assert!(curve.max_inflation().unwrap() > 3.0);
}

#[test]
fn test_mann_whitney_monitoring_also_inflates() {
    let simulator = Simulator::new(SimulationConfig {
        test: LocationTest::MannWhitney,
        ..config(LookSchedule::Continuous, 300, 5)
    })
    .unwrap();
    let fpr = simulator.simulate_false_positive_rate(200).unwrap();
    assert!(fpr > 0.1, "Mann-Whitney continuous FPR {fpr}");
}

#[test]
fn test_stricter_alpha_lowers_fpr() {
    let loose = Simulator::new(config(LookSchedule::Continuous, 1000, 3))
        .unwrap()
        .simulate_false_positive_rate(300)
        .unwrap();
    let strict = Simulator::new(SimulationConfig {
        alpha: 0.01,
        ..config(LookSchedule::Continuous, 1000, 3)
    })
    .unwrap()
    .simulate_false_positive_rate(300)
    .unwrap();
    assert!(strict < loose, "alpha 0.01 gave {strict}, alpha 0.05 gave {loose}");
}

#[test]
fn test_streaming_welch_matches_one_shot_welch() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let normal = Normal::new(5.0, 1.0).unwrap();
    let control: Vec<f64> = (0..60).map(|_| normal.sample(&mut rng)).collect();
    let variant: Vec<f64> = (0..45).map(|_| normal.sample(&mut rng) + 0.3).collect();

    let streaming = welch_t_test(
        &RunningMoments::from_slice(&control),
        &RunningMoments::from_slice(&variant),
    )
    .unwrap();

    let control32: Vec<f32> = control.iter().map(|&x| x as f32).collect();
    let variant32: Vec<f32> = variant.iter().map(|&x| x as f32).collect();
    let one_shot = compare_distributions(&control32, &variant32, false).unwrap();

    assert!(
        (streaming.statistic.abs() - f64::from(one_shot.statistic).abs()).abs() < 1e-2,
        "t: streaming {} vs aprender {}",
        streaming.statistic,
        one_shot.statistic
    );
    assert!(
        (streaming.df - f64::from(one_shot.df)).abs() < 1e-1,
        "df: streaming {} vs aprender {}",
        streaming.df,
        one_shot.df
    );
    assert!(
        (streaming.pvalue - f64::from(one_shot.pvalue)).abs() < 1e-2,
        "p: streaming {} vs aprender {}",
        streaming.pvalue,
        one_shot.pvalue
    );
}
