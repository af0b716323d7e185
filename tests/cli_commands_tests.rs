//! Integration tests for `simulate`, `compare`, `se-check` and `--config`
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn observations(values: &[f64]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# metric observations").unwrap();
    for value in values {
        writeln!(file, "{}", value).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_simulate_prints_both_schedules() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("peekbias");
    cmd.args(["simulate", "-n", "100", "--trials", "50", "--seed", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sample size: 100"))
        .stdout(predicate::str::contains("seed: 9"))
        .stdout(predicate::str::contains("continuous monitoring"))
        .stdout(predicate::str::contains("fixed horizon"))
        .stdout(predicate::str::contains("significant="));
}

#[test]
fn test_simulate_rejects_tiny_budget() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("peekbias");
    cmd.args(["simulate", "-n", "1", "--trials", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sample_size must be >= 2"));
}

#[test]
fn test_debug_logs_drawn_seed_to_stderr() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("peekbias");
    cmd.args(["--debug", "simulate", "-n", "10", "--trials", "5"])
        .assert()
        .success()
        .stderr(predicate::str::contains("drew one from the OS"));
}

#[test]
fn test_compare_detects_lift() {
    let control = observations(&[10.0, 11.0, 10.0, 12.0, 10.0, 11.0]);
    let variant = observations(&[50.0, 52.0, 51.0, 53.0, 50.0, 51.0]);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("peekbias");
    cmd.arg("compare")
        .arg("--control")
        .arg(control.path())
        .arg("--variant")
        .arg(variant.path())
        .arg("--seed")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("SIGNIFICANT DIFFERENCE (welch)"))
        .stdout(predicate::str::contains("mann-whitney"))
        .stdout(predicate::str::contains("diagnostic"))
        .stdout(predicate::str::contains("Standard error of difference"));
}

#[test]
fn test_compare_no_difference() {
    let control = observations(&[100.0, 105.0, 98.0, 102.0, 101.0]);
    let variant = observations(&[102.0, 106.0, 99.0, 103.0, 100.0]);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("peekbias");
    cmd.arg("compare")
        .arg("--control")
        .arg(control.path())
        .arg("--variant")
        .arg(variant.path())
        .arg("--seed")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("NO SIGNIFICANT DIFFERENCE"));
}

#[test]
fn test_compare_insufficient_data() {
    let control = observations(&[1.0, 2.0, 3.0]);
    let variant = observations(&[2.0, 3.0, 4.0]);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("peekbias");
    cmd.arg("compare")
        .arg("--control")
        .arg(control.path())
        .arg("--variant")
        .arg(variant.path())
        .arg("--min-sample-size")
        .arg("10")
        .assert()
        .success()
        .stdout(predicate::str::contains("INSUFFICIENT DATA"));
}

#[test]
fn test_compare_reports_bad_line() {
    let control = observations(&[1.0, 2.0, 3.0]);
    let mut variant = NamedTempFile::new().unwrap();
    writeln!(variant, "1.0\n2.0\nnot-a-number").unwrap();
    variant.flush().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("peekbias");
    cmd.arg("compare")
        .arg("--control")
        .arg(control.path())
        .arg("--variant")
        .arg(variant.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 3"));
}

#[test]
fn test_compare_missing_file() {
    let control = observations(&[1.0, 2.0, 3.0]);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("peekbias");
    cmd.arg("compare")
        .arg("--control")
        .arg(control.path())
        .arg("--variant")
        .arg("/nonexistent/variant.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read observations"));
}

#[test]
fn test_se_check_report() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("peekbias");
    cmd.args(["se-check", "-n", "500", "--resamples", "200", "--seed", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("n = 500"))
        .stdout(predicate::str::contains("true"))
        .stdout(predicate::str::contains("analytical"))
        .stdout(predicate::str::contains("bootstrap"));
}

#[test]
fn test_se_check_rejects_bad_std_dev() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("peekbias");
    cmd.args(["se-check", "--std-dev", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("std_dev must be finite and > 0"));
}

#[test]
fn test_config_file_sets_defaults() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(
        config,
        "[simulation]\nn_trials = 25\nseed = 77\nschedule = \"fixed-horizon\"\n"
    )
    .unwrap();
    config.flush().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("peekbias");
    cmd.arg("--config")
        .arg(config.path())
        .args(["sweep", "--sizes", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fixed-horizon monitoring"))
        .stdout(predicate::str::contains("trials per budget: 25"))
        .stdout(predicate::str::contains("seed: 77"));
}

#[test]
fn test_flags_override_config_file() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "[simulation]\nn_trials = 25\nseed = 77\n").unwrap();
    config.flush().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("peekbias");
    cmd.arg("--config")
        .arg(config.path())
        .args(["sweep", "--sizes", "10", "--seed", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("seed: 5"));
}

#[test]
fn test_invalid_config_file() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "[simulation]\nalpha = 3.0\n").unwrap();
    config.flush().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("peekbias");
    cmd.arg("--config")
        .arg(config.path())
        .args(["sweep", "--sizes", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}
