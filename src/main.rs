use anyhow::{Context, Result};
use clap::Parser;
use peekbias::cli::{Cli, Command, OutputFormat, SweepArgs};
use peekbias::config::{FileConfig, SimulationConfig};
use peekbias::metric::{self, MetricConfig};
use peekbias::peeking::{LookSchedule, ResultCurve, Simulator, Tally};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn render_curve(curve: &ResultCurve, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => curve.to_report_string(),
        OutputFormat::Json => {
            let mut json = curve.to_json().context("Failed to serialize curve")?;
            json.push('\n');
            json
        }
        OutputFormat::Csv => curve.to_csv(),
    })
}

fn run_sweep(config: SimulationConfig, args: &SweepArgs) -> Result<()> {
    let sizes = args.sample_sizes()?;
    let simulator = Simulator::new(config)?;
    let curve = simulator.sweep(&sizes)?;
    let rendered = render_curve(&curve, args.format)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote result curve");
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn print_tally(label: &str, tally: &Tally, alpha: f64) {
    let fpr = tally.false_positive_rate();
    let stop = tally
        .mean_stopping_look()
        .map(|k| format!("{k:.1}"))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  {:<22} fpr={:.4}  ({:.2}x alpha)  significant={}/{}  mean_stop={}",
        label,
        fpr,
        fpr / alpha,
        tally.significant,
        tally.trials,
        stop
    );
}

/// Same seed and budget under both schedules
fn run_simulate(config: SimulationConfig, sample_size: usize) -> Result<()> {
    let continuous = Simulator::new(SimulationConfig {
        schedule: LookSchedule::Continuous,
        ..config
    })?;
    let fixed = Simulator::new(SimulationConfig {
        schedule: LookSchedule::FixedHorizon,
        seed: Some(continuous.seed()),
        ..continuous.config().clone()
    })?;

    let config = continuous.config();
    println!(
        "Sample size: {} | trials: {} | alpha: {} | test: {} | seed: {}",
        sample_size,
        config.n_trials,
        config.alpha,
        config.test,
        continuous.seed()
    );
    print_tally(
        "continuous monitoring",
        &continuous.simulate(sample_size)?,
        config.alpha,
    );
    print_tally("fixed horizon", &fixed.simulate(sample_size)?, config.alpha);
    Ok(())
}

fn run_compare(config: MetricConfig, control: &Path, variant: &Path) -> Result<()> {
    let control = metric::read_observations(control)?;
    let variant = metric::read_observations(variant)?;
    let assessment = metric::assess_metric(&control, &variant, &config)?;
    print!("{}", assessment.to_report_string());
    Ok(())
}

fn run_se_check(config: &SimulationConfig, n: usize, resamples: usize) -> Result<()> {
    let seed = config
        .seed
        .unwrap_or_else(|| rand::rngs::OsRng.next_u64());
    tracing::debug!(seed, n, resamples, "standard error check");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let check = metric::standard_error_check(n, config.population(), resamples, &mut rng)?;
    print!("{}", check.to_report_string());
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => FileConfig::default(),
    };

    let mut simulation = file_config.simulation;
    args.sim.apply(&mut simulation);
    let mut metric_config = file_config.metric;
    args.sim.apply_metric(&mut metric_config);

    match args.command {
        Command::Sweep(sweep) => run_sweep(simulation, &sweep)?,
        Command::Simulate { sample_size } => run_simulate(simulation, sample_size)?,
        Command::Compare {
            control,
            variant,
            resamples,
            min_sample_size,
        } => {
            if let Some(resamples) = resamples {
                metric_config.bootstrap_resamples = resamples;
            }
            if let Some(min_sample_size) = min_sample_size {
                metric_config.min_sample_size = min_sample_size;
            }
            run_compare(metric_config, &control, &variant)?;
        }
        Command::SeCheck { n, resamples } => run_se_check(&simulation, n, resamples)?,
    }

    Ok(())
}
