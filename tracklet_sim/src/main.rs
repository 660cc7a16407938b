use clap::Parser;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tracklet_sim::cli::{Cli, Command};
use tracklet_sim::export::{write_estimates_to_file, write_measurement_log_to_file};
use tracklet_sim::ingest::{collect_log_files, load_log};
use tracklet_sim::prelude::*;
use tracklet_sim::replay;
use tracklet_sim::scenario::ScenarioGenerator;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so `--print-config` output stays clean. `RUST_LOG`
/// takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_writer(io::stderr)
        .init();

    if verbose {
        info!("Verbose logging enabled (DEBUG level)");
    }
}

fn run(cli: Cli) -> Result<(), SimError> {
    let mut config = ScenarioConfig::load(cli.config.as_deref())?;
    if let Command::Simulate { seed: Some(seed), .. } = cli.command {
        config.simulation.seed = Some(seed);
    }

    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    match cli.command {
        Command::Replay { input, output } => replay_logs(&config, &input, output.as_deref()),
        Command::Simulate {
            output, save_log, ..
        } => simulate(&config, output.as_deref(), save_log.as_deref()),
    }
}

fn replay_logs(
    config: &ScenarioConfig,
    input: &Path,
    output: Option<&Path>,
) -> Result<(), SimError> {
    let files = collect_log_files(input)?;
    if files.is_empty() {
        return Err(SimError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no measurement logs found at {}", input.display()),
        )));
    }

    let many = files.len() > 1;
    for file in &files {
        let records = load_log(file)?;
        let mut ukf = UnscentedKalmanFilter::new(config.filter)?;
        let report = replay::run(&mut ukf, &records);
        report.log_summary(&file.display().to_string());

        if let Some(output) = output {
            let target = if many {
                output_for(output, file)
            } else {
                output.to_path_buf()
            };
            write_estimates_to_file(&target, &report.estimates)?;
        }
    }
    Ok(())
}

/// `<dir>/<log stem>.tsv`, used when a whole directory is replayed.
fn output_for(dir: &Path, log: &Path) -> PathBuf {
    let stem = log.file_stem().unwrap_or(log.as_os_str());
    dir.join(format!("{}.tsv", stem.to_string_lossy()))
}

fn simulate(
    config: &ScenarioConfig,
    output: Option<&Path>,
    save_log: Option<&Path>,
) -> Result<(), SimError> {
    let mut rng = SimulationRng::from_seed(config.simulation.seed);
    let records = ScenarioGenerator::new(config.clone())?.generate(&mut rng)?;
    if let Some(path) = save_log {
        write_measurement_log_to_file(path, &records)?;
    }

    let mut ukf = UnscentedKalmanFilter::new(config.filter)?;
    let report = replay::run(&mut ukf, &records);
    report.log_summary("simulation");

    if let Some(path) = output {
        write_estimates_to_file(path, &report.estimates)?;
    }
    Ok(())
}
