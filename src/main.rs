use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::io;
use std::path::PathBuf;

use bridgesim::config_loader;
use bridgesim::orchestrator::{run_simulation, RunSettings, SimulationInput};
use bridgesim::report::{self, ReportFormat};
use bridgesim::trace::{format_event, NullObserver, TraceEvent, TraceObserver};

/// Spanning Tree Protocol and learning bridge simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Topology in the text format; read from standard input when omitted
    #[arg(short, long, conflicts_with = "config")]
    input: Option<PathBuf>,

    /// Simulation configuration YAML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Print per-round trace lines regardless of the input's trace flag
    #[arg(long)]
    trace: bool,

    /// Evaluate bridges one after another instead of on the thread pool
    #[arg(long)]
    sequential: bool,

    /// Override the round cap factor (rounds allowed per bridge)
    #[arg(long)]
    round_cap_factor: Option<usize>,

    /// Write the report to this file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // The configuration file may choose the default log level, so load it first
    let config = args
        .config
        .as_deref()
        .map(config_loader::load_config)
        .transpose()?;

    let default_level = config
        .as_ref()
        .and_then(|c| c.general.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("Starting bridgesim");

    let (input, mut settings): (SimulationInput, RunSettings) = match &config {
        Some(config) => (config.to_input(), config.run_settings()),
        None => (
            config_loader::load_text_input(args.input.as_deref(), io::stdin().lock())?,
            RunSettings::default(),
        ),
    };

    if args.sequential {
        settings.parallel = false;
    }
    if let Some(factor) = args.round_cap_factor {
        settings.round_cap_factor = factor;
    }

    let trace = args.trace || input.trace;
    let mut printer = |event: &TraceEvent| println!("{}", format_event(event));
    let mut silent = NullObserver;
    let observer: &mut dyn TraceObserver = if trace { &mut printer } else { &mut silent };

    let report = run_simulation(&input, settings, observer).wrap_err("Invalid topology")?;

    if !report.convergence.converged {
        log::warn!("Roles below are from an unconverged network");
    }

    match &args.output {
        Some(path) => report::write_report(&report, args.format, path)?,
        None => print!("{}", report::render(&report, args.format)?),
    }

    info!("Simulation completed successfully");
    Ok(())
}
