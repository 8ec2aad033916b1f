//! Fiber tracker event simulation
//!
//! Runs a batch of particle events through the fiber stack and writes the
//! per-channel SiPM counts of every event to a CSV file.
//!
//! Usage:
//! ```
//! cargo run --release --bin fiber_sim -- [OPTIONS]
//! ```
//!
//! Set `RUST_LOG=debug` for per-event output.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fibersim::io::CsvEventWriter;
use fibersim::{DetectorConfig, EventDriver, ExecutionMode};
use log::info;

#[derive(Parser, Debug)]
#[command(
    name = "fiber_sim",
    about = "Monte Carlo simulation of a scintillating fiber tracker with SiPM readout"
)]
struct Args {
    /// JSON detector configuration; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of events, overrides the configuration
    #[arg(long)]
    events: Option<usize>,

    /// Run seed, overrides the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Output CSV file
    #[arg(long, default_value = "results.csv")]
    output: PathBuf,

    /// Simulate the fibers of each event on the rayon thread pool
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long, action)]
    dump_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DetectorConfig::load_from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => DetectorConfig::default(),
    };
    if let Some(events) = args.events {
        config.events = events;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate().context("invalid configuration")?;

    if args.dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let mode = if args.parallel {
        ExecutionMode::Parallel
    } else {
        ExecutionMode::Sequential
    };
    let events = config.events;
    let channel_count = config.channel_count;

    let mut driver = EventDriver::new(config)?.with_mode(mode);
    let mut writer = CsvEventWriter::create(&args.output, channel_count)
        .with_context(|| format!("creating {}", args.output.display()))?;

    info!("Simulating {} events ({:?})", events, mode);
    let summary = driver.run(events, &mut writer)?;

    info!(
        "Fired pixels per event: mean {:.2}, median {:.1}, std {:.2}",
        summary.mean_fired_pixels.unwrap_or(0.0),
        summary.median_fired_pixels.unwrap_or(0.0),
        summary.std_fired_pixels.unwrap_or(0.0)
    );
    info!(
        "Photons: {} produced, {} detected, {} off-sensor, {} blocked",
        summary.photons_produced,
        summary.photons_detected,
        summary.photons_out_of_bounds,
        summary.photons_blocked
    );
    info!("Results written to {}", args.output.display());

    Ok(())
}
