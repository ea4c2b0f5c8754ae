// Slotted ALOHA Sweep Runner
// Sweeps backoff window x transmission probability, averages repeated engine
// trials per cell and draws one throughput/delay curve per window.
//
// Usage:
//   cargo run --release --bin sweep -- --trials 5              # Reference grid, `java sender`
//   cargo run --release --bin sweep -- --config sweep.toml     # Grid from TOML
//   cargo run --release --bin sweep -- -W 2,4,8 --trials 1     # Override the grid
//   cargo run --release --bin sweep -- -t 1 --engine ./sender -o curves.svg

mod cli;
mod report;

use aloha_sweep::{run_experiment, ChartPlotter, ProcessEngine};
use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ─── Logging ────────────────────────────────────────────────────────────────

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stderr keeps stdout for the summary table
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = cli.harness_config()?;

    report::print_header(&cfg);

    let mut engine = ProcessEngine::from_config(&cfg.engine);
    let mut plotter = ChartPlotter::new(cfg.plot.clone());
    let table = run_experiment(&cfg.experiment, &mut engine, &mut plotter, None)
        .context("Sweep aborted, no figure produced")?;

    report::print_table(&table, &cfg.plot.output);
    Ok(())
}
