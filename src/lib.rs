// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Slotted ALOHA Sweep Harness

pub mod types;
pub mod config;
pub mod engine;
pub mod aggregate;
pub mod sweep;
pub mod plot;

pub use types::*;
pub use config::{ConfigError, EngineConfig, ExperimentConfig, HarnessConfig, PlotConfig};
pub use engine::{parse_metrics, EngineError, ProcessEngine, SimulationEngine};
pub use aggregate::{aggregate, SweepError};
pub use sweep::{run_sweep, CancelToken};
pub use plot::{extract_series, ChartPlotter, PlotError, PlotSeries, Plotter};

// ─── Harness Entry ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sweep(#[from] SweepError),
    #[error(transparent)]
    Plot(#[from] PlotError),
}

/// Validate, sweep the whole grid, then hand the finished table to `plotter`.
///
/// The plotter is never called if any cell fails or the sweep is cancelled.
pub fn run_experiment<E, P>(
    config: &ExperimentConfig,
    engine: &mut E,
    plotter: &mut P,
    cancel: Option<&CancelToken>,
) -> Result<ResultTable, HarnessError>
where
    E: SimulationEngine + ?Sized,
    P: Plotter + ?Sized,
{
    config.validate()?;
    let table = run_sweep(config, engine, cancel)?;
    plotter.render(&table, &config.windows)?;
    Ok(table)
}
