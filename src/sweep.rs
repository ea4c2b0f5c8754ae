// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Grid sweep: window outer, probability inner, trials innermost.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::aggregate::{aggregate, SweepError};
use crate::config::ExperimentConfig;
use crate::engine::SimulationEngine;
use crate::types::{ResultTable, ResultTableBuilder};

// ---------------------------------------------------------------------------
// CancelToken
// ---------------------------------------------------------------------------

/// Cooperative stop flag, checked before each cell starts.
///
/// A cell that has started always runs all its trials to completion or
/// failure; cancellation never truncates a cell.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

/// Evaluate every (window, probability) cell of `config` in configured order.
///
/// The first error anywhere aborts the sweep and no table is returned.
pub fn run_sweep<E: SimulationEngine + ?Sized>(
    config: &ExperimentConfig,
    engine: &mut E,
    cancel: Option<&CancelToken>,
) -> Result<ResultTable, SweepError> {
    if config.trials == 0 {
        return Err(SweepError::NoTrials);
    }

    let total = config.cell_count();
    let start = Instant::now();
    info!(
        nodes = config.node_count,
        windows = ?config.windows,
        probabilities = ?config.probabilities,
        trials = config.trials,
        cells = total,
        "sweep started"
    );

    let mut builder = ResultTableBuilder::new(config.windows.len(), config.probabilities.len());
    for &window in &config.windows {
        builder.begin_row(window);
        for &probability in &config.probabilities {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                let completed_cells = builder.completed_cells();
                warn!(completed_cells, "sweep cancelled");
                return Err(SweepError::Cancelled { completed_cells });
            }

            let params = config.trial_params(window, probability);
            let cell = aggregate(engine, &params, config.trials)?;
            info!(
                cell = builder.completed_cells() + 1,
                of = total,
                window,
                probability,
                mean = ?cell.mean.fields(),
                "cell done"
            );
            builder.push_cell(cell)?;
        }
    }

    let table = builder.finish()?;
    info!(cells = total, elapsed = ?start.elapsed(), "sweep finished");
    Ok(table)
}

// ---------------------------------------------------------------------------
