// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Sweep data model.
//!
//! Engine output is kept positional: only the two fields the comparison plot
//! consumes get accessors, every other field stays an opaque residual.

/// Zero-based index of the engine field plotted on the x axis.
pub const THROUGHPUT_FIELD: usize = 3;
/// Zero-based index of the engine field plotted on the y axis.
pub const DELAY_FIELD: usize = 4;

// ---------------------------------------------------------------------------
// MetricsVector
// ---------------------------------------------------------------------------

/// Numeric fields reported by one engine run, in the engine's output order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsVector {
    fields: Vec<f64>,
}

impl MetricsVector {
    pub fn new(fields: Vec<f64>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[f64] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.fields.get(index).copied()
    }

    /// Field 3, the x coordinate of the comparison curves.
    pub fn throughput_proxy(&self) -> Option<f64> {
        self.get(THROUGHPUT_FIELD)
    }

    /// Field 4, the y coordinate of the comparison curves.
    pub fn delay_proxy(&self) -> Option<f64> {
        self.get(DELAY_FIELD)
    }

    /// All fields except the two named proxies, order preserved.
    pub fn residual(&self) -> Vec<f64> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != THROUGHPUT_FIELD && *i != DELAY_FIELD)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl From<Vec<f64>> for MetricsVector {
    fn from(fields: Vec<f64>) -> Self {
        Self::new(fields)
    }
}

// ---------------------------------------------------------------------------
// TrialParams
// ---------------------------------------------------------------------------

/// One parameter combination handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialParams {
    pub node_count: u32,
    pub window: u32,
    pub probability: f64,
    pub max_slots: u64,
    pub repetitions: u32,
}

// ---------------------------------------------------------------------------
// AggregatedCell
// ---------------------------------------------------------------------------

/// Field-wise mean of every trial run for one (window, probability) cell.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedCell {
    pub params: TrialParams,
    /// Number of trials folded into `mean`.
    pub trials: usize,
    pub mean: MetricsVector,
}

impl AggregatedCell {
    pub fn window(&self) -> u32 {
        self.params.window
    }

    pub fn probability(&self) -> f64 {
        self.params.probability
    }
}

// ---------------------------------------------------------------------------
// ResultTable
// ---------------------------------------------------------------------------

/// All cells sharing one backoff window, in probability order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub window: u32,
    pub cells: Vec<AggregatedCell>,
}

/// One row per configured window, one cell per configured probability.
/// Axis order is the configured order: never sorted, never deduplicated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, window_idx: usize, probability_idx: usize) -> Option<&AggregatedCell> {
        self.rows.get(window_idx)?.cells.get(probability_idx)
    }

    pub fn cells(&self) -> impl Iterator<Item = &AggregatedCell> {
        self.rows.iter().flat_map(|r| r.cells.iter())
    }
}

/// Misuse of [`ResultTableBuilder`]: a cell with nowhere to go, or a table
/// sealed before every cell arrived.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("cell W={window} p={probability} pushed before any row was opened")]
    NoOpenRow { window: u32, probability: f64 },
    #[error("result table sealed with {found} of {expected} cells")]
    Incomplete { expected: usize, found: usize },
}

/// Accumulates a [`ResultTable`] row by row while the sweep runs.
///
/// The builder is owned by the sweep and moved into the finished table; there
/// is no shared accumulation state.
#[derive(Debug)]
pub struct ResultTableBuilder {
    rows: Vec<ResultRow>,
    expected_rows: usize,
    expected_cells: usize,
}

impl ResultTableBuilder {
    pub fn new(expected_rows: usize, expected_cells: usize) -> Self {
        Self {
            rows: Vec::with_capacity(expected_rows),
            expected_rows,
            expected_cells,
        }
    }

    /// Open the row for `window`. Cells pushed afterwards land in it.
    pub fn begin_row(&mut self, window: u32) {
        self.rows.push(ResultRow {
            window,
            cells: Vec::with_capacity(self.expected_cells),
        });
    }

    /// Append a cell to the open row.
    pub fn push_cell(&mut self, cell: AggregatedCell) -> Result<(), TableError> {
        let row = self.rows.last_mut().ok_or(TableError::NoOpenRow {
            window: cell.window(),
            probability: cell.probability(),
        })?;
        row.cells.push(cell);
        Ok(())
    }

    pub fn completed_cells(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.rows.len() == self.expected_rows
            && self.rows.iter().all(|r| r.cells.len() == self.expected_cells)
    }

    /// Seal the table. Fails unless every expected row and cell was pushed.
    pub fn finish(self) -> Result<ResultTable, TableError> {
        if !self.is_complete() {
            return Err(TableError::Incomplete {
                expected: self.expected_rows * self.expected_cells,
                found: self.completed_cells(),
            });
        }
        Ok(ResultTable { rows: self.rows })
    }
}

// ---------------------------------------------------------------------------
