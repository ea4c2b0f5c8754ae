// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Comparison curves: one line per backoff window, field 3 against field 4.

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use tracing::info;

use crate::config::PlotConfig;
use crate::types::{ResultTable, DELAY_FIELD, THROUGHPUT_FIELD};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("result table is empty")]
    EmptyTable,
    #[error("{windows} window values given for {rows} result rows")]
    WindowCount { windows: usize, rows: usize },
    #[error("cell W={window} p={probability} has no field {index}")]
    MissingField {
        window: u32,
        probability: f64,
        index: usize,
    },
    #[error("drawing failed: {0}")]
    Backend(String),
}

fn backend_err<E>(e: DrawingAreaErrorKind<E>) -> PlotError
where
    E: std::error::Error + Send + Sync,
{
    PlotError::Backend(e.to_string())
}

// ---------------------------------------------------------------------------
// Series extraction
// ---------------------------------------------------------------------------

/// (x, y) samples for one window, in probability order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub window: u32,
    pub points: Vec<(f64, f64)>,
}

/// Pull (field 3, field 4) out of every cell, one series per row.
pub fn extract_series(table: &ResultTable, windows: &[u32]) -> Result<Vec<PlotSeries>, PlotError> {
    if table.row_count() == 0 {
        return Err(PlotError::EmptyTable);
    }
    if windows.len() != table.row_count() {
        return Err(PlotError::WindowCount {
            windows: windows.len(),
            rows: table.row_count(),
        });
    }

    table
        .rows()
        .iter()
        .zip(windows)
        .map(|(row, &window)| {
            let points = row
                .cells
                .iter()
                .map(|cell| {
                    let missing = |index| PlotError::MissingField {
                        window,
                        probability: cell.probability(),
                        index,
                    };
                    let x = cell.mean.throughput_proxy().ok_or_else(|| missing(THROUGHPUT_FIELD))?;
                    let y = cell.mean.delay_proxy().ok_or_else(|| missing(DELAY_FIELD))?;
                    Ok((x, y))
                })
                .collect::<Result<Vec<_>, PlotError>>()?;
            Ok(PlotSeries { window, points })
        })
        .collect()
}

/// Axis ranges covering every point, padded so a single point or a flat
/// curve still gets a non-empty range.
fn axis_ranges(series: &[PlotSeries]) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let points = series.iter().flat_map(|s| s.points.iter());
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    (pad(x_min, x_max), pad(y_min, y_max))
}

fn pad(lo: f64, hi: f64) -> std::ops::Range<f64> {
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    let span = hi - lo;
    let margin = if span > 0.0 {
        span * 0.05
    } else {
        (lo.abs() * 0.05).max(0.5)
    };
    (lo - margin)..(hi + margin)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    series: &[PlotSeries],
    markers: bool,
) -> Result<(), PlotError> {
    root.fill(&WHITE).map_err(backend_err)?;
    let (x_range, y_range) = axis_ranges(series);
    let mut chart = ChartBuilder::on(&root)
        .margin(24)
        .build_cartesian_2d(x_range, y_range)
        .map_err(backend_err)?;

    for (idx, s) in series.iter().enumerate() {
        let color = Palette99::pick(idx);
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))
            .map_err(backend_err)?;
        if markers {
            chart
                .draw_series(
                    s.points
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), 4, RED.filled())),
                )
                .map_err(backend_err)?;
        }
    }

    root.present().map_err(backend_err)
}

/// Render `series` to `config.output`. A `.svg` extension selects the vector
/// backend; anything else is written as a bitmap.
pub fn render_chart(config: &PlotConfig, series: &[PlotSeries]) -> Result<(), PlotError> {
    let size = (config.width, config.height);
    let is_svg = config
        .output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    if is_svg {
        draw(SVGBackend::new(&config.output, size).into_drawing_area(), series, config.markers)
    } else {
        draw(BitMapBackend::new(&config.output, size).into_drawing_area(), series, config.markers)
    }
}

// ---------------------------------------------------------------------------
// Plotter
// ---------------------------------------------------------------------------

/// Receives the finished table. Only called after a successful sweep.
pub trait Plotter {
    fn render(&mut self, table: &ResultTable, windows: &[u32]) -> Result<(), PlotError>;
}

/// Draws the comparison figure with `plotters`.
#[derive(Debug, Clone)]
pub struct ChartPlotter {
    config: PlotConfig,
}

impl ChartPlotter {
    pub fn new(config: PlotConfig) -> Self {
        Self { config }
    }
}

impl Plotter for ChartPlotter {
    fn render(&mut self, table: &ResultTable, windows: &[u32]) -> Result<(), PlotError> {
        let series = extract_series(table, windows)?;
        for s in &series {
            info!(window = s.window, points = ?s.points, "series");
        }
        render_chart(&self.config, &series)?;
        info!(output = %self.config.output.display(), "figure written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
