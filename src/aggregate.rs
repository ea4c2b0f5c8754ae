// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Repeated trials per cell, reduced to a field-wise mean.

use tracing::debug;

use crate::engine::{EngineError, SimulationEngine};
use crate::types::{AggregatedCell, MetricsVector, TableError, TrialParams};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that abort a sweep. There is no partial result for any of them.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("trial {trial} of cell W={window} p={probability} failed: {source}")]
    Engine {
        window: u32,
        probability: f64,
        trial: usize,
        #[source]
        source: EngineError,
    },
    #[error(
        "trial {trial} of cell W={window} p={probability} returned {found} fields, earlier trials returned {expected}"
    )]
    ShapeMismatch {
        window: u32,
        probability: f64,
        trial: usize,
        expected: usize,
        found: usize,
    },
    #[error("trial count must be at least 1")]
    NoTrials,
    #[error("sweep cancelled after {completed_cells} cells")]
    Cancelled { completed_cells: usize },
    #[error(transparent)]
    Table(#[from] TableError),
}

impl SweepError {
    /// The engine error behind this failure, if any.
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            Self::Engine { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Run `trials` engine invocations with identical parameters and average them.
///
/// Trial vectors must all have the length of the first one. The first failing
/// trial aborts the cell; failed trials are never skipped.
pub fn aggregate<E: SimulationEngine + ?Sized>(
    engine: &mut E,
    params: &TrialParams,
    trials: usize,
) -> Result<AggregatedCell, SweepError> {
    if trials == 0 {
        return Err(SweepError::NoTrials);
    }

    let mut sums: Vec<f64> = Vec::new();
    for trial in 0..trials {
        let metrics = engine.invoke(params).map_err(|source| SweepError::Engine {
            window: params.window,
            probability: params.probability,
            trial,
            source,
        })?;
        debug!(
            window = params.window,
            probability = params.probability,
            trial,
            fields = ?metrics.fields(),
            "trial finished"
        );

        if trial == 0 {
            sums = metrics.fields().to_vec();
            continue;
        }
        if metrics.len() != sums.len() {
            return Err(SweepError::ShapeMismatch {
                window: params.window,
                probability: params.probability,
                trial,
                expected: sums.len(),
                found: metrics.len(),
            });
        }
        for (sum, value) in sums.iter_mut().zip(metrics.fields()) {
            *sum += value;
        }
    }

    let n = trials as f64;
    let mean = MetricsVector::new(sums.into_iter().map(|s| s / n).collect());
    Ok(AggregatedCell {
        params: *params,
        trials,
        mean,
    })
}

// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn params() -> TrialParams {
        TrialParams {
            node_count: 50,
            window: 2,
            probability: 0.01,
            max_slots: 100_000,
            repetitions: 1000,
        }
    }

    /// Hands out queued results in order, counting calls.
    struct ScriptedEngine {
        queue: VecDeque<Result<Vec<f64>, EngineError>>,
        calls: usize,
    }

    impl ScriptedEngine {
        fn new(results: Vec<Result<Vec<f64>, EngineError>>) -> Self {
            Self { queue: results.into(), calls: 0 }
        }
    }

    impl SimulationEngine for ScriptedEngine {
        fn invoke(&mut self, _params: &TrialParams) -> Result<MetricsVector, EngineError> {
            self.calls += 1;
            self.queue
                .pop_front()
                .expect("test: engine called more often than scripted")
                .map(MetricsVector::new)
        }
    }

    #[test]
    fn mean_of_one_is_identity() {
        let v = vec![0.3, 1.7, 2.0, 0.123456789, 98.6, 1e-9];
        let mut engine = ScriptedEngine::new(vec![Ok(v.clone())]);
        let cell = aggregate(&mut engine, &params(), 1).expect("test: aggregation succeeds");
        assert_eq!(cell.mean.fields(), v.as_slice());
        assert_eq!(cell.trials, 1);
        assert_eq!(engine.calls, 1);
    }

    #[test]
    fn mean_of_identical_vectors_is_identity() {
        let v = vec![0.0, 0.0, 0.0, 1.0, 2.0, 0.0];
        let mut engine = ScriptedEngine::new((0..5).map(|_| Ok(v.clone())).collect());
        let cell = aggregate(&mut engine, &params(), 5).expect("test: aggregation succeeds");
        assert_eq!(cell.mean.fields(), v.as_slice());
        assert_eq!(engine.calls, 5);
    }

    #[test]
    fn mean_is_per_field() {
        let mut engine = ScriptedEngine::new(vec![
            Ok(vec![1.0, 10.0, 0.0, 2.0, 4.0, 8.0]),
            Ok(vec![3.0, 30.0, 0.0, 4.0, 8.0, 16.0]),
        ]);
        let cell = aggregate(&mut engine, &params(), 2).expect("test: aggregation succeeds");
        assert_eq!(cell.mean.fields(), &[2.0, 20.0, 0.0, 3.0, 6.0, 12.0]);
        assert_eq!(cell.window(), 2);
        assert_eq!(cell.probability(), 0.01);
    }

    #[test]
    fn differing_field_counts_are_shape_mismatch() {
        let mut engine = ScriptedEngine::new(vec![
            Ok(vec![0.0, 0.0, 0.0, 1.0, 2.0, 0.0]),
            Ok(vec![0.0, 0.0, 0.0, 1.0, 2.0, 0.0, 9.0]),
        ]);
        let err = aggregate(&mut engine, &params(), 2);
        assert!(
            matches!(
                err,
                Err(SweepError::ShapeMismatch { trial: 1, expected: 6, found: 7, .. })
            ),
            "expected ShapeMismatch, got {err:?}"
        );
    }

    #[test]
    fn failing_trial_aborts_cell() {
        let mut engine = ScriptedEngine::new(vec![
            Ok(vec![0.0; 6]),
            Err(EngineError::ExitStatus { code: Some(1), stderr: String::new() }),
            Ok(vec![0.0; 6]),
        ]);
        let err = aggregate(&mut engine, &params(), 3).expect_err("test: cell must fail");
        assert!(matches!(err, SweepError::Engine { trial: 1, .. }));
        assert!(err.engine_error().is_some_and(EngineError::is_invocation));
        // The third trial never runs.
        assert_eq!(engine.calls, 2);
    }

    #[test]
    fn zero_trials_rejected_without_invoking() {
        let mut engine = ScriptedEngine::new(vec![]);
        let err = aggregate(&mut engine, &params(), 0);
        assert!(matches!(err, Err(SweepError::NoTrials)));
        assert_eq!(engine.calls, 0);
    }
}
