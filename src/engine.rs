// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Simulation engine boundary.
//!
//! The channel-contention simulator is an external program. The harness only
//! knows its flag contract (`-N -W -p -M -m -r`) and that it prints one number
//! per line on success. [`SimulationEngine`] is the seam: production runs use
//! [`ProcessEngine`], tests plug in stubs.

use std::process::Command;

use tracing::debug;

use crate::config::EngineConfig;
use crate::types::{MetricsVector, TrialParams};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from one engine invocation.
///
/// `Spawn` and `ExitStatus` mean the run itself failed; `MissingFields` and
/// `InvalidNumber` mean it ran but its output broke the line contract.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start engine `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("engine exited with {}: {stderr}", exit_label(.code))]
    ExitStatus { code: Option<i32>, stderr: String },
    #[error("engine printed {found} numeric lines, expected at least {expected}")]
    MissingFields { expected: usize, found: usize },
    #[error("engine output line {line} is not a number: {text:?}")]
    InvalidNumber { line: usize, text: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "a signal".to_string(),
    }
}

impl EngineError {
    /// The process could not start or did not exit cleanly.
    pub fn is_invocation(&self) -> bool {
        matches!(self, Self::Spawn { .. } | Self::ExitStatus { .. })
    }

    /// The process succeeded but its stdout was unusable.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::MissingFields { .. } | Self::InvalidNumber { .. })
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Runs one trial for a parameter combination.
pub trait SimulationEngine {
    fn invoke(&mut self, params: &TrialParams) -> Result<MetricsVector, EngineError>;
}

impl<E: SimulationEngine + ?Sized> SimulationEngine for &mut E {
    fn invoke(&mut self, params: &TrialParams) -> Result<MetricsVector, EngineError> {
        (**self).invoke(params)
    }
}

// ---------------------------------------------------------------------------
// Output parsing
// ---------------------------------------------------------------------------

/// Parse engine stdout: one number per line, in positional order.
///
/// Trailing blank lines are ignored; a blank line in the middle is an
/// invalid number. Lines beyond `min_fields` are kept.
pub fn parse_metrics(stdout: &str, min_fields: usize) -> Result<MetricsVector, EngineError> {
    let lines: Vec<&str> = stdout.trim_end().lines().collect();
    let mut fields = Vec::with_capacity(lines.len());
    for (i, raw) in lines.iter().enumerate() {
        let text = raw.trim();
        let value: f64 = text.parse().map_err(|_| EngineError::InvalidNumber {
            line: i + 1,
            text: text.to_string(),
        })?;
        fields.push(value);
    }
    if fields.len() < min_fields {
        return Err(EngineError::MissingFields {
            expected: min_fields,
            found: fields.len(),
        });
    }
    Ok(MetricsVector::new(fields))
}

// ---------------------------------------------------------------------------
// ProcessEngine
// ---------------------------------------------------------------------------

/// Launches the external engine as a child process and waits for it.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: String,
    prefix_args: Vec<String>,
    min_fields: usize,
}

impl ProcessEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
            min_fields: EngineConfig::default().min_fields,
        }
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            program: cfg.program.clone(),
            prefix_args: cfg.args.clone(),
            min_fields: cfg.min_fields,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefix_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_min_fields(mut self, min_fields: usize) -> Self {
        self.min_fields = min_fields;
        self
    }

    /// Arguments after the program name: prefix args, then the flag contract.
    pub fn arguments(&self, params: &TrialParams) -> Vec<String> {
        let mut args = self.prefix_args.clone();
        args.extend([
            "-N".to_string(),
            params.node_count.to_string(),
            "-W".to_string(),
            params.window.to_string(),
            "-p".to_string(),
            params.probability.to_string(),
            "-M".to_string(),
            params.max_slots.to_string(),
            "-m".to_string(),
            "-r".to_string(),
            params.repetitions.to_string(),
        ]);
        args
    }

    /// Full argv, program first.
    pub fn command_line(&self, params: &TrialParams) -> Vec<String> {
        let mut argv = vec![self.program.clone()];
        argv.extend(self.arguments(params));
        argv
    }
}

impl SimulationEngine for ProcessEngine {
    fn invoke(&mut self, params: &TrialParams) -> Result<MetricsVector, EngineError> {
        let args = self.arguments(params);
        debug!(program = %self.program, args = ?args, "launching engine");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(EngineError::ExitStatus {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_metrics(&String::from_utf8_lossy(&output.stdout), self.min_fields)
    }
}

// ---------------------------------------------------------------------------
