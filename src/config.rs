// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Harness configuration.
//!
//! `ExperimentConfig` is the immutable sweep input. `EngineConfig` and
//! `PlotConfig` describe the two collaborators at either end of the pipeline.
//! All three can be loaded together from one TOML file.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::types::TrialParams;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid experiment config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// ExperimentConfig
// ---------------------------------------------------------------------------

/// Sweep grid plus the values shared by every cell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    /// `-N`: number of contending nodes.
    pub node_count: u32,
    /// `-p` values, inner loop, in sweep order.
    pub probabilities: Vec<f64>,
    /// `-W` values, outer loop, in sweep order.
    pub windows: Vec<u32>,
    /// `-M`: simulated slots per trial.
    pub max_slots: u64,
    /// Engine runs averaged into each cell.
    pub trials: usize,
    /// `-r`: passed through to the engine untouched.
    pub repetitions: u32,
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_count == 0 {
            return Err(ConfigError::Invalid("node_count must be positive".into()));
        }
        if self.windows.is_empty() {
            return Err(ConfigError::Invalid("windows must not be empty".into()));
        }
        if let Some(w) = self.windows.iter().find(|w| **w == 0) {
            return Err(ConfigError::Invalid(format!("window {w} must be positive")));
        }
        if self.probabilities.is_empty() {
            return Err(ConfigError::Invalid("probabilities must not be empty".into()));
        }
        // NaN fails both comparisons, so it is rejected here too.
        if let Some(p) = self
            .probabilities
            .iter()
            .find(|p| !(**p > 0.0 && **p <= 1.0))
        {
            return Err(ConfigError::Invalid(format!(
                "probability {p} is outside (0, 1]"
            )));
        }
        if self.max_slots == 0 {
            return Err(ConfigError::Invalid("max_slots must be positive".into()));
        }
        if self.trials == 0 {
            return Err(ConfigError::Invalid("trials must be at least 1".into()));
        }
        Ok(())
    }

    pub fn cell_count(&self) -> usize {
        self.windows.len() * self.probabilities.len()
    }

    /// Engine parameters for one cell.
    pub fn trial_params(&self, window: u32, probability: f64) -> TrialParams {
        TrialParams {
            node_count: self.node_count,
            window,
            probability,
            max_slots: self.max_slots,
            repetitions: self.repetitions,
        }
    }
}

impl ExperimentConfig {
    /// The reference study grid: 50 nodes, W in {2, 4}, five probabilities
    /// from 0.01 to 0.1, 100000 slots, r = 1000. The trial count has no
    /// reference value and must be chosen by the caller.
    pub fn reference_grid(trials: usize) -> Self {
        Self {
            node_count: 50,
            probabilities: vec![0.01, 0.02, 0.03, 0.05, 0.1],
            windows: vec![2, 4],
            max_slots: 100_000,
            trials,
            repetitions: 1000,
        }
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// How to launch the external simulation engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Executable to spawn.
    pub program: String,
    /// Arguments placed before the parameter flags (e.g. the class name for
    /// a JVM-hosted engine).
    pub args: Vec<String>,
    /// Minimum number of output lines a successful run must print.
    pub min_fields: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "java".to_string(),
            args: vec!["sender".to_string()],
            min_fields: 6,
        }
    }
}

// ---------------------------------------------------------------------------
// PlotConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotConfig {
    /// Figure destination. A `.svg` extension selects the SVG backend.
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Overlay a point marker at every sample.
    pub markers: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("aloha_sweep.png"),
            width: 1024,
            height: 768,
            markers: true,
        }
    }
}

// ---------------------------------------------------------------------------
// HarnessConfig
// ---------------------------------------------------------------------------

/// Top-level file layout: `[experiment]`, `[engine]`, `[plot]`.
///
/// `[experiment]` is mandatory so the trial count is always stated; the
/// other two tables fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    pub experiment: ExperimentConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub plot: PlotConfig,
}

impl HarnessConfig {
    /// Default engine and plot settings around `experiment`.
    pub fn new(experiment: ExperimentConfig) -> Self {
        Self {
            experiment,
            engine: EngineConfig::default(),
            plot: PlotConfig::default(),
        }
    }

    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }
}

// ---------------------------------------------------------------------------
