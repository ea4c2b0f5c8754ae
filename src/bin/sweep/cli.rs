// CLI Definition: clap arguments layered over the TOML harness config

use aloha_sweep::{ExperimentConfig, HarnessConfig};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Slotted ALOHA parameter sweep", long_about = None)]
pub struct Cli {
    /// TOML file with [experiment], [engine] and [plot] tables
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Node count passed as -N
    #[arg(short = 'N', long)]
    pub nodes: Option<u32>,

    /// Comma-separated transmission probabilities, swept in the given order
    #[arg(short = 'p', long, value_delimiter = ',')]
    pub probabilities: Option<Vec<f64>>,

    /// Comma-separated backoff windows, swept in the given order
    #[arg(short = 'W', long, value_delimiter = ',')]
    pub windows: Option<Vec<u32>>,

    /// Simulated slots per trial, passed as -M
    #[arg(short = 'M', long)]
    pub max_slots: Option<u64>,

    /// Engine runs averaged into each cell (required without --config)
    #[arg(short, long)]
    pub trials: Option<usize>,

    /// Repetition parameter passed through as -r
    #[arg(short, long)]
    pub repetitions: Option<u32>,

    /// Engine executable; replaces the configured prefix arguments too
    #[arg(long)]
    pub engine: Option<String>,

    /// Argument placed before the parameter flags (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Figure path (.svg for vector output)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Draw the curves without point markers
    #[arg(long)]
    pub no_markers: bool,

    /// Debug logging (per-trial vectors and engine command lines)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Load `--config` if given, otherwise start from the reference grid with
    /// the `--trials` count, then apply the remaining flags.
    pub fn harness_config(&self) -> Result<HarnessConfig> {
        let mut cfg = match &self.config {
            Some(path) => HarnessConfig::load(path)
                .with_context(|| format!("Failed to load harness config: {}", path.display()))?,
            None => {
                let trials = self
                    .trials
                    .context("--trials is required when no --config file is given")?;
                HarnessConfig::new(ExperimentConfig::reference_grid(trials))
            }
        };
        self.apply(&mut cfg);
        Ok(cfg)
    }

    /// Apply every flag that was given on top of `cfg`.
    pub fn apply(&self, cfg: &mut HarnessConfig) {
        let exp = &mut cfg.experiment;
        if let Some(n) = self.nodes {
            exp.node_count = n;
        }
        if let Some(p) = &self.probabilities {
            exp.probabilities = p.clone();
        }
        if let Some(w) = &self.windows {
            exp.windows = w.clone();
        }
        if let Some(m) = self.max_slots {
            exp.max_slots = m;
        }
        if let Some(t) = self.trials {
            exp.trials = t;
        }
        if let Some(r) = self.repetitions {
            exp.repetitions = r;
        }

        if let Some(program) = &self.engine {
            cfg.engine.program = program.clone();
            cfg.engine.args = self.engine_args.clone();
        } else if !self.engine_args.is_empty() {
            cfg.engine.args = self.engine_args.clone();
        }

        if let Some(out) = &self.output {
            cfg.plot.output = out.clone();
        }
        if self.no_markers {
            cfg.plot.markers = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sweep").chain(args.iter().copied()))
            .expect("test: args parse")
    }

    fn reference(trials: usize) -> HarnessConfig {
        HarnessConfig::new(ExperimentConfig::reference_grid(trials))
    }

    #[test]
    fn no_flags_keep_config() {
        let mut cfg = reference(5);
        parse(&[]).apply(&mut cfg);
        assert_eq!(cfg, reference(5));
    }

    #[test]
    fn trials_required_without_config_file() {
        let err = parse(&["-W", "2"]).harness_config();
        assert!(err.is_err(), "a trial count was picked without --trials");

        let cfg = parse(&["--trials", "1"]).harness_config().expect("test: trials given");
        assert_eq!(cfg, reference(1));
    }

    #[test]
    fn config_file_supplies_trials() {
        let dir = tempfile::tempdir().expect("test: tempdir");
        let path = dir.path().join("grid.toml");
        std::fs::write(
            &path,
            "[experiment]\nnode_count = 10\nprobabilities = [0.1]\nwindows = [2]\n\
             max_slots = 500\ntrials = 3\nrepetitions = 1\n",
        )
        .expect("test: write config");

        let path_arg = path.to_str().expect("test: utf-8 path");
        let cfg = parse(&["-c", path_arg]).harness_config().expect("test: config loads");
        assert_eq!(cfg.experiment.trials, 3);
        let cfg = parse(&["-c", path_arg, "-t", "7"]).harness_config().expect("test: config loads");
        assert_eq!(cfg.experiment.trials, 7);
    }

    #[test]
    fn grid_flags_override_experiment() {
        let mut cfg = reference(5);
        parse(&["-W", "8,2", "-p", "0.1,0.05", "--trials", "1", "-N", "10"]).apply(&mut cfg);
        assert_eq!(cfg.experiment.windows, vec![8, 2]);
        assert_eq!(cfg.experiment.probabilities, vec![0.1, 0.05]);
        assert_eq!(cfg.experiment.trials, 1);
        assert_eq!(cfg.experiment.node_count, 10);
        assert_eq!(cfg.experiment.max_slots, 100_000);
    }

    #[test]
    fn engine_flag_resets_prefix_args() {
        let mut cfg = reference(5);
        parse(&["--engine", "./sender"]).apply(&mut cfg);
        assert_eq!(cfg.engine.program, "./sender");
        assert!(cfg.engine.args.is_empty());

        let mut cfg = reference(5);
        parse(&["--engine", "java", "--engine-arg", "-cp", "--engine-arg", "bin", "--engine-arg", "sender"])
            .apply(&mut cfg);
        assert_eq!(cfg.engine.args, vec!["-cp", "bin", "sender"]);
    }

    #[test]
    fn plot_flags_override_plot() {
        let mut cfg = reference(5);
        parse(&["-o", "curves.svg", "--no-markers"]).apply(&mut cfg);
        assert_eq!(cfg.plot.output, PathBuf::from("curves.svg"));
        assert!(!cfg.plot.markers);
    }
}
