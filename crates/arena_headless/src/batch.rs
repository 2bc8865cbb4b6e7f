//! Batch scenario runner.
//!
//! Runs one scenario across many seeds in parallel using rayon and
//! collects outcome statistics.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::runner::{run_scenario, Outcome, RunSummary, RunnerConfig};
use crate::scenario::Scenario;

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of runs
    pub runs: u32,
    /// Seed of the first run; later runs count up from it
    pub seed_start: u64,
    /// Override the scenario's tick limit
    pub max_ticks: Option<u64>,
    /// Maximum parallel runs (0 = use rayon default)
    pub parallel: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            runs: 100,
            seed_start: 0,
            max_ticks: None,
            parallel: 0,
        }
    }
}

impl BatchConfig {
    /// Create config for a number of runs
    #[must_use]
    pub fn new(runs: u32) -> Self {
        Self {
            runs,
            ..Default::default()
        }
    }

    /// Set seed start
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }
}

/// Error during a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Aggregate outcome counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Runs won by players
    pub player_wins: u32,
    /// Runs won by NPCs
    pub npc_wins: u32,
    /// Runs where both sides died
    pub draws: u32,
    /// Runs that hit the tick limit
    pub timeouts: u32,
    /// Mean ticks per run
    pub mean_ticks: f64,
    /// Mean damage per run
    pub mean_damage: f64,
}

impl BatchSummary {
    /// Summarize finished runs.
    #[must_use]
    pub fn from_runs(runs: &[RunSummary]) -> Self {
        let mut summary = Self::default();
        for run in runs {
            match run.outcome {
                Outcome::PlayersWin => summary.player_wins += 1,
                Outcome::NpcsWin => summary.npc_wins += 1,
                Outcome::Draw => summary.draws += 1,
                Outcome::TimeLimit => summary.timeouts += 1,
            }
        }
        if !runs.is_empty() {
            let n = runs.len() as f64;
            summary.mean_ticks = runs.iter().map(|r| r.ticks as f64).sum::<f64>() / n;
            summary.mean_damage = runs.iter().map(|r| r.damage as f64).sum::<f64>() / n;
        }
        summary
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Scenario name
    pub scenario: String,
    /// Configuration used
    pub config: BatchConfig,
    /// Individual runs, by seed
    pub runs: Vec<RunSummary>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run a scenario once per seed.
#[must_use]
pub fn run_batch(scenario: &Scenario, config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        "Starting batch run: {} runs of '{}'",
        config.runs, scenario.name
    );

    if config.parallel > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let runner = RunnerConfig {
        max_ticks: config.max_ticks,
        realtime: false,
        quiet: true,
    };

    let results: Vec<Result<RunSummary, BatchError>> = (0..config.runs)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            run_scenario(&scenario.with_seed(seed), runner, &mut std::io::sink()).map_err(|e| {
                warn!("Run with seed {} failed: {}", seed, e);
                BatchError {
                    seed,
                    message: e.to_string(),
                }
            })
        })
        .collect();

    let (runs, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let runs: Vec<RunSummary> = runs.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_runs(&runs);
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        "Batch complete: {} runs in {:.1}s ({} failed)",
        runs.len(),
        duration_seconds,
        errors.len()
    );

    BatchResults {
        scenario: scenario.name.clone(),
        config,
        runs,
        summary,
        duration_seconds,
        errors,
    }
}

/// Run the same seed several times and compare final hashes.
#[must_use]
pub fn verify_determinism(scenario: &Scenario, seed: u64, runs: u32) -> bool {
    let seeded = scenario.with_seed(seed);
    let runner = RunnerConfig {
        quiet: true,
        ..RunnerConfig::default()
    };

    let hashes: Vec<Option<(u64, u64)>> = (0..runs.max(2))
        .into_par_iter()
        .map(|_| {
            run_scenario(&seeded, runner, &mut std::io::sink())
                .ok()
                .map(|summary| (summary.ticks, summary.state_hash))
        })
        .collect();

    let Some(Some(first)) = hashes.first().copied() else {
        warn!("First verification run failed");
        return false;
    };
    hashes.iter().all(|h| *h == Some(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(outcome: Outcome, ticks: u64) -> RunSummary {
        RunSummary {
            scenario: "s".into(),
            seed: 0,
            ticks,
            outcome,
            hits: 0,
            damage: 10,
            rejected_orders: 0,
            state_hash: 0,
        }
    }

    #[test]
    fn test_summary_counts() {
        let runs = [
            summary(Outcome::PlayersWin, 10),
            summary(Outcome::PlayersWin, 20),
            summary(Outcome::NpcsWin, 30),
            summary(Outcome::TimeLimit, 60),
        ];
        let s = BatchSummary::from_runs(&runs);
        assert_eq!(s.player_wins, 2);
        assert_eq!(s.npc_wins, 1);
        assert_eq!(s.draws, 0);
        assert_eq!(s.timeouts, 1);
        assert!((s.mean_ticks - 30.0).abs() < 1e-9);
        assert!((s.mean_damage - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(BatchSummary::from_runs(&[]), BatchSummary::default());
    }
}
