//! Scenario runner.
//!
//! Drives a built scenario tick by tick, applies scheduled orders and
//! writes one JSON object per line to the output:
//!
//! ```text
//! {"type":"ready","scenario":"Demo","seed":7,"tick_ms":600,"units":[...]}
//! {"type":"tick","events":{"tick":0,"moves":[...],"attacks":[...],...}}
//! {"type":"rejected","tick":3,"error":"Entity 2 is dying"}
//! {"type":"finished","summary":{...}}
//! ```

use std::io::Write;
use std::thread;
use std::time::Instant;

use arena_core::clock::TickClock;
use arena_core::components::UnitRole;
use arena_core::error::GameError;
use arena_core::simulation::{Simulation, TickEvents, UnitSnapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scenario::{Scenario, ScenarioError};

/// Most ticks a real-time run will replay after falling behind.
const MAX_CATCH_UP: u32 = 5;

/// Error type for scenario runs.
#[derive(Error, Debug)]
pub enum RunError {
    /// The scenario could not be built.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// A tick failed; the run cannot continue.
    #[error("Tick failed: {0}")]
    Tick(#[from] GameError),
    /// Writing output failed.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
    /// Encoding output failed.
    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every NPC died.
    PlayersWin,
    /// Every player died.
    NpcsWin,
    /// Both sides died.
    Draw,
    /// The tick limit was reached first.
    TimeLimit,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Seed used.
    pub seed: u64,
    /// Ticks simulated.
    pub ticks: u64,
    /// How the run ended.
    pub outcome: Outcome,
    /// Hits landed, including misses.
    pub hits: u64,
    /// Total damage dealt.
    pub damage: i64,
    /// Orders the simulation rejected.
    pub rejected_orders: u32,
    /// Final state hash.
    pub state_hash: u64,
}

/// Options for a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunnerConfig {
    /// Override the scenario's tick limit.
    pub max_ticks: Option<u64>,
    /// Pace ticks at the configured tick interval.
    pub realtime: bool,
    /// Skip per-tick output lines.
    pub quiet: bool,
}

/// One line of runner output.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Output<'a> {
    /// Scenario built, before the first tick.
    Ready {
        /// Scenario name.
        scenario: &'a str,
        /// Seed in use.
        seed: u64,
        /// Tick interval.
        tick_ms: u64,
        /// Starting units.
        units: Vec<UnitSnapshot>,
    },
    /// Events of one tick.
    Tick {
        /// The events.
        events: &'a TickEvents,
    },
    /// A scheduled order was refused.
    Rejected {
        /// Tick the order was for.
        tick: u64,
        /// Why it was refused.
        error: String,
    },
    /// The run ended.
    Finished {
        /// Run summary.
        summary: &'a RunSummary,
    },
}

fn emit(out: &mut impl Write, line: &Output<'_>) -> Result<(), RunError> {
    serde_json::to_writer(&mut *out, line)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Living units per side.
fn living(sim: &Simulation) -> (usize, usize) {
    sim.snapshots()
        .iter()
        .filter(|s| !s.dying)
        .fold((0, 0), |(players, npcs), s| match s.role {
            UnitRole::Player => (players + 1, npcs),
            UnitRole::Npc => (players, npcs + 1),
        })
}

/// Decide the outcome once a side is wiped out.
fn decided(start: (usize, usize), now: (usize, usize)) -> Option<Outcome> {
    if start.0 == 0 || start.1 == 0 {
        return None;
    }
    match now {
        (0, 0) => Some(Outcome::Draw),
        (0, _) => Some(Outcome::NpcsWin),
        (_, 0) => Some(Outcome::PlayersWin),
        _ => None,
    }
}

/// Run a scenario to completion, writing JSON lines to `out`.
pub fn run_scenario(
    scenario: &Scenario,
    config: RunnerConfig,
    out: &mut impl Write,
) -> Result<RunSummary, RunError> {
    let mut arena = scenario.build()?;
    let max_ticks = config.max_ticks.unwrap_or(scenario.max_ticks);
    let start = living(&arena.sim);

    emit(
        out,
        &Output::Ready {
            scenario: &scenario.name,
            seed: scenario.config.seed,
            tick_ms: scenario.config.tick_ms,
            units: arena.sim.snapshots(),
        },
    )?;
    tracing::info!(scenario = %scenario.name, seed = scenario.config.seed, max_ticks, "run started");

    let mut clock = TickClock::from_millis(scenario.config.tick_ms).with_max_catch_up(MAX_CATCH_UP);
    let mut last = Instant::now();
    let mut hits = 0u64;
    let mut damage = 0i64;
    let mut rejected_orders = 0u32;
    let mut outcome = None;

    while outcome.is_none() && arena.sim.get_tick() < max_ticks {
        let due = if config.realtime {
            let remaining = 1.0 - clock.progress();
            thread::sleep(clock.interval().mul_f64(remaining));
            let now = Instant::now();
            let due = clock.advance(now - last);
            last = now;
            due
        } else {
            1
        };

        for _ in 0..due {
            let tick = arena.sim.get_tick();
            for order in scenario.orders_at(tick) {
                if let Err(err) = arena.apply(order) {
                    rejected_orders += 1;
                    emit(
                        out,
                        &Output::Rejected {
                            tick,
                            error: err.to_string(),
                        },
                    )?;
                }
            }

            let events = arena.sim.tick()?;
            hits += events.hits.len() as u64;
            damage += events
                .hits
                .iter()
                .filter(|h| h.amount > 0)
                .map(|h| i64::from(h.amount))
                .sum::<i64>();
            if !config.quiet {
                emit(out, &Output::Tick { events: &events })?;
            }

            outcome = decided(start, living(&arena.sim));
            if outcome.is_some() || arena.sim.get_tick() >= max_ticks {
                break;
            }
        }
    }

    let summary = RunSummary {
        scenario: scenario.name.clone(),
        seed: scenario.config.seed,
        ticks: arena.sim.get_tick(),
        outcome: outcome.unwrap_or(Outcome::TimeLimit),
        hits,
        damage,
        rejected_orders,
        state_hash: arena.sim.state_hash(),
    };
    emit(out, &Output::Finished { summary: &summary })?;
    out.flush()?;
    tracing::info!(ticks = summary.ticks, outcome = ?summary.outcome, "run finished");
    Ok(summary)
}
