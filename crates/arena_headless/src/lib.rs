//! Headless scenario runner for the tick arena.
//!
//! Loads RON scenarios, drives the simulation without graphics and
//! reports each tick as JSON lines. This enables:
//!
//! - **CI verification**: Automated checks of combat logic and determinism
//! - **Batch runs**: Outcome statistics over many seeds
//! - **Tooling**: Any consumer that reads JSON lines can follow a fight
//!
//! # Output
//!
//! - **stdout**: One JSON object per line (see [`runner::Output`])
//! - **stderr**: Logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! cargo run -p arena_headless -- run --scenario scenarios/demo.ron
//! cargo run -p arena_headless -- batch --scenario scenarios/demo.ron --count 500
//! ```

pub mod batch;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, BatchSummary};
pub use runner::{run_scenario, Outcome, RunError, RunSummary, RunnerConfig};
pub use scenario::{Arena, Order, Scenario, ScenarioError};
