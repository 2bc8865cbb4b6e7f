//! Headless arena runner.
//!
//! # Usage
//!
//! ```bash
//! # Run a scenario, printing JSON lines
//! cargo run -p arena_headless -- run --scenario scenarios/demo.ron
//!
//! # Pace ticks in real time
//! cargo run -p arena_headless -- run --scenario scenarios/demo.ron --realtime
//!
//! # Run many seeds
//! cargo run -p arena_headless -- batch --scenario scenarios/demo.ron --count 1000 --output results/batch.json
//!
//! # Check determinism
//! cargo run -p arena_headless -- verify --scenario scenarios/demo.ron --seed 42
//! ```

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{run_scenario, RunnerConfig},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "arena_headless")]
#[command(about = "Headless tick arena runner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario once
    Run {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Override the tick limit
        #[arg(long)]
        ticks: Option<u64>,

        /// Override the seed
        #[arg(long)]
        seed: Option<u64>,

        /// Pace ticks at the configured tick length
        #[arg(long)]
        realtime: bool,

        /// Only print the ready and finished lines
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run a scenario over many seeds
    Batch {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Number of runs
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel runs (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Override the tick limit
        #[arg(long)]
        ticks: Option<u64>,

        /// Results file
        #[arg(short, long, default_value = "results/batch.json")]
        output: PathBuf,
    },

    /// Run a seed repeatedly and compare final hashes
    Verify {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Seed to verify
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Number of runs
        #[arg(short, long, default_value = "3")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for output lines)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            ticks,
            seed,
            realtime,
            quiet,
        } => cmd_run(&scenario, ticks, seed, realtime, quiet),
        Commands::Batch {
            scenario,
            count,
            parallel,
            seed,
            ticks,
            output,
        } => cmd_batch(&scenario, count, parallel, seed, ticks, &output),
        Commands::Verify {
            scenario,
            seed,
            runs,
        } => cmd_verify(&scenario, seed, runs),
    }
}

fn load_or_exit(path: &Path) -> Scenario {
    match Scenario::load(path) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Failed to load scenario: {e}");
            std::process::exit(1);
        }
    }
}

/// Run a single scenario, streaming JSON lines to stdout
fn cmd_run(path: &Path, ticks: Option<u64>, seed: Option<u64>, realtime: bool, quiet: bool) {
    let mut scenario = load_or_exit(path);
    if let Some(seed) = seed {
        scenario = scenario.with_seed(seed);
    }

    let config = RunnerConfig {
        max_ticks: ticks,
        realtime,
        quiet,
    };
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if realtime {
        // Flush per line so consumers see ticks as they happen
        let result = run_scenario(&scenario, config, &mut LineFlush(&mut out));
        finish(result.map(|_| ()));
    } else {
        finish(run_scenario(&scenario, config, &mut out).map(|_| ()));
    }
}

fn finish(result: Result<(), arena_headless::RunError>) {
    if let Err(e) = result {
        eprintln!("Run failed: {e}");
        std::process::exit(1);
    }
}

/// Run a scenario across many seeds
fn cmd_batch(
    path: &Path,
    count: u32,
    parallel: u32,
    seed: u64,
    ticks: Option<u64>,
    output: &Path,
) {
    let scenario = load_or_exit(path);
    let config = BatchConfig {
        runs: count,
        seed_start: seed,
        max_ticks: ticks,
        parallel,
    };

    let results = run_batch(&scenario, config);
    let s = &results.summary;
    eprintln!("Scenario:    {}", results.scenario);
    eprintln!("Runs:        {}", results.runs.len());
    eprintln!("Player wins: {}", s.player_wins);
    eprintln!("NPC wins:    {}", s.npc_wins);
    eprintln!("Draws:       {}", s.draws);
    eprintln!("Timeouts:    {}", s.timeouts);
    eprintln!("Mean ticks:  {:.1}", s.mean_ticks);
    eprintln!("Errors:      {}", results.errors.len());

    if let Err(e) = results.save(output) {
        eprintln!("Failed to save results: {e}");
        std::process::exit(1);
    }
    tracing::info!("Results saved to {}", output.display());
}

/// Verify determinism for a seed
fn cmd_verify(path: &Path, seed: u64, runs: u32) {
    let scenario = load_or_exit(path);
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario.name,
        seed,
        runs
    );

    if verify_determinism(&scenario, seed, runs) {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        std::process::exit(1);
    }
}

/// Writer that flushes after every newline.
struct LineFlush<'a, W: Write>(&'a mut W);

impl<W: Write> Write for LineFlush<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.0.write(buf)?;
        if buf[..n].contains(&b'\n') {
            self.0.flush()?;
        }
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}
