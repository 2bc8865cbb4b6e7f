//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! A run must be reproducible from its seed and order log. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: Combat rolls and experience use
//!   [`arena_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Ticks always iterate in sorted entity id order.
//!
//! - **System randomness**: Every roll comes from the seeded
//!   [`arena_core::rng::SimRng`].
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual phases (movement, combat, delivery)
//! 2. **Property tests**: Random maps and seeds still replay exactly
//! 3. **Integration tests**: Full scenarios are reproducible
//! 4. **Parallel tests**: Running N simulations on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use arena_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Advance a simulation by one tick.
///
/// # Panics
///
/// Panics if the tick reports an invariant violation.
pub fn step(sim: &mut Simulation) {
    if let Err(err) = sim.tick() {
        panic!("tick {} failed: {err}", sim.get_tick());
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```ignore
/// use arena_test_utils::determinism::{step, verify_determinism};
/// use arena_test_utils::fixtures::duel;
///
/// let result = verify_determinism(
///     5,  // Run 5 times
///     100, // 100 ticks each
///     || duel(42).0,
///     step,
///     |sim| sim.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Simplified determinism verification for [`Simulation`].
///
/// Runs the simulation twice with identical setup and verifies the final
/// state hashes match exactly.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    verify_determinism(2, num_ticks, &setup_fn, step, Simulation::state_hash).is_deterministic
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        step(&mut sim);
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(hash) => hash,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        step(&mut sim1);
        step(&mut sim2);

        if sim1.state_hash() != sim2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for simulation testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based tests.
pub mod strategies {
    use arena_core::components::Stats;
    use arena_core::math::TilePos;
    use proptest::prelude::*;

    /// A tile inside a square map of side `side`.
    pub fn arb_tile(side: i32) -> impl Strategy<Value = TilePos> {
        (0..side, 0..side).prop_map(|(x, y)| TilePos::new(x, y))
    }

    /// Footprint side length (1-3).
    pub fn arb_size() -> impl Strategy<Value = i32> {
        1i32..=3
    }

    /// Skill level (1-99).
    pub fn arb_level() -> impl Strategy<Value = i32> {
        1i32..=99
    }

    /// A full stat block with independent levels.
    pub fn arb_stats() -> impl Strategy<Value = Stats> {
        (
            arb_level(),
            arb_level(),
            arb_level(),
            arb_level(),
            arb_level(),
            arb_level(),
        )
            .prop_map(|(attack, strength, defence, ranged, magic, hitpoint)| Stats {
                attack,
                strength,
                defence,
                ranged,
                magic,
                hitpoint,
                prayer: 99,
            })
    }

    /// Equipment bonus (-64 to 200).
    pub fn arb_bonus() -> impl Strategy<Value = i32> {
        -64i32..200
    }

    /// Simulation seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// A set of wall tiles inside a square map.
    pub fn arb_walls(side: i32, max_walls: usize) -> impl Strategy<Value = Vec<TilePos>> {
        proptest::collection::vec(arb_tile(side), 0..max_walls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{arena_sim, duel, player_params};
    use arena_core::math::TilePos;
    use proptest::prelude::*;

    // =========================================================================
    // Basic determinism tests
    // =========================================================================

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_empty_simulation_determinism() {
        assert!(verify_simulation_determinism(|| arena_sim(10, 0), 100));
    }

    #[test]
    fn test_duel_determinism() {
        let result = verify_determinism(3, 200, || duel(42).0, step, Simulation::state_hash);
        result.assert_deterministic();
    }

    #[test]
    fn test_parallel_duels_match() {
        run_parallel_simulations(|| duel(9).0, 4, 150).assert_deterministic();
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(|| duel(3).0, 100), None);
    }

    #[test]
    fn test_seed_changes_outcome() {
        let hashes: Vec<u64> = (0..4)
            .map(|seed| {
                let (mut sim, _, _) = duel(seed);
                for _ in 0..200 {
                    step(&mut sim);
                }
                sim.state_hash()
            })
            .collect();
        let mut unique = hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        assert!(unique.len() > 1);
    }

    #[test]
    fn test_compute_hash_stable() {
        assert_eq!(compute_hash(&(1, 2)), compute_hash(&(1, 2)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_walk_is_deterministic(
            seed in strategies::arb_seed(),
            start in strategies::arb_tile(16),
            goal in strategies::arb_tile(16),
        ) {
            let setup = || {
                let mut sim = arena_sim(16, seed);
                let id = sim.spawn_unit(player_params(start));
                let _ = sim.request_move(id, goal);
                sim
            };
            prop_assert!(verify_simulation_determinism(setup, 20));
        }

        #[test]
        fn test_walk_reaches_goal_on_open_map(
            start in strategies::arb_tile(16),
            goal in strategies::arb_tile(16),
        ) {
            let mut sim = arena_sim(16, 0);
            let id = sim.spawn_unit(player_params(start));
            sim.request_move(id, goal).unwrap();
            // Running covers two tiles a tick; 16 tiles is the longest route.
            for _ in 0..8 {
                step(&mut sim);
            }
            prop_assert_eq!(sim.entity(id).map(|e| e.position), Some(goal));
            prop_assert_eq!(sim.unit(id).and_then(|u| u.destination), None::<TilePos>);
        }
    }
}
