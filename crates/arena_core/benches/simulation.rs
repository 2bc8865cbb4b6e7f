//! Simulation benchmarks for arena_core.
//!
//! Run with: `cargo bench -p arena_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use arena_core::grid::Tile;
use arena_core::math::TilePos;
use arena_core::pathfinding::Pathfinder;
use arena_core::world::World;
use arena_test_utils::determinism::step;
use arena_test_utils::fixtures::{duel, open_arena};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Long BFS searches on an open map and around a wall.
pub fn pathfinding_benchmark(c: &mut Criterion) {
    let open = World::new(open_arena(64));
    c.bench_function("bfs_open_64", |b| {
        b.iter(|| {
            let mut finder = Pathfinder::default();
            black_box(finder.find_path(
                &open,
                TilePos::new(0, 0),
                &[TilePos::new(40, 40)],
                1,
                None,
            ))
        })
    });

    let mut grid = open_arena(64);
    grid.fill_rect(TilePos::new(20, 0), 1, 60, Tile::WALL);
    let walled = World::new(grid);
    c.bench_function("bfs_walled_backup", |b| {
        b.iter(|| {
            let mut finder = Pathfinder::default();
            black_box(finder.find_path(
                &walled,
                TilePos::new(5, 5),
                &[TilePos::new(30, 5)],
                1,
                None,
            ))
        })
    });
}

/// A full duel, tick by tick.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("duel_300_ticks", |b| {
        b.iter(|| {
            let (mut sim, _, _) = duel(42);
            for _ in 0..300 {
                step(&mut sim);
            }
            black_box(sim.state_hash())
        })
    });
}

criterion_group!(benches, pathfinding_benchmark, simulation_benchmark);
criterion_main!(benches);
