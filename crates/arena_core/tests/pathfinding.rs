//! Property tests for pathing, collision and sight.

use arena_core::collision::{footprint_gap, is_edge_adjacent, overlaps};
use arena_core::grid::{GridMap, Tile};
use arena_core::line_of_sight::has_line_of_sight;
use arena_core::math::TilePos;
use arena_core::pathfinding::Pathfinder;
use arena_core::world::World;
use arena_test_utils::determinism::strategies::{arb_size, arb_tile, arb_walls};
use proptest::prelude::*;

const SIDE: i32 = 16;

fn walled(walls: &[TilePos]) -> World {
    let mut grid = GridMap::filled(TilePos::new(0, 0), SIDE, SIDE);
    for &wall in walls {
        grid.set(wall, Tile::WALL);
    }
    World::new(grid)
}

proptest! {
    #[test]
    fn test_overlap_is_symmetric(
        a in arb_tile(SIDE),
        a_size in arb_size(),
        b in arb_tile(SIDE),
        b_size in arb_size(),
    ) {
        prop_assert_eq!(overlaps(a, a_size, b, b_size), overlaps(b, b_size, a, a_size));
        prop_assert_eq!(footprint_gap(a, a_size, b, b_size), footprint_gap(b, b_size, a, a_size));
        prop_assert_eq!(overlaps(a, a_size, b, b_size), footprint_gap(a, a_size, b, b_size) == 0);
    }

    #[test]
    fn test_edge_contact_never_overlaps(
        anchor in arb_tile(SIDE),
        size in arb_size(),
        tile in arb_tile(SIDE),
    ) {
        if is_edge_adjacent(anchor, size, tile) {
            prop_assert!(!overlaps(anchor, size, tile, 1));
            prop_assert_eq!(footprint_gap(anchor, size, tile, 1), 1);
        }
    }

    #[test]
    fn test_route_never_cuts_corners(
        walls in arb_walls(SIDE, 60),
        start in arb_tile(SIDE),
        goal in arb_tile(SIDE),
    ) {
        let world = walled(&walls);
        prop_assume!(world.grid.is_walkable(start));

        let mut finder = Pathfinder::default();
        let Some(path) = finder.find_path(&world, start, &[goal], 1, None) else {
            return Ok(());
        };

        let mut previous = start;
        for &tile in &path.route {
            prop_assert!(world.grid.is_walkable(tile));
            prop_assert_eq!(previous.chebyshev(tile), 1);
            let (dx, dy) = (tile.x - previous.x, tile.y - previous.y);
            if dx != 0 && dy != 0 {
                prop_assert!(world.grid.is_walkable(previous.offset(dx, 0)));
                prop_assert!(world.grid.is_walkable(previous.offset(0, dy)));
            }
            previous = tile;
        }
        prop_assert_eq!(previous, path.destination);
        if path.exact {
            prop_assert_eq!(path.destination, goal);
        } else {
            prop_assert!(path.destination.chebyshev(goal) <= 10);
        }
    }

    #[test]
    fn test_open_map_routes_are_shortest(
        start in arb_tile(SIDE),
        goal in arb_tile(SIDE),
    ) {
        let world = walled(&[]);
        let mut finder = Pathfinder::default();
        let path = finder.find_path(&world, start, &[goal], 1, None);
        prop_assert!(path.is_some());
        let path = path.unwrap();
        prop_assert!(path.exact);
        prop_assert_eq!(path.route.len() as i32, start.chebyshev(goal));
    }

    #[test]
    fn test_cached_query_matches_fresh(
        walls in arb_walls(SIDE, 40),
        start in arb_tile(SIDE),
        goal in arb_tile(SIDE),
    ) {
        let world = walled(&walls);
        let mut warm = Pathfinder::default();
        let first = warm.find_path(&world, start, &[goal], 1, None);
        let second = warm.find_path(&world, start, &[goal], 1, None);
        let fresh = Pathfinder::default().find_path(&world, start, &[goal], 1, None);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &fresh);
    }

    #[test]
    fn test_open_map_sight_within_range(
        from in arb_tile(SIDE),
        to in arb_tile(SIDE),
    ) {
        prop_assume!(from != to);
        let world = walled(&[]);
        let seen = has_line_of_sight(&world, from, to, 1, 10, false);
        prop_assert_eq!(seen, from.chebyshev(to) <= 10);
    }
}

#[test]
fn test_detour_around_wall() {
    let grid = GridMap::from_rows(
        TilePos::new(0, 0),
        &[
            ".......",
            "...#...",
            "...#...",
            "...#...",
            ".......",
        ],
    );
    let world = World::new(grid);
    let mut finder = Pathfinder::default();
    let path = finder
        .find_path(&world, TilePos::new(1, 2), &[TilePos::new(5, 2)], 1, None)
        .unwrap();
    assert!(path.exact);
    assert!(path.route.iter().all(|&t| world.grid.is_walkable(t)));
    // South is searched before north, so the route takes the lower gap.
    let expected: Vec<_> = [(1, 1), (2, 0), (3, 0), (4, 0), (4, 1), (5, 2)]
        .into_iter()
        .map(|(x, y)| TilePos::new(x, y))
        .collect();
    assert_eq!(path.route, expected);
}

#[test]
fn test_walled_in_goal_uses_backup() {
    let grid = GridMap::from_rows(
        TilePos::new(0, 0),
        &[
            ".........",
            ".....###.",
            ".....#.#.",
            ".....###.",
            ".........",
        ],
    );
    let world = World::new(grid);
    let mut finder = Pathfinder::default();
    let path = finder
        .find_path(&world, TilePos::new(0, 2), &[TilePos::new(6, 2)], 1, None)
        .unwrap();
    assert!(!path.exact);
    assert_eq!(path.destination, TilePos::new(4, 2));
}

#[test]
fn test_reachable_goal_inside_visit_budget_is_exact() {
    let world = World::new(GridMap::filled(TilePos::new(0, 0), 100, 100));
    // Reaching (15, 15) from the corner dequeues 256 nodes.
    for cap in [1_000, 256] {
        let mut finder = Pathfinder::new(cap, 10);
        let path = finder
            .find_path(&world, TilePos::new(0, 0), &[TilePos::new(15, 15)], 1, None)
            .unwrap();
        assert!(path.exact, "cap {cap}");
        assert_eq!(path.destination, TilePos::new(15, 15));
        assert_eq!(path.route.len(), 15);
    }
}

#[test]
fn test_node_cap_falls_back_to_nearest_explored_tile() {
    let world = World::new(GridMap::filled(TilePos::new(0, 0), 100, 100));
    let mut finder = Pathfinder::new(1_000, 10);
    let path = finder
        .find_path(&world, TilePos::new(0, 0), &[TilePos::new(40, 0)], 1, None)
        .unwrap();
    assert!(!path.exact);
    assert_eq!(path.destination, TilePos::new(32, 0));
    assert_eq!(path.route.len(), 32);
    assert_eq!(path.route.last(), Some(&TilePos::new(32, 0)));
}

#[test]
fn test_node_cap_in_corridor() {
    let world = World::new(GridMap::filled(TilePos::new(0, 0), 40, 1));
    let mut finder = Pathfinder::new(10, 10);
    let path = finder
        .find_path(&world, TilePos::new(0, 0), &[TilePos::new(15, 0)], 1, None)
        .unwrap();
    assert!(!path.exact);
    assert_eq!(
        path.route,
        (1..=9).map(|x| TilePos::new(x, 0)).collect::<Vec<_>>()
    );

    // Out of the backup window entirely.
    assert!(finder
        .find_path(&world, TilePos::new(0, 0), &[TilePos::new(30, 0)], 1, None)
        .is_none());
}
