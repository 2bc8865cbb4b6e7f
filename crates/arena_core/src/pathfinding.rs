//! Tile pathfinding.
//!
//! Breadth-first search over the tile grid with a fixed expansion order,
//! so equal-length routes always resolve the same way. When no
//! destination is reached the search falls back to the closest explored
//! tile near the first destination.
//!
//! Walkability queries are memoized per tick. The cache must be cleared
//! before any movement runs in a tick, since units move between ticks.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::collision::{overlaps, static_blocker_at, unit_blocker_at};
use crate::config::SimulationConfig;
use crate::math::TilePos;
use crate::world::{EntityId, World};

/// Expansion order: west, east, south, north, then the diagonals
/// south-west, south-east, north-west, north-east.
const DIRECTIONS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct WalkKey {
    tile: TilePos,
    size: i32,
    avoid: Option<EntityId>,
}

#[derive(Debug, Clone, Copy)]
struct PathNode {
    tile: TilePos,
    parent: Option<usize>,
    length: u32,
}

/// A resolved route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResult {
    /// Last tile of the route: a requested destination or the backup tile.
    pub destination: TilePos,
    /// Tiles from the first step to the destination. Excludes the start.
    pub route: Vec<TilePos>,
    /// Whether the route ends on a requested destination.
    pub exact: bool,
}

/// Movement for one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Where the mover ends the tick.
    pub position: TilePos,
    /// Tiles crossed this tick, ending with `position`.
    pub crossed: Vec<TilePos>,
    /// Where the full route ends.
    pub destination: TilePos,
}

impl Step {
    /// Whether this step reaches the end of the route.
    #[must_use]
    pub fn arrived(&self) -> bool {
        self.position == self.destination
    }
}

/// Breadth-first pathfinder with a per-tick walkability cache.
#[derive(Debug, Clone)]
pub struct Pathfinder {
    max_explored: usize,
    backup_radius: i32,
    walkable: HashMap<WalkKey, bool>,
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

impl Pathfinder {
    /// Create a pathfinder with explicit limits.
    #[must_use]
    pub fn new(max_explored: usize, backup_radius: i32) -> Self {
        Self {
            max_explored: max_explored.max(1),
            backup_radius: backup_radius.max(0),
            walkable: HashMap::new(),
        }
    }

    /// Create a pathfinder from simulation config.
    #[must_use]
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.max_explored_nodes, config.backup_radius)
    }

    /// Drop every memoized walkability result.
    pub fn clear_cache(&mut self) {
        self.walkable.clear();
    }

    /// Number of memoized walkability results.
    #[must_use]
    pub fn cached_queries(&self) -> usize {
        self.walkable.len()
    }

    /// Whether a footprint of `size` may stand at `tile`.
    ///
    /// Tiles must exist and be walkable, and no static blocker may overlap.
    /// With `avoid` set (a space-consuming mover), other space-consuming
    /// actors block as well; the mover itself is ignored.
    pub fn can_tile_be_pathed_to(
        &mut self,
        world: &World,
        tile: TilePos,
        size: i32,
        avoid: Option<EntityId>,
    ) -> bool {
        let key = WalkKey { tile, size, avoid };
        if let Some(&cached) = self.walkable.get(&key) {
            return cached;
        }
        let result = world.grid.is_area_walkable(tile, size)
            && static_blocker_at(&world.entities, tile, size).is_none()
            && avoid.map_or(true, |id| {
                unit_blocker_at(&world.entities, tile, size, id).is_none()
            });
        self.walkable.insert(key, result);
        result
    }

    /// Find a route from `start` to any of `destinations`.
    ///
    /// Returns `None` when every destination is blocked, or when nothing
    /// was reached and no explored tile lies near the first destination.
    pub fn find_path(
        &mut self,
        world: &World,
        start: TilePos,
        destinations: &[TilePos],
        size: i32,
        avoid: Option<EntityId>,
    ) -> Option<PathResult> {
        let first = *destinations.first()?;
        if !destinations
            .iter()
            .any(|&d| self.can_tile_be_pathed_to(world, d, size, avoid))
        {
            return None;
        }

        let mut nodes = vec![PathNode {
            tile: start,
            parent: None,
            length: 0,
        }];
        let mut seen: HashSet<TilePos> = HashSet::from([start]);
        let mut queue = VecDeque::from([0_usize]);
        let mut visited = 0_usize;

        while let Some(index) = queue.pop_front() {
            visited += 1;
            let node = nodes[index];
            if destinations.contains(&node.tile) {
                return Some(Self::unwind(&nodes, index, true));
            }
            if visited >= self.max_explored {
                break;
            }
            for (dx, dy) in DIRECTIONS {
                let next = node.tile.offset(dx, dy);
                if seen.contains(&next) || !self.can_tile_be_pathed_to(world, next, size, avoid)
                {
                    continue;
                }
                if dx != 0
                    && dy != 0
                    && !(self.can_tile_be_pathed_to(world, node.tile.offset(dx, 0), size, avoid)
                        && self.can_tile_be_pathed_to(world, node.tile.offset(0, dy), size, avoid))
                {
                    continue;
                }
                seen.insert(next);
                queue.push_back(nodes.len());
                nodes.push(PathNode {
                    tile: next,
                    parent: Some(index),
                    length: node.length + 1,
                });
            }
        }

        let radius = self.backup_radius;
        let backup = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| {
                (n.tile.x - first.x).abs() <= radius && (n.tile.y - first.y).abs() <= radius
            })
            .min_by_key(|(i, n)| {
                let distance = destinations
                    .iter()
                    .map(|d| n.tile.distance_squared(*d))
                    .min()
                    .unwrap_or(i64::MAX);
                (distance, n.length, *i)
            })
            .map(|(i, _)| i)?;
        tracing::trace!(?start, ?first, backup = ?nodes[backup].tile, "using backup tile");
        Some(Self::unwind(&nodes, backup, false))
    }

    fn unwind(nodes: &[PathNode], end: usize, exact: bool) -> PathResult {
        let mut route = Vec::with_capacity(nodes[end].length as usize);
        let mut cursor = Some(end);
        while let Some(index) = cursor {
            let node = nodes[index];
            if node.parent.is_some() {
                route.push(node.tile);
            }
            cursor = node.parent;
        }
        route.reverse();
        PathResult {
            destination: nodes[end].tile,
            route,
            exact,
        }
    }

    /// Advance up to `speed` tiles toward any of `destinations`.
    pub fn step_toward(
        &mut self,
        world: &World,
        start: TilePos,
        destinations: &[TilePos],
        size: i32,
        avoid: Option<EntityId>,
        speed: usize,
    ) -> Option<Step> {
        let path = self.find_path(world, start, destinations, size, avoid)?;
        let taken = speed.max(1).min(path.route.len());
        let crossed = path.route[..taken].to_vec();
        Some(Step {
            position: crossed.last().copied().unwrap_or(start),
            crossed,
            destination: path.destination,
        })
    }

    /// One direct step toward a target footprint without searching.
    ///
    /// Tries the diagonal first, then the x axis, then the y axis. A step
    /// that would overlap the target is refused.
    pub fn greedy_step(
        &mut self,
        world: &World,
        from: TilePos,
        size: i32,
        avoid: Option<EntityId>,
        target: TilePos,
        target_size: i32,
    ) -> Option<TilePos> {
        let dx = axis_step(from.x, size, target.x, target_size);
        let dy = axis_step(from.y, size, target.y, target_size);
        if dx == 0 && dy == 0 {
            return None;
        }

        let open = |finder: &mut Self, tile: TilePos| {
            finder.can_tile_be_pathed_to(world, tile, size, avoid)
                && !overlaps(tile, size, target, target_size)
        };

        if dx != 0 && dy != 0 {
            let diagonal = from.offset(dx, dy);
            if self.can_tile_be_pathed_to(world, from.offset(dx, 0), size, avoid)
                && self.can_tile_be_pathed_to(world, from.offset(0, dy), size, avoid)
                && open(self, diagonal)
            {
                return Some(diagonal);
            }
        }
        if dx != 0 && open(self, from.offset(dx, 0)) {
            return Some(from.offset(dx, 0));
        }
        if dy != 0 && open(self, from.offset(0, dy)) {
            return Some(from.offset(0, dy));
        }
        None
    }
}

/// Direction along one axis that brings footprint `a` toward footprint `b`.
/// Zero when the two already share that axis span.
const fn axis_step(a: i32, a_size: i32, b: i32, b_size: i32) -> i32 {
    if a + a_size - 1 < b {
        1
    } else if a > b + b_size - 1 {
        -1
    } else {
        0
    }
}
