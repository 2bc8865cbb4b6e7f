//! Sparse tile map.
//!
//! Tiles are keyed by integer coordinate. A coordinate with no entry is
//! not part of the world: it is neither walkable nor transparent.

use std::collections::HashMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::math::TilePos;

bitflags! {
    /// Directional line-of-sight blockers for a single tile.
    ///
    /// A directional bit names the tile edge that carries a wall. A ray
    /// entering the tile across that edge is blocked; rays entering from
    /// other sides pass. `FULL` blocks from every side.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct LosMask: u8 {
        /// Wall on the north edge.
        const NORTH = 0b0000_0001;
        /// Wall on the east edge.
        const EAST = 0b0000_0010;
        /// Wall on the south edge.
        const SOUTH = 0b0000_0100;
        /// Wall on the west edge.
        const WEST = 0b0000_1000;
        /// Solid tile, opaque from all sides.
        const FULL = 0b0001_0000;
    }
}

/// Tile metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    /// Units may stand on this tile.
    pub walkable: bool,
    /// Line-of-sight blockers on this tile.
    pub los: LosMask,
}

impl Tile {
    /// Open floor: walkable and transparent.
    pub const FLOOR: Self = Self {
        walkable: true,
        los: LosMask::empty(),
    };

    /// Solid wall: not walkable, blocks sight from every side.
    pub const WALL: Self = Self {
        walkable: false,
        los: LosMask::FULL,
    };

    /// Water or a chasm: not walkable, but sight passes over it.
    pub const GAP: Self = Self {
        walkable: false,
        los: LosMask::empty(),
    };

    /// Whether this tile blocks line of sight from every direction.
    #[must_use]
    pub const fn blocks_line_of_sight(&self) -> bool {
        self.los.contains(LosMask::FULL)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::FLOOR
    }
}

/// Sparse map from coordinate to tile.
///
/// Read-only while a tick runs; edited only between ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMap {
    tiles: HashMap<TilePos, Tile>,
}

impl GridMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rectangular map of open floor anchored at `origin`.
    #[must_use]
    pub fn filled(origin: TilePos, width: i32, height: i32) -> Self {
        let mut map = Self::new();
        map.fill_rect(origin, width, height, Tile::FLOOR);
        map
    }

    /// Set every tile in a rectangle.
    pub fn fill_rect(&mut self, origin: TilePos, width: i32, height: i32, tile: Tile) {
        for y in origin.y..origin.y + height {
            for x in origin.x..origin.x + width {
                self.tiles.insert(TilePos::new(x, y), tile);
            }
        }
    }

    /// Insert or replace a tile.
    pub fn set(&mut self, pos: TilePos, tile: Tile) {
        self.tiles.insert(pos, tile);
    }

    /// Remove a tile from the world.
    pub fn remove(&mut self, pos: TilePos) -> Option<Tile> {
        self.tiles.remove(&pos)
    }

    /// Tile at a coordinate, if it exists.
    #[must_use]
    pub fn get(&self, pos: TilePos) -> Option<Tile> {
        self.tiles.get(&pos).copied()
    }

    /// Whether a coordinate belongs to the world.
    #[must_use]
    pub fn contains(&self, pos: TilePos) -> bool {
        self.tiles.contains_key(&pos)
    }

    /// Whether a coordinate exists and can be stood on.
    #[must_use]
    pub fn is_walkable(&self, pos: TilePos) -> bool {
        self.get(pos).is_some_and(|t| t.walkable)
    }

    /// Whether every tile of an N×N footprint exists and is walkable.
    #[must_use]
    pub fn is_area_walkable(&self, anchor: TilePos, size: i32) -> bool {
        (0..size).all(|dy| (0..size).all(|dx| self.is_walkable(anchor.offset(dx, dy))))
    }

    /// Line-of-sight mask at a coordinate. Missing tiles are opaque.
    #[must_use]
    pub fn los_mask(&self, pos: TilePos) -> LosMask {
        self.get(pos).map_or(LosMask::FULL, |t| t.los)
    }

    /// Number of tiles in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the map has no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Build a map from text rows, top row first (northmost).
    ///
    /// `.` floor, `#` wall, `~` gap; `N`/`E`/`S`/`W` are floor tiles with a
    /// sight-blocking wall on that edge; a space leaves the tile out.
    #[must_use]
    pub fn from_rows<S: AsRef<str>>(origin: TilePos, rows: &[S]) -> Self {
        let mut map = Self::new();
        let height = rows.len() as i32;
        for (row_index, row) in rows.iter().enumerate() {
            let y = origin.y + height - 1 - row_index as i32;
            for (col, ch) in row.as_ref().chars().enumerate() {
                let pos = TilePos::new(origin.x + col as i32, y);
                let tile = match ch {
                    '.' => Tile::FLOOR,
                    '#' => Tile::WALL,
                    '~' => Tile::GAP,
                    'N' => edge_wall(LosMask::NORTH),
                    'E' => edge_wall(LosMask::EAST),
                    'S' => edge_wall(LosMask::SOUTH),
                    'W' => edge_wall(LosMask::WEST),
                    _ => continue,
                };
                map.set(pos, tile);
            }
        }
        map
    }
}

const fn edge_wall(mask: LosMask) -> Tile {
    Tile {
        walkable: true,
        los: mask,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tiles_are_not_walkable() {
        let map = GridMap::filled(TilePos::new(0, 0), 3, 3);
        assert!(map.is_walkable(TilePos::new(2, 2)));
        assert!(!map.is_walkable(TilePos::new(3, 0)));
        assert_eq!(map.los_mask(TilePos::new(-1, 0)), LosMask::FULL);
    }

    #[test]
    fn test_area_walkable() {
        let mut map = GridMap::filled(TilePos::new(0, 0), 4, 4);
        assert!(map.is_area_walkable(TilePos::new(1, 1), 3));
        map.set(TilePos::new(3, 3), Tile::WALL);
        assert!(!map.is_area_walkable(TilePos::new(1, 1), 3));
        assert!(map.is_area_walkable(TilePos::new(0, 0), 3));
    }

    #[test]
    fn test_from_rows_top_row_is_north() {
        let map = GridMap::from_rows(TilePos::new(0, 0), &["#.", ".~"]);
        assert_eq!(map.get(TilePos::new(0, 1)), Some(Tile::WALL));
        assert_eq!(map.get(TilePos::new(1, 1)), Some(Tile::FLOOR));
        assert_eq!(map.get(TilePos::new(1, 0)), Some(Tile::GAP));
        assert!(map.get(TilePos::new(1, 0)).is_some_and(|t| !t.blocks_line_of_sight()));
    }

    #[test]
    fn test_edge_walls_are_walkable() {
        let map = GridMap::from_rows(TilePos::new(0, 0), &["N"]);
        let tile = map.get(TilePos::new(0, 0)).unwrap();
        assert!(tile.walkable);
        assert!(!tile.blocks_line_of_sight());
        assert_eq!(tile.los, LosMask::NORTH);
    }
}
