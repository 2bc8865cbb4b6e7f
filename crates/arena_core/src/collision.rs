//! Footprint geometry and occupancy queries.
//!
//! Footprints are axis-aligned N×N squares anchored at their south-west
//! tile. Everything here is a pure query over positions and the entity
//! registry.

use crate::math::TilePos;
use crate::world::{EntityId, EntityStorage};

/// Whether two footprints share at least one tile.
#[must_use]
pub const fn overlaps(a: TilePos, a_size: i32, b: TilePos, b_size: i32) -> bool {
    a.x < b.x + b_size && b.x < a.x + a_size && a.y < b.y + b_size && b.y < a.y + a_size
}

/// Whether a single tile touches a footprint along an edge.
///
/// Diagonal contact does not count, and neither does overlap.
#[must_use]
pub const fn is_edge_adjacent(anchor: TilePos, size: i32, tile: TilePos) -> bool {
    let dx = tile.x - anchor.x;
    let dy = tile.y - anchor.y;
    let within_x = dx >= 0 && dx < size;
    let within_y = dy >= 0 && dy < size;
    (within_x && (dy == -1 || dy == size)) || (within_y && (dx == -1 || dx == size))
}

/// Footprint tile closest to `toward`.
#[must_use]
pub fn closest_tile(anchor: TilePos, size: i32, toward: TilePos) -> TilePos {
    let last = size.max(1) - 1;
    TilePos::new(
        toward.x.clamp(anchor.x, anchor.x + last),
        toward.y.clamp(anchor.y, anchor.y + last),
    )
}

/// Chebyshev distance between the closest tiles of two footprints.
///
/// Zero when the footprints overlap.
#[must_use]
pub fn footprint_gap(a: TilePos, a_size: i32, b: TilePos, b_size: i32) -> i32 {
    let gap_x = (b.x - (a.x + a_size - 1)).max(a.x - (b.x + b_size - 1)).max(0);
    let gap_y = (b.y - (a.y + a_size - 1)).max(a.y - (b.y + b_size - 1)).max(0);
    gap_x.max(gap_y)
}

/// Tiles sharing an edge with a footprint, clockwise from its south-west.
#[must_use]
pub fn edge_neighbours(anchor: TilePos, size: i32) -> Vec<TilePos> {
    let size = size.max(1);
    let mut tiles = Vec::with_capacity(size as usize * 4);
    for i in 0..size {
        tiles.push(anchor.offset(-1, i));
    }
    for i in 0..size {
        tiles.push(anchor.offset(i, size));
    }
    for i in (0..size).rev() {
        tiles.push(anchor.offset(size, i));
    }
    for i in (0..size).rev() {
        tiles.push(anchor.offset(i, -1));
    }
    tiles
}

/// First live static entity blocking movement into a footprint.
#[must_use]
pub fn static_blocker_at(entities: &EntityStorage, anchor: TilePos, size: i32) -> Option<EntityId> {
    entities
        .iter()
        .filter(|e| e.is_static() && e.is_alive() && e.blocks_movement)
        .filter(|e| overlaps(e.position, e.size, anchor, size))
        .map(|e| e.id)
        .min()
}

/// First live space-consuming actor, other than `ignore`, overlapping a footprint.
#[must_use]
pub fn unit_blocker_at(
    entities: &EntityStorage,
    anchor: TilePos,
    size: i32,
    ignore: EntityId,
) -> Option<EntityId> {
    entities
        .iter()
        .filter(|e| e.id != ignore && e.consumes_space())
        .filter(|e| overlaps(e.position, e.size, anchor, size))
        .map(|e| e.id)
        .min()
}

/// Every live entity whose footprint covers a tile, in id order.
#[must_use]
pub fn entities_at(entities: &EntityStorage, tile: TilePos) -> Vec<EntityId> {
    let mut ids: Vec<_> = entities
        .iter()
        .filter(|e| e.is_alive() && e.covers(tile))
        .map(|e| e.id)
        .collect();
    ids.sort_unstable();
    ids
}
