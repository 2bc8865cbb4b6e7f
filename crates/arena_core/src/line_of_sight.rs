//! Line of sight.
//!
//! Sight is traced tile by tile with a fixed-point ray. The ray walks the
//! dominant axis one tile at a time and checks the tile it enters against
//! the wall on the side it enters from. Whenever the minor coordinate
//! changes it also checks the transitional tile on the minor axis.

use crate::collision::{closest_tile, is_edge_adjacent, overlaps};
use crate::grid::LosMask;
use crate::math::{ray_center, ray_slope, ray_tile, RayFixed, TilePos};
use crate::world::World;

/// Whether a viewer at `from` can see tile `to` within `range`.
///
/// `from_size` is the viewer's footprint. With `multi_tile` set the viewer
/// is treated as a large non-primary actor: at range one it needs edge
/// contact, otherwise the check is re-run from `to` back to the viewer
/// tile closest to it.
#[must_use]
pub fn has_line_of_sight(
    world: &World,
    from: TilePos,
    to: TilePos,
    from_size: i32,
    range: i32,
    multi_tile: bool,
) -> bool {
    if multi_tile {
        if range <= 1 {
            return !is_blocked(world, from)
                && !is_blocked(world, to)
                && !overlaps(from, from_size, to, 1)
                && is_edge_adjacent(from, from_size, to);
        }
        let near = closest_tile(from, from_size, to);
        return has_line_of_sight(world, to, near, 1, range, false);
    }

    if is_blocked(world, from) || is_blocked(world, to) || overlaps(from, from_size, to, 1) {
        return false;
    }
    if range <= 1 {
        return is_edge_adjacent(from, from_size, to);
    }

    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.abs() > range || dy.abs() > range {
        return false;
    }
    cast_ray(world, from, to)
}

/// Whether a tile is opaque from every side.
fn is_blocked(world: &World, tile: TilePos) -> bool {
    world.los_mask(tile).contains(LosMask::FULL)
}

/// Trace a ray between two tile centres.
///
/// Missing tiles count as opaque.
#[must_use]
pub fn cast_ray(world: &World, from: TilePos, to: TilePos) -> bool {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let x_flags = LosMask::FULL | if dx < 0 { LosMask::EAST } else { LosMask::WEST };
    let y_flags = LosMask::FULL | if dy < 0 { LosMask::NORTH } else { LosMask::SOUTH };

    if dx.abs() > dy.abs() {
        walk(world, from.x, to.x, from.y, dy, dx.abs(), x_flags, y_flags, |major, minor| {
            TilePos::new(major, minor)
        })
    } else {
        walk(world, from.y, to.y, from.x, dx, dy.abs(), y_flags, x_flags, |major, minor| {
            TilePos::new(minor, major)
        })
    }
}

/// Step along the major axis from `start` to `end`, sliding along the
/// minor axis by `minor_delta / major_len` per step.
fn walk(
    world: &World,
    start: i32,
    end: i32,
    minor_start: i32,
    minor_delta: i32,
    major_len: i32,
    major_flags: LosMask,
    minor_flags: LosMask,
    tile: impl Fn(i32, i32) -> TilePos,
) -> bool {
    if major_len == 0 {
        return true;
    }
    let step = (end - start).signum();
    let offset = if minor_delta < 0 { -1 } else { 0 };
    let mut scaled = ray_center(minor_start) + RayFixed::from_bits(offset);
    let slope = ray_slope(minor_delta, major_len);

    let mut major = start;
    while major != end {
        major += step;
        let minor = ray_tile(scaled);
        if world.los_mask(tile(major, minor)).intersects(major_flags) {
            return false;
        }
        scaled += slope;
        let next_minor = ray_tile(scaled);
        if next_minor != minor && world.los_mask(tile(major, next_minor)).intersects(minor_flags) {
            return false;
        }
    }
    true
}
