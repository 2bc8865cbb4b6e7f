//! Fixed-point and tile math for deterministic simulation.
//!
//! Probabilities use [`Fixed`] so that hit chances never touch
//! floating point. The line-of-sight ray walk uses [`RayFixed`], a
//! coordinate scaled by 2^16.

use fixed::types::{I32F32, I48F16};
use serde::{Deserialize, Serialize};

/// Fixed-point number type for probabilities and experience.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point tile coordinate with 16 fractional bits (1 tile = 65536).
pub type RayFixed = I48F16;

/// Raw value of half a tile in [`RayFixed`] units.
pub const HALF_TILE_BITS: i64 = 1 << 15;

/// Integer tile coordinate. `y` grows to the north, `x` to the east.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TilePos {
    /// East-west coordinate.
    pub x: i32,
    /// North-south coordinate.
    pub y: i32,
}

impl TilePos {
    /// Create a tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset this coordinate by a delta.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Chebyshev distance: `max(|dx|, |dy|)`.
    #[must_use]
    pub fn chebyshev(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Squared Euclidean distance (exact, no square root).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        dx * dx + dy * dy
    }
}

impl From<(i32, i32)> for TilePos {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Scale a value by a whole-number percentage, flooring the result.
///
/// Every multiplier in the combat formulas is expressed as a percentage
/// so the arithmetic stays in integers.
#[must_use]
pub fn scale_percent(value: i64, percent: i64) -> i64 {
    (value * percent).div_euclid(100)
}

/// Lift a tile coordinate into ray space, pointing at the tile centre.
#[must_use]
pub fn ray_center(tile: i32) -> RayFixed {
    RayFixed::from_num(tile) + RayFixed::from_bits(HALF_TILE_BITS)
}

/// Drop a ray-space coordinate back to the tile containing it.
#[must_use]
pub fn ray_tile(value: RayFixed) -> i32 {
    // `to_num` discards fractional bits, rounding towards negative infinity.
    value.to_num::<i32>()
}

/// Slope of one tile step along the dominant axis, in ray space.
///
/// Integer division on the raw bits truncates toward zero, matching the
/// reference raycast.
#[must_use]
pub fn ray_slope(minor_delta: i32, major_len: i32) -> RayFixed {
    debug_assert!(major_len > 0, "ray slope needs a positive major length");
    RayFixed::from_bits((i64::from(minor_delta) << 16) / i64::from(major_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chebyshev_distance() {
        assert_eq!(TilePos::new(0, 0).chebyshev(TilePos::new(3, -7)), 7);
        assert_eq!(TilePos::new(5, 5).chebyshev(TilePos::new(5, 5)), 0);
    }

    #[test]
    fn test_distance_squared() {
        // 3² + 4² = 25
        assert_eq!(TilePos::new(0, 0).distance_squared(TilePos::new(3, 4)), 25);
    }

    #[test]
    fn test_scale_percent_floors() {
        assert_eq!(scale_percent(99, 123), 121);
        assert_eq!(scale_percent(118, 100), 118);
        assert_eq!(scale_percent(7, 50), 3);
    }

    #[test]
    fn test_ray_round_trip() {
        for tile in [-5, -1, 0, 1, 42] {
            assert_eq!(ray_tile(ray_center(tile)), tile);
        }
        // Just below a negative tile boundary still floors correctly.
        let below = RayFixed::from_num(-1) - RayFixed::from_bits(1);
        assert_eq!(ray_tile(below), -2);
    }

    #[test]
    fn test_ray_slope_truncates() {
        assert_eq!(ray_slope(1, 2).to_bits(), 1 << 15);
        assert_eq!(ray_slope(-1, 3).to_bits(), -(65536 / 3));
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);
    }
}
