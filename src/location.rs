//! Position types for the three resolutions the analysis works at: pixels,
//! mini tiles (8x8 pixels) and tiles (4x4 mini tiles).
//!
//! All three share the same compact representation: signed 16-bit
//! coordinates, serialized packed into a single `u32`. Ordering is raster
//! order (row first, then column), which the analysis relies on for
//! deterministic tie-breaking.

use crate::constants::*;
use serde::*;
use std::cmp::Ordering;
use std::ops::{Add, Sub};

macro_rules! position_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
        pub struct $name {
            x: i16,
            y: i16,
        }

        impl $name {
            #[inline]
            pub const fn new(x: i32, y: i32) -> Self {
                $name {
                    x: x as i16,
                    y: y as i16,
                }
            }

            #[inline]
            pub fn x(self) -> i32 {
                self.x as i32
            }

            #[inline]
            pub fn y(self) -> i32 {
                self.y as i32
            }

            #[inline]
            pub fn packed_repr(self) -> u32 {
                ((self.x as u16 as u32) << 16) | (self.y as u16 as u32)
            }

            #[inline]
            pub fn from_packed(packed: u32) -> Self {
                $name {
                    x: ((packed >> 16) & 0xFFFF) as u16 as i16,
                    y: (packed & 0xFFFF) as u16 as i16,
                }
            }

            /// Queen-wise (Chebyshev) distance.
            pub fn chebyshev_distance(self, other: Self) -> i32 {
                let dx = (self.x() - other.x()).abs();
                let dy = (self.y() - other.y()).abs();
                dx.max(dy)
            }

            pub fn distance(self, other: Self) -> f64 {
                let dx = (self.x() - other.x()) as f64;
                let dy = (self.y() - other.y()) as f64;
                (dx * dx + dy * dy).sqrt()
            }

            pub fn rounded_distance(self, other: Self) -> i32 {
                (0.5 + self.distance(other)) as i32
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.y.cmp(&other.y).then(self.x.cmp(&other.x))
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Add for $name {
            type Output = Self;
            fn add(self, other: Self) -> Self {
                $name::new(self.x() + other.x(), self.y() + other.y())
            }
        }

        impl Sub for $name {
            type Output = Self;
            fn sub(self, other: Self) -> Self {
                $name::new(self.x() - other.x(), self.y() - other.y())
            }
        }

        impl Add<(i32, i32)> for $name {
            type Output = Self;
            fn add(self, other: (i32, i32)) -> Self {
                $name::new(self.x() + other.0, self.y() + other.1)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                self.packed_repr().serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                u32::deserialize(deserializer).map($name::from_packed)
            }
        }
    };
}

position_type!(
    /// A position in pixels.
    Position
);

position_type!(
    /// A position in mini tiles (8x8 pixels).
    WalkPosition
);

position_type!(
    /// A position in tiles (32x32 pixels).
    TilePosition
);

impl WalkPosition {
    /// Pixel position of the center of this mini tile.
    pub fn center(self) -> Position {
        Position::new(
            self.x() * MINI_TILE_SIZE + MINI_TILE_SIZE / 2,
            self.y() * MINI_TILE_SIZE + MINI_TILE_SIZE / 2,
        )
    }
}

impl TilePosition {
    /// Pixel position of the center of this tile.
    pub fn center(self) -> Position {
        Position::new(
            self.x() * TILE_SIZE + TILE_SIZE / 2,
            self.y() * TILE_SIZE + TILE_SIZE / 2,
        )
    }
}

impl From<TilePosition> for WalkPosition {
    fn from(t: TilePosition) -> Self {
        WalkPosition::new(t.x() * MINI_TILES_PER_TILE, t.y() * MINI_TILES_PER_TILE)
    }
}

impl From<WalkPosition> for TilePosition {
    fn from(w: WalkPosition) -> Self {
        TilePosition::new(
            w.x().div_euclid(MINI_TILES_PER_TILE),
            w.y().div_euclid(MINI_TILES_PER_TILE),
        )
    }
}

impl From<TilePosition> for Position {
    fn from(t: TilePosition) -> Self {
        Position::new(t.x() * TILE_SIZE, t.y() * TILE_SIZE)
    }
}

impl From<WalkPosition> for Position {
    fn from(w: WalkPosition) -> Self {
        Position::new(w.x() * MINI_TILE_SIZE, w.y() * MINI_TILE_SIZE)
    }
}

impl From<Position> for WalkPosition {
    fn from(p: Position) -> Self {
        WalkPosition::new(p.x().div_euclid(MINI_TILE_SIZE), p.y().div_euclid(MINI_TILE_SIZE))
    }
}

impl From<Position> for TilePosition {
    fn from(p: Position) -> Self {
        TilePosition::new(p.x().div_euclid(TILE_SIZE), p.y().div_euclid(TILE_SIZE))
    }
}

/// Rounded pixel distance from `p` to the nearest pixel of the tile
/// rectangle starting at `top_left` and spanning `size` tiles. Zero inside.
pub fn distance_to_rectangle(p: Position, top_left: TilePosition, size: (i32, i32)) -> i32 {
    let left = top_left.x() * TILE_SIZE;
    let top = top_left.y() * TILE_SIZE;
    let right = (top_left.x() + size.0) * TILE_SIZE - 1;
    let bottom = (top_left.y() + size.1) * TILE_SIZE - 1;

    let nearest = Position::new(p.x().clamp(left, right), p.y().clamp(top, bottom));
    p.rounded_distance(nearest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_repr_keeps_negative_coordinates() {
        let w = WalkPosition::new(-3, 700);
        assert_eq!(WalkPosition::from_packed(w.packed_repr()), w);
    }

    #[test]
    fn ordering_is_raster_order() {
        let mut positions = vec![
            TilePosition::new(5, 1),
            TilePosition::new(0, 2),
            TilePosition::new(2, 1),
        ];
        positions.sort();
        assert_eq!(
            positions,
            vec![
                TilePosition::new(2, 1),
                TilePosition::new(5, 1),
                TilePosition::new(0, 2)
            ]
        );
    }

    #[test]
    fn resolutions_convert_consistently() {
        let t = TilePosition::new(3, 7);
        assert_eq!(WalkPosition::from(t), WalkPosition::new(12, 28));
        assert_eq!(TilePosition::from(WalkPosition::new(15, 31)), t);
        assert_eq!(t.center(), Position::new(112, 240));
        assert_eq!(WalkPosition::new(1, 2).center(), Position::new(12, 20));
    }

    #[test]
    fn rectangle_distance() {
        let top_left = TilePosition::new(2, 2);
        // Inside.
        assert_eq!(distance_to_rectangle(Position::new(70, 70), top_left, (2, 1)), 0);
        // Directly west.
        assert_eq!(distance_to_rectangle(Position::new(54, 70), top_left, (2, 1)), 10);
        // Diagonal south-east of the bottom-right pixel (127, 95).
        assert_eq!(distance_to_rectangle(Position::new(130, 99), top_left, (2, 1)), 5);
    }
}
