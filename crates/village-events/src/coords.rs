//! World Coordinates
//!
//! Integer tile positions, continuous positions, and dimension-qualified tiles.
//!
//! # Example
//!
//! ```
//! use village_events::TilePos;
//!
//! let a = TilePos::new(0, 64, 0);
//! let b = TilePos::new(3, 64, -4);
//! assert_eq!(a.manhattan_distance(&b), 7);
//! assert_eq!(a.squared_distance(&b), 25);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer block coordinate in the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TilePos {
    /// The world origin, used as the default for unset tile facts.
    pub const ORIGIN: TilePos = TilePos { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The tile directly beneath this one.
    pub fn down(&self) -> Self {
        self.offset(0, -1, 0)
    }

    pub fn up(&self) -> Self {
        self.offset(0, 1, 0)
    }

    pub fn manhattan_distance(&self, other: &TilePos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs() + (self.z - other.z).abs()
    }

    pub fn squared_distance(&self, other: &TilePos) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dy * dy + dz * dz
    }

    /// Horizontal Chebyshev distance, ignoring height.
    pub fn horizontal_chebyshev(&self, other: &TilePos) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// Center of the tile's floor, the point an agent stands on.
    pub fn bottom_center(&self) -> Vec3 {
        Vec3::new(self.x as f64 + 0.5, self.y as f64, self.z as f64 + 0.5)
    }

    /// Center of the tile volume.
    pub fn center(&self) -> Vec3 {
        Vec3::new(self.x as f64 + 0.5, self.y as f64 + 0.5, self.z as f64 + 0.5)
    }

    /// Whether this tile's center lies strictly within `distance` of `pos`.
    pub fn is_within_distance(&self, pos: Vec3, distance: f64) -> bool {
        self.center().squared_distance(&pos) < distance * distance
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Continuous world position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The tile containing this position.
    pub fn tile(&self) -> TilePos {
        TilePos::new(self.x.floor() as i32, self.y.floor() as i32, self.z.floor() as i32)
    }

    pub fn squared_distance(&self, other: &Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance(&self, other: &Vec3) -> f64 {
        self.squared_distance(other).sqrt()
    }

    pub fn add(&self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

/// Identifier of a world dimension (e.g. `minecraft:overworld`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DimensionId(pub String);

impl DimensionId {
    pub fn overworld() -> Self {
        Self("minecraft:overworld".to_string())
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Default for DimensionId {
    fn default() -> Self {
        Self::overworld()
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tile qualified by the dimension it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalTile {
    pub dimension: DimensionId,
    pub pos: TilePos,
}

impl GlobalTile {
    pub fn new(dimension: DimensionId, pos: TilePos) -> Self {
        Self { dimension, pos }
    }
}
