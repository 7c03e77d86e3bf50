//! Terrain
//!
//! Block lookups, node classification, and path planning. The simulation only
//! consumes these through the [`BlockView`] and [`PathPlanner`] traits;
//! [`GridWorld`] is the in-process implementation used by the binary and tests.

pub mod grid;
pub mod path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use village_events::{TilePos, Vec3};

pub use grid::GridWorld;
pub use path::{next_path_id, Path, PathId};

/// Namespace assumed when an identifier omits one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Namespaced resource identifier, e.g. `minecraft:red_bed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    pub namespace: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,
    #[error("invalid character in identifier '{0}'")]
    InvalidCharacter(String),
}

impl Identifier {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    pub fn minecraft(path: impl Into<String>) -> Self {
        Self::new(DEFAULT_NAMESPACE, path)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, path) = match s.split_once(':') {
            Some((ns, path)) => (ns, path),
            None => (DEFAULT_NAMESPACE, s),
        };
        if namespace.is_empty() || path.is_empty() {
            return Err(IdentifierError::Empty);
        }
        let valid_ns = namespace
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_-.".contains(c));
        let valid_path = path
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_-./".contains(c));
        if !valid_ns || !valid_path {
            return Err(IdentifierError::InvalidCharacter(s.to_string()));
        }
        Ok(Self::new(namespace, path))
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

/// Closed classification of what a block physically is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Air,
    Solid,
    /// Full-height obstacle that cannot be stepped over
    Fence,
    Bed,
    Water,
    Lava,
    /// Solid ground that hurts to stand on
    Hazard,
    /// Passable decoration (flowers, grass, grave markers)
    Plant,
}

impl BlockKind {
    /// Whether an agent can occupy the block's space.
    pub fn is_passable(self) -> bool {
        matches!(self, BlockKind::Air | BlockKind::Plant)
    }

    /// Whether an agent can stand on top of the block.
    pub fn supports_standing(self) -> bool {
        matches!(self, BlockKind::Solid | BlockKind::Bed | BlockKind::Hazard)
    }
}

/// A placed block: its registry id plus physical kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockState {
    pub id: Identifier,
    pub kind: BlockKind,
}

impl BlockState {
    pub fn new(id: Identifier, kind: BlockKind) -> Self {
        Self { id, kind }
    }

    pub fn air() -> Self {
        Self::new(Identifier::minecraft("air"), BlockKind::Air)
    }

    pub fn is_bed(&self) -> bool {
        matches!(self.kind, BlockKind::Bed)
    }
}

/// Block tag groups, e.g. `minecraft:leaves` → {oak_leaves, birch_leaves}.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagRegistry {
    tags: HashMap<Identifier, BTreeSet<Identifier>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: Identifier, blocks: impl IntoIterator<Item = Identifier>) {
        self.tags.entry(tag).or_default().extend(blocks);
    }

    /// Members of a tag, or `None` if the tag is not registered.
    pub fn get(&self, tag: &Identifier) -> Option<&BTreeSet<Identifier>> {
        self.tags.get(tag)
    }
}

/// Path-planner classification of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Free space with solid footing
    Walkable,
    /// Free space without footing
    Open,
    Blocked,
    Fence,
    Water,
    Lava,
    /// Free space above a hazard block
    DangerOther,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn offset(&self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.min.add(dx, dy, dz), self.max.add(dx, dy, dz))
    }

    pub fn expand(&self, amount: f64) -> Self {
        Self::new(
            self.min.add(-amount, -amount, -amount),
            self.max.add(amount, amount, amount),
        )
    }

    pub fn contains_tile(&self, tile: TilePos) -> bool {
        let c = tile.center();
        c.x >= self.min.x
            && c.x <= self.max.x
            && c.y >= self.min.y
            && c.y <= self.max.y
            && c.z >= self.min.z
            && c.z <= self.max.z
    }

    /// Every tile the box overlaps.
    pub fn tiles(&self) -> impl Iterator<Item = TilePos> {
        let lo = self.min.tile();
        // Shrink slightly so a box ending exactly on a tile boundary does not spill over.
        let hi = self.max.add(-1e-7, -1e-7, -1e-7).tile();
        (lo.x..=hi.x).flat_map(move |x| {
            (lo.y..=hi.y).flat_map(move |y| (lo.z..=hi.z).map(move |z| TilePos::new(x, y, z)))
        })
    }
}

/// Read access to placed blocks.
pub trait BlockView {
    fn block_at(&self, tile: TilePos) -> &BlockState;

    fn tags(&self) -> &TagRegistry;

    fn classify_node(&self, tile: TilePos) -> NodeType;

    /// Whether no non-passable block intersects the box.
    fn is_space_empty(&self, bounds: &Aabb) -> bool {
        bounds.tiles().all(|tile| self.block_at(tile).kind.is_passable())
    }
}

/// Path planning over the terrain.
pub trait PathPlanner {
    /// Plans from `from` toward `target`. `margin` is how close (Manhattan) the
    /// final node must be for the path to count as reaching the target.
    fn find_path_to(&self, from: TilePos, target: TilePos, margin: i32) -> Option<Path>;

    /// Picks a standable point roughly toward `toward`, within the given
    /// horizontal/vertical ranges of it and a cone of `max_angle` radians.
    fn find_nearby_target<R: Rng + ?Sized>(
        &self,
        from: Vec3,
        toward: Vec3,
        horizontal_range: i32,
        vertical_range: i32,
        max_angle: f64,
        rng: &mut R,
    ) -> Option<Vec3>;
}
