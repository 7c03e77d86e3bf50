//! Planned paths.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use village_events::TilePos;

static NEXT_PATH_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a planned path. Two plans to the same tile are still different paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathId(pub u64);

/// Allocates a fresh path identity.
pub fn next_path_id() -> PathId {
    PathId(NEXT_PATH_ID.fetch_add(1, Ordering::Relaxed))
}

/// A sequence of tiles produced by a planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub id: PathId,
    pub nodes: Vec<TilePos>,
    /// The tile the planner was asked to reach
    pub target: TilePos,
    reaches_target: bool,
}

impl Path {
    pub fn new(nodes: Vec<TilePos>, target: TilePos, reaches_target: bool) -> Self {
        Self {
            id: next_path_id(),
            nodes,
            target,
            reaches_target,
        }
    }

    /// Whether the final node satisfies the planner's reach margin.
    pub fn reaches_target(&self) -> bool {
        self.reaches_target
    }

    pub fn end(&self) -> Option<TilePos> {
        self.nodes.last().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Identity comparison, not structural equality.
    pub fn same_as(&self, other: &Path) -> bool {
        self.id == other.id
    }
}
