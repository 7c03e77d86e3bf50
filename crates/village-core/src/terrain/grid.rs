//! Grid World
//!
//! Sparse block grid with an A* planner. Unset tiles are air.

use bevy_ecs::prelude::*;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use village_events::{TilePos, Vec3};

use super::{BlockKind, BlockState, BlockView, Identifier, NodeType, Path, PathPlanner, TagRegistry};

/// Default cap on explored nodes per plan
pub const DEFAULT_MAX_VISITED_NODES: usize = 4096;
/// Default maximum Manhattan distance the planner will attempt
pub const DEFAULT_FOLLOW_RANGE: i32 = 96;

/// Resource: the block world the agents live in
#[derive(Resource, Debug, Clone)]
pub struct GridWorld {
    blocks: HashMap<TilePos, BlockState>,
    air: BlockState,
    tags: TagRegistry,
    pub max_visited_nodes: usize,
    pub follow_range: i32,
}

impl Default for GridWorld {
    fn default() -> Self {
        Self {
            blocks: HashMap::new(),
            air: BlockState::air(),
            tags: TagRegistry::new(),
            max_visited_nodes: DEFAULT_MAX_VISITED_NODES,
            follow_range: DEFAULT_FOLLOW_RANGE,
        }
    }
}

impl GridWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// A flat floor of `block` at height `ground_y` over the inclusive xz range.
    pub fn flat(min: (i32, i32), max: (i32, i32), ground_y: i32, block: BlockState) -> Self {
        let mut world = Self::new();
        for x in min.0..=max.0 {
            for z in min.1..=max.1 {
                world.set_block(TilePos::new(x, ground_y, z), block.clone());
            }
        }
        world
    }

    pub fn set_block(&mut self, tile: TilePos, block: BlockState) {
        if matches!(block.kind, BlockKind::Air) {
            self.blocks.remove(&tile);
        } else {
            self.blocks.insert(tile, block);
        }
    }

    pub fn clear_block(&mut self, tile: TilePos) {
        self.blocks.remove(&tile);
    }

    pub fn tags_mut(&mut self) -> &mut TagRegistry {
        &mut self.tags
    }

    pub fn register_tag(&mut self, tag: Identifier, blocks: impl IntoIterator<Item = Identifier>) {
        self.tags.insert(tag, blocks);
    }

    /// A tile an agent can occupy: walkable footing and room for its head.
    pub fn is_standable(&self, tile: TilePos) -> bool {
        self.classify_node(tile) == NodeType::Walkable && self.block_at(tile.up()).kind.is_passable()
    }

    fn neighbors(&self, tile: TilePos) -> Vec<TilePos> {
        const DIRECTIONS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
        let mut neighbors = Vec::with_capacity(4);
        for (dx, dz) in DIRECTIONS {
            for dy in [0, 1, -1] {
                let candidate = tile.offset(dx, dy, dz);
                if self.is_standable(candidate) {
                    neighbors.push(candidate);
                    break;
                }
            }
        }
        neighbors
    }
}

impl BlockView for GridWorld {
    fn block_at(&self, tile: TilePos) -> &BlockState {
        self.blocks.get(&tile).unwrap_or(&self.air)
    }

    fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    fn classify_node(&self, tile: TilePos) -> NodeType {
        match self.block_at(tile).kind {
            BlockKind::Solid | BlockKind::Bed | BlockKind::Hazard => NodeType::Blocked,
            BlockKind::Fence => NodeType::Fence,
            BlockKind::Water => NodeType::Water,
            BlockKind::Lava => NodeType::Lava,
            BlockKind::Air | BlockKind::Plant => match self.block_at(tile.down()).kind {
                BlockKind::Solid | BlockKind::Bed => NodeType::Walkable,
                BlockKind::Hazard => NodeType::DangerOther,
                BlockKind::Fence => NodeType::Blocked,
                BlockKind::Water => NodeType::Water,
                BlockKind::Lava => NodeType::Lava,
                BlockKind::Air | BlockKind::Plant => NodeType::Open,
            },
        }
    }
}

/// Node for A* pathfinding
#[derive(Clone, Copy, Eq, PartialEq)]
struct PathNode {
    tile: TilePos,
    cost: u32,
    estimated_total: u32,
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimated_total
            .cmp(&self.estimated_total)
            .then_with(|| other.cost.cmp(&self.cost))
            .then_with(|| self.tile.cmp(&other.tile))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn reconstruct(came_from: &HashMap<TilePos, TilePos>, end: TilePos) -> Vec<TilePos> {
    let mut nodes = vec![end];
    let mut current = end;
    while let Some(&prev) = came_from.get(&current) {
        nodes.push(prev);
        current = prev;
    }
    nodes.reverse();
    nodes
}

impl PathPlanner for GridWorld {
    fn find_path_to(&self, from: TilePos, target: TilePos, margin: i32) -> Option<Path> {
        if from.manhattan_distance(&target) > self.follow_range || !self.is_standable(from) {
            return None;
        }

        let h = |tile: TilePos| tile.manhattan_distance(&target) as u32;

        let mut open_set = BinaryHeap::new();
        let mut came_from: HashMap<TilePos, TilePos> = HashMap::new();
        let mut g_score: HashMap<TilePos, u32> = HashMap::new();

        g_score.insert(from, 0);
        open_set.push(PathNode {
            tile: from,
            cost: 0,
            estimated_total: h(from),
        });

        // Closest explored node, for partial paths
        let mut best = (h(from), from);
        let mut visited = 0;

        while let Some(current) = open_set.pop() {
            visited += 1;
            if visited > self.max_visited_nodes {
                break;
            }

            let distance = current.tile.manhattan_distance(&target);
            if distance <= margin {
                return Some(Path::new(reconstruct(&came_from, current.tile), target, true));
            }
            if (distance as u32) < best.0 {
                best = (distance as u32, current.tile);
            }

            for neighbor in self.neighbors(current.tile) {
                let tentative_g = g_score
                    .get(&current.tile)
                    .copied()
                    .unwrap_or(u32::MAX)
                    .saturating_add(1);

                if tentative_g < g_score.get(&neighbor).copied().unwrap_or(u32::MAX) {
                    came_from.insert(neighbor, current.tile);
                    g_score.insert(neighbor, tentative_g);
                    open_set.push(PathNode {
                        tile: neighbor,
                        cost: tentative_g,
                        estimated_total: tentative_g + h(neighbor),
                    });
                }
            }
        }

        Some(Path::new(reconstruct(&came_from, best.1), target, false))
    }

    fn find_nearby_target<R: Rng + ?Sized>(
        &self,
        from: Vec3,
        toward: Vec3,
        horizontal_range: i32,
        vertical_range: i32,
        max_angle: f64,
        rng: &mut R,
    ) -> Option<Vec3> {
        const ATTEMPTS: usize = 10;

        let heading = (toward.z - from.z).atan2(toward.x - from.x);
        let half_angle = max_angle / 2.0;

        for _ in 0..ATTEMPTS {
            let angle = heading + rng.gen_range(-half_angle..=half_angle);
            let distance = rng.gen_range(0..=horizontal_range.max(0)) as f64;
            let dy = rng.gen_range(-vertical_range.max(0)..=vertical_range.max(0)) as f64;
            let candidate = from.add(angle.cos() * distance, dy, angle.sin() * distance).tile();
            if self.is_standable(candidate) {
                return Some(candidate.bottom_center());
            }
        }
        None
    }
}
