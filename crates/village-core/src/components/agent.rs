//! Agent Components
//!
//! Components for villagers and players: identity, placement, age, and the
//! villager's social state.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use village_events::{AgentId, DimensionId, PlayerId, TilePos, Vec3};

use crate::terrain::Aabb;

/// Lowest mood a villager can reach
pub const MIN_MOOD: i32 = -15;
/// Highest mood a villager can reach
pub const MAX_MOOD: i32 = 15;

/// Component identifying an entity as a villager agent
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Villager {
    pub id: AgentId,
}

/// Component identifying an entity as a player
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
}

/// Component: where an entity is
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub dimension: DimensionId,
    pub pos: Vec3,
}

impl Position {
    pub fn new(dimension: DimensionId, pos: Vec3) -> Self {
        Self { dimension, pos }
    }

    /// Standing on the given tile in the overworld.
    pub fn at_tile(tile: TilePos) -> Self {
        Self::new(DimensionId::overworld(), tile.bottom_center())
    }

    pub fn tile(&self) -> TilePos {
        self.pos.tile()
    }
}

/// Component: ticks this entity has existed
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Age(pub u64);

/// Component: collision size of an agent
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSize {
    pub width: f64,
    pub height: f64,
}

impl Default for AgentSize {
    fn default() -> Self {
        Self {
            width: 0.6,
            height: 1.95,
        }
    }
}

impl AgentSize {
    /// Bounding box of an agent standing at `pos`.
    pub fn bounding_box(&self, pos: Vec3) -> Aabb {
        let half = self.width / 2.0;
        Aabb::new(
            Vec3::new(pos.x - half, pos.y, pos.z - half),
            Vec3::new(pos.x + half, pos.y + self.height, pos.z + half),
        )
    }
}

/// A villager's relationship with one player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMemory {
    pub hearts: i32,
}

impl PlayerMemory {
    pub fn mod_hearts(&mut self, delta: i32) {
        self.hearts += delta;
    }
}

/// Component: a villager's mood and relationships
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct VillagerBrain {
    mood: i32,
    player_memories: BTreeMap<PlayerId, PlayerMemory>,
}

impl VillagerBrain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mood(&self) -> i32 {
        self.mood
    }

    pub fn modify_mood(&mut self, delta: i32) {
        self.mood = (self.mood + delta).clamp(MIN_MOOD, MAX_MOOD);
    }

    /// The relationship record for a player, created on first contact.
    pub fn memories_for_player(&mut self, player: PlayerId) -> &mut PlayerMemory {
        self.player_memories.entry(player).or_default()
    }

    pub fn hearts_for(&self, player: PlayerId) -> i32 {
        self.player_memories.get(&player).map(|m| m.hearts).unwrap_or(0)
    }
}

/// Component: an agent's own random source
#[derive(Component, Debug, Clone)]
pub struct AgentRng(pub SmallRng);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_is_clamped() {
        let mut brain = VillagerBrain::new();
        brain.modify_mood(40);
        assert_eq!(brain.mood(), MAX_MOOD);
        brain.modify_mood(-100);
        assert_eq!(brain.mood(), MIN_MOOD);
    }

    #[test]
    fn test_hearts_accumulate_per_player() {
        let mut brain = VillagerBrain::new();
        let a = PlayerId::from_bytes([1; 16]);
        let b = PlayerId::from_bytes([2; 16]);
        brain.memories_for_player(a).mod_hearts(5);
        brain.memories_for_player(a).mod_hearts(-2);
        assert_eq!(brain.hearts_for(a), 3);
        assert_eq!(brain.hearts_for(b), 0);
    }

    #[test]
    fn test_bounding_box_is_centered() {
        let size = AgentSize::default();
        let bounds = size.bounding_box(Vec3::new(0.5, 64.0, 0.5));
        assert!((bounds.min.x - 0.2).abs() < 1e-9);
        assert!((bounds.max.y - 65.95).abs() < 1e-9);
    }
}
