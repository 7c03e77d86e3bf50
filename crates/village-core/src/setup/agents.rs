//! Agent Spawning
//!
//! Spawns players and villagers with ids and per-agent random streams drawn
//! from the world seed, so the same seed always yields the same population.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use village_events::{AgentId, PlayerId, TilePos};

use crate::components::{Age, AgentRng, AgentSize, MemoryStore, Player, Position, Villager, VillagerBrain};
use crate::navigation::{NavigationTask, PathFollower};
use crate::residency::ResidencyData;

use super::world::GROUND_Y;

/// Where villagers wander in from, relative to the origin
const VILLAGER_SPAWNS: &[(i32, i32)] = &[
    (10, 10),
    (-12, 8),
    (14, -10),
    (-8, -14),
    (24, 12),
    (52, 36),
    (-30, 30),
    (40, -6),
];

/// Where players stand
const PLAYER_SPAWNS: &[(i32, i32)] = &[(3, 10), (22, 10), (58, 48)];

fn surface(x: i32, z: i32) -> TilePos {
    TilePos::new(x, GROUND_Y + 1, z)
}

/// Spawn `count` players near the settlements
pub fn spawn_players(world: &mut World, count: usize, rng: &mut SmallRng) -> Vec<Entity> {
    (0..count)
        .map(|i| {
            let (x, z) = PLAYER_SPAWNS[i % PLAYER_SPAWNS.len()];
            let id = PlayerId::from_bytes(rng.gen());
            world
                .spawn((Player { id }, Position::at_tile(surface(x, z + (i / PLAYER_SPAWNS.len()) as i32))))
                .id()
        })
        .collect()
}

/// Spawn `count` villagers with staggered ages so their scans spread across ticks
pub fn spawn_villagers(world: &mut World, count: usize, scan_interval: u64, rng: &mut SmallRng) -> Vec<Entity> {
    (0..count)
        .map(|i| {
            let (x, z) = VILLAGER_SPAWNS[i % VILLAGER_SPAWNS.len()];
            let ring = (i / VILLAGER_SPAWNS.len()) as i32;
            let tile = surface(x + ring, z - ring);
            let id = AgentId::from_bytes(rng.gen());
            let age = Age(rng.gen_range(0..scan_interval.max(1)));
            let agent_rng = AgentRng(SmallRng::seed_from_u64(rng.gen()));

            world
                .spawn((
                    Villager { id },
                    Position::at_tile(tile),
                    age,
                    AgentSize::default(),
                    ResidencyData::default(),
                    MemoryStore::new(),
                    VillagerBrain::new(),
                    agent_rng,
                    PathFollower::new(),
                    NavigationTask::new(),
                ))
                .id()
        })
        .collect()
}

/// Population counts for the startup banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnSummary {
    pub players: usize,
    pub villagers: usize,
}

pub fn get_spawn_summary(world: &mut World) -> SpawnSummary {
    let players = world.query::<&Player>().iter(world).count();
    let villagers = world.query::<&Villager>().iter(world).count();
    SpawnSummary { players, villagers }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_counts() {
        let mut world = World::new();
        let mut rng = SmallRng::seed_from_u64(1);
        spawn_players(&mut world, 2, &mut rng);
        let villagers = spawn_villagers(&mut world, 11, 600, &mut rng);

        assert_eq!(villagers.len(), 11);
        assert_eq!(get_spawn_summary(&mut world), SpawnSummary { players: 2, villagers: 11 });
    }

    #[test]
    fn test_ages_fall_inside_first_scan_window() {
        let mut world = World::new();
        let mut rng = SmallRng::seed_from_u64(2);
        for entity in spawn_villagers(&mut world, 8, 600, &mut rng) {
            assert!(world.get::<Age>(entity).unwrap().0 < 600);
            assert!(world.get::<ResidencyData>(entity).unwrap().village.is_none());
        }
    }

    #[test]
    fn test_same_seed_same_ids() {
        let ids = |seed: u64| {
            let mut world = World::new();
            let mut rng = SmallRng::seed_from_u64(seed);
            spawn_villagers(&mut world, 4, 600, &mut rng)
                .into_iter()
                .map(|e| world.get::<Villager>(e).unwrap().id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(7), ids(7));
        assert_ne!(ids(7), ids(8));
    }
}
