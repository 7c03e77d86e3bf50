//! Demo Errands
//!
//! Stand-in for the behavior layer that would normally hand villagers walk
//! targets and for players clicking on villagers. Runs ahead of the core
//! schedule in the binary.

use bevy_ecs::prelude::*;
use rand::Rng;

use village_events::TilePos;

use crate::components::{MemoryModule, MemoryStore, Player, Villager, WalkTarget};
use crate::systems::{InteractionKind, InteractionQueue};
use crate::{SimClock, SimRng};

use super::world::{GROUND_Y, PLAIN_RADIUS};

/// Ticks between errand rounds
pub const ERRAND_INTERVAL: u64 = 200;
/// Chance an idle villager is sent somewhere in a round
pub const ERRAND_CHANCE: f64 = 0.5;
/// Chance a player interacts with some villager in a round
pub const INTERACTION_CHANCE: f64 = 0.3;
pub const ERRAND_SPEED: f32 = 0.5;

const INTERACTIONS: [InteractionKind; 5] = [
    InteractionKind::SetHome,
    InteractionKind::GoHome,
    InteractionKind::SetHangout,
    InteractionKind::SetWorkplace,
    InteractionKind::LeaveHome,
];

/// System to hand idle villagers a destination and queue player interactions
pub fn assign_errands(
    clock: Res<SimClock>,
    mut rng: ResMut<SimRng>,
    mut queue: ResMut<InteractionQueue>,
    players: Query<&Player>,
    mut villagers: Query<(&Villager, &mut MemoryStore)>,
) {
    if clock.tick == 0 || clock.tick % ERRAND_INTERVAL != 0 {
        return;
    }
    let rng = &mut rng.0;
    let mut villager_ids: Vec<_> = villagers.iter().map(|(v, _)| v.id).collect();
    villager_ids.sort();

    let mut idle: Vec<_> = villagers
        .iter_mut()
        .filter(|(_, memory)| !memory.has(MemoryModule::WalkTarget) && !memory.has(MemoryModule::Staying))
        .collect();
    idle.sort_by_key(|(villager, _)| villager.id);

    let mut sent = 0;
    for (_, memory) in idle.iter_mut() {
        if !rng.gen_bool(ERRAND_CHANCE) {
            continue;
        }
        let reach = PLAIN_RADIUS - 4;
        let target = TilePos::new(rng.gen_range(-reach..=reach), GROUND_Y + 1, rng.gen_range(-reach..=reach));
        memory.remember_walk_target(WalkTarget::new(target, ERRAND_SPEED, 1));
        sent += 1;
    }

    let mut player_ids: Vec<_> = players.iter().map(|p| p.id).collect();
    player_ids.sort();
    let mut asked = 0;
    if !villager_ids.is_empty() {
        for player in player_ids {
            if !rng.gen_bool(INTERACTION_CHANCE) {
                continue;
            }
            let villager = villager_ids[rng.gen_range(0..villager_ids.len())];
            let kind = INTERACTIONS[rng.gen_range(0..INTERACTIONS.len())];
            queue.push(player, villager, kind);
            asked += 1;
        }
    }

    tracing::debug!("Tick {}: {} errands assigned, {} interactions queued", clock.tick, sent, asked);
}
