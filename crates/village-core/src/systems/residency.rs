//! Residency Systems
//!
//! Drives every villager's residency controller once per tick, applies
//! queued player interactions, and ages villagers.

use bevy_ecs::prelude::*;

use village_events::{AgentId, PlayerId};

use crate::components::{Age, AgentRng, AgentSize, MemoryStore, Player, Position, Villager, VillagerBrain};
use crate::config::Config;
use crate::events::TickEvents;
use crate::messages::Outbox;
use crate::poi::PoiStorage;
use crate::residency::{Actor, Resident, ResidencyData, ResidencyWorld};
use crate::terrain::GridWorld;
use crate::village::{ScannerHandle, VillageManager};
use crate::SimClock;

/// What a player asked a villager to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    SetWorkplace,
    SetHangout,
    SetHome,
    GoHome,
    LeaveHome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    pub player: PlayerId,
    pub villager: AgentId,
    pub kind: InteractionKind,
}

/// Resource: interactions waiting to be applied this tick
#[derive(Resource, Debug, Default)]
pub struct InteractionQueue {
    pending: Vec<Interaction>,
}

impl InteractionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, player: PlayerId, villager: AgentId, kind: InteractionKind) {
        self.pending.push(Interaction { player, villager, kind });
    }

    pub fn drain(&mut self) -> Vec<Interaction> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

fn collect_actors(players: &Query<(&Player, &Position), Without<Villager>>) -> Vec<Actor> {
    players
        .iter()
        .map(|(player, position)| Actor::new(player.id, position.clone()))
        .collect()
}

type ResidentQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static Villager,
        &'static Age,
        &'static Position,
        &'static AgentSize,
        &'static mut ResidencyData,
        &'static mut MemoryStore,
        &'static mut VillagerBrain,
        &'static mut AgentRng,
    ),
>;

/// System to apply queued player interactions
#[allow(clippy::too_many_arguments)]
pub fn process_interactions(
    clock: Res<SimClock>,
    config: Res<Config>,
    grid: Res<GridWorld>,
    mut queue: ResMut<InteractionQueue>,
    mut villages: ResMut<VillageManager>,
    mut poi: ResMut<PoiStorage>,
    mut scanner: ResMut<ScannerHandle>,
    mut events: ResMut<TickEvents>,
    mut outbox: ResMut<Outbox>,
    players: Query<(&Player, &Position), Without<Villager>>,
    mut villagers: ResidentQuery,
) {
    if queue.is_empty() {
        return;
    }
    let actors = collect_actors(&players);
    let mut world = ResidencyWorld {
        villages: &mut *villages,
        index: &mut *poi,
        blocks: &*grid,
        scanner: &mut *scanner.0,
        events: &mut *events,
        messenger: &mut *outbox,
        config: &config.residency,
        players: &actors,
        tick: clock.tick,
    };

    for interaction in queue.drain() {
        let Some(actor) = actors.iter().find(|a| a.id == interaction.player) else {
            continue;
        };
        let Some((villager, age, position, size, mut data, mut memory, mut brain, mut rng)) = villagers
            .iter_mut()
            .find(|(villager, ..)| villager.id == interaction.villager)
        else {
            continue;
        };

        let mut resident = Resident {
            id: villager.id,
            age: age.0,
            position,
            size,
            data: &mut *data,
            memory: &mut *memory,
            brain: &mut *brain,
            rng: &mut rng.0,
        };
        match interaction.kind {
            InteractionKind::SetWorkplace => resident.set_workplace(&mut world, actor),
            InteractionKind::SetHangout => resident.set_hangout(&mut world, actor),
            InteractionKind::SetHome => {
                resident.set_home(&mut world, actor);
            }
            InteractionKind::GoHome => {
                resident.go_home(&mut world, actor);
            }
            InteractionKind::LeaveHome => resident.leave_home(&mut world),
        }
    }
}

/// System to run every villager's residency controller
#[allow(clippy::too_many_arguments)]
pub fn tick_residency(
    clock: Res<SimClock>,
    config: Res<Config>,
    grid: Res<GridWorld>,
    mut villages: ResMut<VillageManager>,
    mut poi: ResMut<PoiStorage>,
    mut scanner: ResMut<ScannerHandle>,
    mut events: ResMut<TickEvents>,
    mut outbox: ResMut<Outbox>,
    players: Query<(&Player, &Position), Without<Villager>>,
    mut villagers: ResidentQuery,
) {
    let actors = collect_actors(&players);
    let mut world = ResidencyWorld {
        villages: &mut *villages,
        index: &mut *poi,
        blocks: &*grid,
        scanner: &mut *scanner.0,
        events: &mut *events,
        messenger: &mut *outbox,
        config: &config.residency,
        players: &actors,
        tick: clock.tick,
    };

    for (villager, age, position, size, mut data, mut memory, mut brain, mut rng) in villagers.iter_mut() {
        let mut resident = Resident {
            id: villager.id,
            age: age.0,
            position,
            size,
            data: &mut *data,
            memory: &mut *memory,
            brain: &mut *brain,
            rng: &mut rng.0,
        };
        resident.tick(&mut world);
    }
}

/// System to advance every villager's age
pub fn advance_age(mut query: Query<&mut Age, With<Villager>>) {
    for mut age in query.iter_mut() {
        age.0 += 1;
    }
}
