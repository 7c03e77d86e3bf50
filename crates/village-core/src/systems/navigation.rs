//! Navigation Systems
//!
//! Steps each villager's navigation task, then moves path followers.

use bevy_ecs::prelude::*;

use village_events::AgentId;

use crate::components::{AgentRng, AgentSize, MemoryStore, Position, Villager};
use crate::config::Config;
use crate::events::TickEvents;
use crate::navigation::{MoverHandle, NavigationContext, NavigationError, NavigationTask, Navigator, PathFollower, TeleportBlacklist};
use crate::terrain::GridWorld;
use crate::SimClock;

/// Resource: fatal navigation errors raised this run
#[derive(Resource, Debug, Default)]
pub struct NavigationFaults {
    faults: Vec<(AgentId, NavigationError)>,
}

impl NavigationFaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, agent: AgentId, error: NavigationError) {
        self.faults.push((agent, error));
    }

    pub fn first(&self) -> Option<&(AgentId, NavigationError)> {
        self.faults.first()
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }
}

/// System to step every villager's navigation task
#[allow(clippy::too_many_arguments)]
pub fn run_navigation_tasks(
    clock: Res<SimClock>,
    config: Res<Config>,
    grid: Res<GridWorld>,
    blacklist: Res<TeleportBlacklist>,
    mut events: ResMut<TickEvents>,
    mut faults: ResMut<NavigationFaults>,
    mut query: Query<(
        &Villager,
        &AgentSize,
        &mut Position,
        &mut MemoryStore,
        &mut PathFollower,
        &mut NavigationTask,
        &mut AgentRng,
    )>,
) {
    let ctx = NavigationContext {
        world: &*grid,
        blacklist: &*blacklist,
        config: &config.navigation,
        time: clock.tick,
    };

    for (villager, size, mut position, mut memory, mut follower, mut task, mut rng) in query.iter_mut() {
        let mut mover = MoverHandle::new(&mut *follower, &mut *position);
        let mut agent = Navigator {
            id: villager.id,
            size,
            memory: &mut *memory,
            mover: &mut mover,
            rng: &mut rng.0,
            events: &mut *events,
        };
        if let Err(error) = task.step(&ctx, &mut agent) {
            tracing::warn!("Navigation for villager {} failed: {}", villager.id, error);
            faults.record(villager.id, error);
        }
    }
}

/// System to move every path follower along its path
pub fn advance_path_followers(mut query: Query<(&mut PathFollower, &mut Position)>) {
    for (mut follower, mut position) in query.iter_mut() {
        MoverHandle::new(&mut *follower, &mut *position).advance();
    }
}
