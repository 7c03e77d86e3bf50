//! Setup Module
//!
//! Demo world construction, agent spawning, and resource initialization.

pub mod agents;
pub mod errands;
pub mod world;

pub use agents::*;
pub use errands::*;
pub use world::*;

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::{Config, ConfigError};
use crate::events::TickEvents;
use crate::messages::Outbox;
use crate::systems::{InteractionQueue, NavigationFaults};
use crate::village::ScannerHandle;
use crate::{SimClock, SimRng};

/// Build a world holding every resource the schedule reads, plus the demo
/// terrain and population described by `config`.
pub fn init_world(config: &Config) -> Result<World, ConfigError> {
    config.validate()?;
    let blacklist = config.navigation.blacklist()?;
    let mut rng = SmallRng::seed_from_u64(config.simulation.seed);

    let DemoWorld {
        grid,
        poi,
        villages,
        scanner,
    } = create_demo_world(config.residency.village_discovery_margin);

    let mut world = World::new();
    spawn_players(&mut world, config.simulation.players, &mut rng);
    spawn_villagers(
        &mut world,
        config.simulation.villagers,
        config.residency.building_scan_interval,
        &mut rng,
    );

    world.insert_resource(SimClock::default());
    world.insert_resource(config.clone());
    world.insert_resource(grid);
    world.insert_resource(poi);
    world.insert_resource(villages);
    world.insert_resource(ScannerHandle::new(scanner));
    world.insert_resource(blacklist);
    world.insert_resource(TickEvents::new());
    world.insert_resource(Outbox::new());
    world.insert_resource(NavigationFaults::new());
    world.insert_resource(InteractionQueue::new());
    world.insert_resource(SimRng(rng));
    Ok(world)
}
