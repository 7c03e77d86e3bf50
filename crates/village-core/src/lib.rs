//! Village Residency Simulation Library
//!
//! Where villagers live and how they get there: settlement discovery, bed
//! claiming and eviction, shared mood and reputation ledgers, and a
//! walk-target navigation task with a teleport fallback.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod components;
pub mod config;
pub mod events;
pub mod messages;
pub mod navigation;
pub mod poi;
pub mod residency;
pub mod setup;
pub mod systems;
pub mod terrain;
pub mod village;

pub use components::*;
pub use config::{Config, ConfigError};
pub use systems::build_schedule;

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);

/// World time in ticks
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimClock {
    pub tick: u64,
}

impl SimClock {
    pub fn advance(&mut self) {
        self.tick += 1;
    }
}
