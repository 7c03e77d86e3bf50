//! ECS Systems
//!
//! Residency, navigation, and bookkeeping systems, run in a fixed order.

pub mod navigation;
pub mod residency;

pub use navigation::{advance_path_followers, run_navigation_tasks, NavigationFaults};
pub use residency::{advance_age, process_interactions, tick_residency, Interaction, InteractionKind, InteractionQueue};

use bevy_ecs::prelude::*;

/// The per-tick schedule: interactions, residency, navigation, movement, ageing.
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            process_interactions,
            tick_residency,
            run_navigation_tasks,
            advance_path_followers,
            advance_age,
        )
            .chain(),
    );
    schedule
}
