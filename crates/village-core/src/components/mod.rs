//! ECS Components
//!
//! Entity components for villagers and players.

pub mod agent;
pub mod memory;

pub use agent::*;
pub use memory::*;
