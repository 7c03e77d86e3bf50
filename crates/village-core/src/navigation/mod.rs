//! Navigation
//!
//! The walk-target task, the mover it drives, and the teleport fallback.

pub mod mover;
pub mod task;
pub mod teleport;

pub use mover::{Mover, MoverHandle, PathFollower};
pub use task::{NavigationContext, NavigationTask, Navigator, TaskPhase, TaskSignal};
pub use teleport::{can_teleport_to, try_teleport, BlacklistEntry, NavigationError, TeleportBlacklist};
