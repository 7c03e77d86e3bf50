//! Shared data types for the village residency simulation.
//!
//! This crate contains pure data structures with no simulation logic:
//! coordinates, identities, the replicated form of per-agent residency
//! state, and the event records written to the event log.

pub mod coords;
pub mod event;
pub mod ids;
pub mod tracked;

pub use coords::{DimensionId, GlobalTile, TilePos, Vec3};
pub use event::{generate_event_id, EventKind, EventRecord, EvictionReason};
pub use ids::{AgentId, PlayerId};
pub use tracked::{TrackedResidency, UNSET_ID};
