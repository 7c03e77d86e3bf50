//! Tracked Residency
//!
//! The replicated form of an agent's residency scalars. Inside the simulation
//! these are optional ids; on the wire an unset id is `-1`.

use serde::{Deserialize, Serialize};

use crate::coords::TilePos;

/// Sentinel for "no settlement" / "no building" on the wire.
pub const UNSET_ID: i32 = -1;

/// Per-agent residency scalars as they are synchronized and persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedResidency {
    #[serde(default = "unset")]
    pub village: i32,
    #[serde(default = "unset")]
    pub buildings: i32,
    #[serde(default, rename = "hangoutPos")]
    pub hangout_pos: TilePos,
}

fn unset() -> i32 {
    UNSET_ID
}

impl Default for TrackedResidency {
    fn default() -> Self {
        Self {
            village: UNSET_ID,
            buildings: UNSET_ID,
            hangout_pos: TilePos::ORIGIN,
        }
    }
}

impl TrackedResidency {
    /// Maps the wire sentinel to an optional id.
    pub fn id_from_wire(raw: i32) -> Option<i32> {
        if raw < 0 {
            None
        } else {
            Some(raw)
        }
    }

    pub fn id_to_wire(id: Option<i32>) -> i32 {
        id.unwrap_or(UNSET_ID)
    }
}
