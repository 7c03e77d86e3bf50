//! Event Types
//!
//! Structured records of residency and navigation transitions, one per line
//! in the simulation's JSONL event log.

use serde::{Deserialize, Serialize};

use crate::coords::{TilePos, Vec3};
use crate::ids::{AgentId, PlayerId};

/// Why an agent lost its building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionReason {
    /// The agent's home fact disappeared
    LostBed,
    /// The settlement no longer lists the agent in that building
    NotResident,
    /// The settlement itself no longer exists
    VillageGone,
}

/// What happened to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Agent adopted the nearest settlement
    VillageAdopted { village: i32 },
    /// Agent claimed a bed and joined a building
    TookResidence {
        village: i32,
        building: i32,
        bed: TilePos,
    },
    /// Agent was removed from its building
    Evicted {
        village: i32,
        building: Option<i32>,
        reason: EvictionReason,
    },
    /// Pending settlement mood was applied to the agent
    MoodApplied { delta: i32, mood: i32 },
    /// Pending settlement hearts were applied to the agent's view of a player
    HeartsApplied { player: PlayerId, delta: i32 },
    /// Navigation gave up on a walk target this cycle
    WalkTargetAbandoned { target: TilePos },
    /// Navigation relocated the agent near its target
    Teleported { from: Vec3, to: Vec3, target: TilePos },
}

impl EventKind {
    /// Short name used in summaries.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::VillageAdopted { .. } => "village_adopted",
            EventKind::TookResidence { .. } => "took_residence",
            EventKind::Evicted { .. } => "evicted",
            EventKind::MoodApplied { .. } => "mood_applied",
            EventKind::HeartsApplied { .. } => "hearts_applied",
            EventKind::WalkTargetAbandoned { .. } => "walk_target_abandoned",
            EventKind::Teleported { .. } => "teleported",
        }
    }
}

/// A single logged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: String,
    pub tick: u64,
    pub agent_id: AgentId,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl EventRecord {
    /// Serializes the event to a single JSON line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes an event from a JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Generates an event ID with the given sequence number.
pub fn generate_event_id(sequence: u64) -> String {
    format!("evt_{:08}", sequence)
}
