//! Event System
//!
//! Per-tick collection of residency and navigation events, and the JSONL
//! logger that persists them.

pub mod logger;

use bevy_ecs::prelude::*;

use village_events::{generate_event_id, AgentId, EventKind, EventRecord};

pub use logger::EventLogger;

/// Resource storing events generated this tick
#[derive(Resource, Debug, Default)]
pub struct TickEvents {
    pub events: Vec<EventRecord>,
    next_sequence: u64,
}

impl TickEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event with the next sequential id.
    pub fn emit(&mut self, tick: u64, agent_id: AgentId, kind: EventKind) {
        self.next_sequence += 1;
        self.events.push(EventRecord {
            event_id: generate_event_id(self.next_sequence),
            tick,
            agent_id,
            kind,
        });
    }

    pub fn drain(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
