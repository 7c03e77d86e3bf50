//! Actor Messaging
//!
//! Player-facing outcomes of interactions. Villagers only produce message
//! keys; rendering them into text is someone else's job.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use village_events::{AgentId, PlayerId};

/// Translation keys for interaction outcomes.
pub mod keys {
    pub const SET_WORKPLACE_SUCCESS: &str = "interaction.setworkplace.success";
    pub const SET_HANGOUT_SUCCESS: &str = "interaction.sethangout.success";
    pub const SET_HOME_SUCCESS: &str = "interaction.sethome.success";
    pub const SET_HOME_BED_FAIL: &str = "interaction.sethome.bedfail";
    pub const SET_HOME_FAIL: &str = "interaction.sethome.fail";
    pub const GO_HOME_SUCCESS: &str = "interaction.gohome.success";
    pub const GO_HOME_NO_HOME: &str = "interaction.gohome.fail.nohome";
}

/// Delivers an outcome from a villager to the player who asked.
pub trait ActorMessenger {
    fn notify(&mut self, speaker: AgentId, actor: PlayerId, key: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub speaker: AgentId,
    pub recipient: PlayerId,
    pub key: String,
}

/// Resource: messages waiting to be shown to players
#[derive(Resource, Debug, Clone, Default)]
pub struct Outbox {
    messages: Vec<ChatMessage>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last_for(&self, player: PlayerId) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.recipient == player)
    }

    pub fn drain(&mut self) -> Vec<ChatMessage> {
        std::mem::take(&mut self.messages)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl ActorMessenger for Outbox {
    fn notify(&mut self, speaker: AgentId, actor: PlayerId, key: &str) {
        self.messages.push(ChatMessage {
            speaker,
            recipient: actor,
            key: key.to_string(),
        });
    }
}
