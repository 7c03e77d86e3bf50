//! Teleport Assist
//!
//! Bounded search for a safe landing tile near a walk target the agent could
//! not reach on foot. Safety is judged against a configurable blacklist of
//! blocks and block tags the agent must never be dropped onto.

use bevy_ecs::prelude::*;
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use village_events::{TilePos, Vec3};

use crate::components::AgentSize;
use crate::terrain::{BlockView, Identifier, IdentifierError, NodeType};

use super::mover::Mover;

/// Largest horizontal offset tried around the target
const HORIZONTAL_SPREAD: i32 = 3;
/// Largest vertical offset tried around the target
const VERTICAL_SPREAD: i32 = 1;
/// Candidates closer than this (on both horizontal axes) are skipped
const MIN_TARGET_CLEARANCE: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("unknown block tag in pathfinding blacklist '{0}'")]
    UnknownBlockTag(Identifier),
}

/// One blacklist entry: an exact block id, or a `#`-prefixed tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlacklistEntry {
    Block(Identifier),
    Tag(Identifier),
}

impl FromStr for BlacklistEntry {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('#') {
            Some(tag) => Ok(BlacklistEntry::Tag(tag.parse()?)),
            None => Ok(BlacklistEntry::Block(s.parse()?)),
        }
    }
}

impl fmt::Display for BlacklistEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlacklistEntry::Block(id) => write!(f, "{}", id),
            BlacklistEntry::Tag(tag) => write!(f, "#{}", tag),
        }
    }
}

/// Resource: blocks an agent must not be teleported on top of
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct TeleportBlacklist {
    entries: Vec<BlacklistEntry>,
}

impl TeleportBlacklist {
    pub fn new(entries: Vec<BlacklistEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[BlacklistEntry] {
        &self.entries
    }

    /// Whether the block at `tile` is safe to stand on.
    ///
    /// Entries are checked in order; a tag that does not resolve is an error
    /// as soon as it is reached.
    pub fn is_area_safe(&self, blocks: &dyn BlockView, tile: TilePos) -> Result<bool, NavigationError> {
        let block = blocks.block_at(tile);
        for entry in &self.entries {
            match entry {
                BlacklistEntry::Block(id) => {
                    if *id == block.id {
                        return Ok(false);
                    }
                }
                BlacklistEntry::Tag(tag) => match blocks.tags().get(tag) {
                    Some(members) => {
                        if members.contains(&block.id) {
                            return Ok(false);
                        }
                    }
                    None => {
                        tracing::warn!("Unknown block tag in pathfinding blacklist '{}'", tag);
                        return Err(NavigationError::UnknownBlockTag(tag.clone()));
                    }
                },
            }
        }
        Ok(true)
    }
}

/// Whether an agent standing at `from` could be moved onto `candidate`.
pub fn can_teleport_to(
    blocks: &dyn BlockView,
    blacklist: &TeleportBlacklist,
    size: &AgentSize,
    from: Vec3,
    candidate: TilePos,
) -> Result<bool, NavigationError> {
    if blocks.classify_node(candidate) != NodeType::Walkable {
        return Ok(false);
    }
    if !blacklist.is_area_safe(blocks, candidate.down())? {
        return Ok(false);
    }
    let origin = from.tile();
    let bounds = size.bounding_box(from).offset(
        (candidate.x - origin.x) as f64,
        (candidate.y - origin.y) as f64,
        (candidate.z - origin.z) as f64,
    );
    Ok(blocks.is_space_empty(&bounds))
}

/// Tries up to `attempts` random tiles around `target`, moving the agent onto
/// the first safe one. Returns the landing point, or `None` if every attempt
/// was rejected.
pub fn try_teleport<R: Rng + ?Sized>(
    mover: &mut dyn Mover,
    blocks: &dyn BlockView,
    blacklist: &TeleportBlacklist,
    size: &AgentSize,
    target: TilePos,
    attempts: u32,
    rng: &mut R,
) -> Result<Option<Vec3>, NavigationError> {
    for _ in 0..attempts {
        let dx = rng.gen_range(-HORIZONTAL_SPREAD..=HORIZONTAL_SPREAD);
        let dy = rng.gen_range(-VERTICAL_SPREAD..=VERTICAL_SPREAD);
        let dz = rng.gen_range(-HORIZONTAL_SPREAD..=HORIZONTAL_SPREAD);
        if dx.abs() < MIN_TARGET_CLEARANCE && dz.abs() < MIN_TARGET_CLEARANCE {
            continue;
        }

        let candidate = target.offset(dx, dy, dz);
        if !can_teleport_to(blocks, blacklist, size, mover.position(), candidate)? {
            continue;
        }

        let landing = candidate.bottom_center();
        mover.teleport_to(landing);
        return Ok(Some(landing));
    }
    Ok(None)
}
