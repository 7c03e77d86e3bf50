//! Memory Components
//!
//! Per-agent store of named facts. Each fact is either present with a value or
//! absent; scheduled behaviors gate on presence/absence of specific facts.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use village_events::{GlobalTile, TilePos};

use crate::terrain::Path;

/// Names of the facts an agent can remember.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryModule {
    Home,
    JobSite,
    WalkTarget,
    Path,
    CantReachWalkTargetSince,
    Staying,
}

/// A movement goal: where to go, how fast, and how close counts as arrived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkTarget {
    pub look_target: TilePos,
    pub speed: f32,
    /// Manhattan distance within which the target counts as reached
    pub completion_range: i32,
}

impl WalkTarget {
    pub fn new(look_target: TilePos, speed: f32, completion_range: i32) -> Self {
        Self {
            look_target,
            speed,
            completion_range,
        }
    }

    pub fn is_reached_from(&self, tile: TilePos) -> bool {
        self.look_target.manhattan_distance(&tile) <= self.completion_range
    }
}

/// Component: an agent's remembered facts
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    home: Option<GlobalTile>,
    job_site: Option<GlobalTile>,
    walk_target: Option<WalkTarget>,
    path: Option<Path>,
    cant_reach_walk_target_since: Option<u64>,
    /// Where the agent was told to stay put
    staying: Option<TilePos>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the named fact is present.
    pub fn has(&self, module: MemoryModule) -> bool {
        match module {
            MemoryModule::Home => self.home.is_some(),
            MemoryModule::JobSite => self.job_site.is_some(),
            MemoryModule::WalkTarget => self.walk_target.is_some(),
            MemoryModule::Path => self.path.is_some(),
            MemoryModule::CantReachWalkTargetSince => self.cant_reach_walk_target_since.is_some(),
            MemoryModule::Staying => self.staying.is_some(),
        }
    }

    /// Clears the named fact.
    pub fn forget(&mut self, module: MemoryModule) {
        match module {
            MemoryModule::Home => self.home = None,
            MemoryModule::JobSite => self.job_site = None,
            MemoryModule::WalkTarget => self.walk_target = None,
            MemoryModule::Path => self.path = None,
            MemoryModule::CantReachWalkTargetSince => self.cant_reach_walk_target_since = None,
            MemoryModule::Staying => self.staying = None,
        }
    }

    pub fn home(&self) -> Option<&GlobalTile> {
        self.home.as_ref()
    }

    pub fn remember_home(&mut self, home: GlobalTile) {
        self.home = Some(home);
    }

    pub fn job_site(&self) -> Option<&GlobalTile> {
        self.job_site.as_ref()
    }

    pub fn remember_job_site(&mut self, site: GlobalTile) {
        self.job_site = Some(site);
    }

    pub fn walk_target(&self) -> Option<&WalkTarget> {
        self.walk_target.as_ref()
    }

    pub fn remember_walk_target(&mut self, target: WalkTarget) {
        self.walk_target = Some(target);
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Mirrors the navigator's plan; `None` forgets it.
    pub fn set_path(&mut self, path: Option<Path>) {
        self.path = path;
    }

    pub fn cant_reach_walk_target_since(&self) -> Option<u64> {
        self.cant_reach_walk_target_since
    }

    pub fn remember_cant_reach_since(&mut self, time: u64) {
        self.cant_reach_walk_target_since = Some(time);
    }

    pub fn staying(&self) -> Option<TilePos> {
        self.staying
    }

    pub fn remember_staying(&mut self, spot: TilePos) {
        self.staying = Some(spot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forget_clears_only_named_fact() {
        let mut memory = MemoryStore::new();
        memory.remember_walk_target(WalkTarget::new(TilePos::new(4, 64, 4), 0.6, 1));
        memory.remember_cant_reach_since(20);

        memory.forget(MemoryModule::WalkTarget);
        assert!(!memory.has(MemoryModule::WalkTarget));
        assert!(memory.has(MemoryModule::CantReachWalkTargetSince));
    }

    #[test]
    fn test_walk_target_reached_by_manhattan() {
        let target = WalkTarget::new(TilePos::new(0, 64, 0), 0.6, 2);
        assert!(target.is_reached_from(TilePos::new(1, 64, 1)));
        assert!(!target.is_reached_from(TilePos::new(2, 64, 1)));
    }
}
