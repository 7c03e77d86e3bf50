//! Settlement Registry
//!
//! Villages, their buildings and residents, and the shared social ledgers that
//! residents reconcile into their own state. The registry is a world resource;
//! any mutable access marks it dirty for the next save.

pub mod building;
pub mod scanner;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;
use thiserror::Error;

use village_events::{AgentId, PlayerId, TilePos};

use crate::poi::WorldIndex;

pub use building::Building;
pub use scanner::{Blueprint, BlueprintScanner, BuildingScanner, ScannerHandle};

/// Smallest border a settlement is given, even with one building
pub const MIN_VILLAGE_SIZE: i32 = 16;

/// A settlement: a cluster of buildings with shared ledgers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Village {
    id: i32,
    pub name: String,
    center: TilePos,
    size: i32,
    buildings: BTreeMap<i32, Building>,
    /// player → (villager → hearts last reported by that villager)
    reputation: BTreeMap<PlayerId, BTreeMap<AgentId, i32>>,
    pending_mood: VecDeque<i32>,
    pending_hearts: BTreeMap<PlayerId, VecDeque<i32>>,
}

impl Village {
    pub fn new(id: i32, name: impl Into<String>, center: TilePos) -> Self {
        Self {
            id,
            name: name.into(),
            center,
            size: MIN_VILLAGE_SIZE,
            buildings: BTreeMap::new(),
            reputation: BTreeMap::new(),
            pending_mood: VecDeque::new(),
            pending_hearts: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn center(&self) -> TilePos {
        self.center
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    /// Whether `pos` lies within the border extended by `margin`.
    pub fn is_within_border(&self, pos: TilePos, margin: i32) -> bool {
        let reach = (self.size + margin) as i64;
        self.center.squared_distance(&pos) <= reach * reach
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    pub fn building(&self, id: i32) -> Option<&Building> {
        self.buildings.get(&id)
    }

    pub fn building_mut(&mut self, id: i32) -> Option<&mut Building> {
        self.buildings.get_mut(&id)
    }

    /// The first building whose bounds contain `pos`.
    pub fn building_at(&self, pos: TilePos) -> Option<&Building> {
        self.buildings.values().find(|b| b.contains(pos))
    }

    pub(crate) fn insert_building(&mut self, building: Building) {
        self.buildings.insert(building.id(), building);
        self.recalculate_bounds();
    }

    pub fn remove_building(&mut self, id: i32) -> Option<Building> {
        let removed = self.buildings.remove(&id);
        self.recalculate_bounds();
        removed
    }

    fn recalculate_bounds(&mut self) {
        if self.buildings.is_empty() {
            return;
        }
        let count = self.buildings.len() as i64;
        let (sx, sy, sz) = self.buildings.values().fold((0i64, 0i64, 0i64), |acc, b| {
            let c = b.center();
            (acc.0 + c.x as i64, acc.1 + c.y as i64, acc.2 + c.z as i64)
        });
        self.center = TilePos::new((sx / count) as i32, (sy / count) as i32, (sz / count) as i32);
        let farthest = self
            .buildings
            .values()
            .map(|b| (b.center().squared_distance(&self.center) as f64).sqrt().ceil() as i32)
            .max()
            .unwrap_or(0);
        self.size = farthest.max(MIN_VILLAGE_SIZE);
    }

    pub fn has_resident(&self, agent: AgentId) -> bool {
        self.buildings.values().any(|b| b.has_resident(agent))
    }

    /// Adds the agent to a building, removing it from any other first.
    pub fn add_resident(&mut self, agent: AgentId, building_id: i32) -> bool {
        if !self.buildings.contains_key(&building_id) {
            return false;
        }
        self.remove_resident(agent);
        if let Some(building) = self.buildings.get_mut(&building_id) {
            building.add_resident(agent);
        }
        true
    }

    /// Removes the agent from every building.
    pub fn remove_resident(&mut self, agent: AgentId) {
        for building in self.buildings.values_mut() {
            building.remove_resident(agent);
        }
    }

    pub fn population(&self) -> usize {
        self.buildings.values().map(|b| b.residents().len()).sum()
    }

    /// Queues a mood change for the next resident to reconcile.
    pub fn push_mood(&mut self, delta: i32) {
        self.pending_mood.push_back(delta);
    }

    /// Takes the oldest pending mood delta, or 0.
    pub fn pop_mood(&mut self) -> i32 {
        self.pending_mood.pop_front().unwrap_or(0)
    }

    pub fn push_hearts(&mut self, player: PlayerId, delta: i32) {
        self.pending_hearts.entry(player).or_default().push_back(delta);
    }

    /// Takes the oldest pending hearts delta for a player, or 0.
    pub fn pop_hearts(&mut self, player: PlayerId) -> i32 {
        let Some(queue) = self.pending_hearts.get_mut(&player) else {
            return 0;
        };
        let delta = queue.pop_front().unwrap_or(0);
        if queue.is_empty() {
            self.pending_hearts.remove(&player);
        }
        delta
    }

    /// Records one villager's view of a player. Later writes replace earlier ones.
    pub fn set_reputation(&mut self, player: PlayerId, agent: AgentId, hearts: i32) {
        self.reputation.entry(player).or_default().insert(agent, hearts);
    }

    /// Settlement-wide reputation of a player.
    pub fn reputation(&self, player: PlayerId) -> i32 {
        self.reputation
            .get(&player)
            .map(|by_agent| by_agent.values().sum())
            .unwrap_or(0)
    }
}

/// Errors saving or loading the registry
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Resource: every settlement in the world
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct VillageManager {
    villages: BTreeMap<i32, Village>,
    next_village_id: i32,
    next_building_id: i32,
    /// Tiles already reported for classification
    known_tiles: BTreeSet<TilePos>,
    #[serde(skip)]
    dirty: bool,
}

impl VillageManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_village(&mut self, name: impl Into<String>, center: TilePos) -> i32 {
        let id = self.next_village_id;
        self.next_village_id += 1;
        self.villages.insert(id, Village::new(id, name, center));
        self.dirty = true;
        id
    }

    pub fn remove_village(&mut self, id: i32) -> Option<Village> {
        let removed = self.villages.remove(&id);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn get(&self, id: i32) -> Option<&Village> {
        self.villages.get(&id)
    }

    /// Mutable access to a settlement; marks the registry dirty.
    pub fn village_mut(&mut self, id: i32) -> Option<&mut Village> {
        let village = self.villages.get_mut(&id);
        if village.is_some() {
            self.dirty = true;
        }
        village
    }

    pub fn villages(&self) -> impl Iterator<Item = &Village> {
        self.villages.values()
    }

    pub fn len(&self) -> usize {
        self.villages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.villages.is_empty()
    }

    /// Registers a building in a settlement and returns its new id.
    pub fn add_building(&mut self, village_id: i32, mut building: Building) -> Option<i32> {
        let id = self.next_building_id;
        let village = self.villages.get_mut(&village_id)?;
        building.set_id(id);
        self.known_tiles.extend(building.beds().iter().copied());
        village.insert_building(building);
        self.next_building_id += 1;
        self.dirty = true;
        Some(id)
    }

    /// Nearest settlement whose border (plus `margin`) covers `pos`.
    pub fn find_nearest(&self, pos: TilePos, margin: i32) -> Option<i32> {
        self.villages
            .values()
            .filter(|v| v.is_within_border(pos, margin))
            .min_by_key(|v| v.center().squared_distance(&pos))
            .map(|v| v.id())
    }

    /// The settlement and building containing `pos`, if any.
    pub fn building_containing(&self, pos: TilePos) -> Option<(i32, i32)> {
        self.villages
            .values()
            .find_map(|v| v.building_at(pos).map(|b| (v.id(), b.id())))
    }

    pub fn is_known(&self, tile: TilePos) -> bool {
        self.known_tiles.contains(&tile)
    }

    /// Reports a tile for classification unless it was reported before.
    pub fn report_building(&mut self, tile: TilePos, scanner: &mut dyn BuildingScanner, index: &dyn WorldIndex) {
        if !self.is_known(tile) {
            self.process_building(tile, scanner, index);
        }
    }

    /// Classifies a tile even if it was reported before.
    pub fn process_building(&mut self, tile: TilePos, scanner: &mut dyn BuildingScanner, index: &dyn WorldIndex) {
        self.known_tiles.insert(tile);
        self.dirty = true;
        scanner.classify_and_register(self, index, tile);
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the registry and clears the dirty flag.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json)?;
        self.dirty = false;
        tracing::info!("Saved {} villages to {}", self.villages.len(), path.as_ref().display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let manager = Self::from_json(&json)?;
        tracing::info!("Loaded {} villages from {}", manager.villages.len(), path.as_ref().display());
        Ok(manager)
    }
}
