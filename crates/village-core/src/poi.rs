//! Points of Interest
//!
//! Spatial index of tagged tiles (beds, job sites, grave markers) and the
//! ticket-based reservation system over them. A ticket is an exclusive claim:
//! home tiles carry a single ticket, so at most one agent can hold a bed.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use village_events::TilePos;

use crate::terrain::Aabb;

/// Closed set of point-of-interest kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoiType {
    Home,
    JobSite,
    Meeting,
    Grave,
}

impl PoiType {
    /// Number of concurrent claims the tile supports.
    pub fn ticket_count(self) -> u32 {
        match self {
            PoiType::Home | PoiType::JobSite => 1,
            PoiType::Meeting => 32,
            PoiType::Grave => 0,
        }
    }
}

/// Occupancy filter for spatial queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupationStatus {
    Any,
    HasSpace,
    IsOccupied,
}

/// Which POI kinds a query accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoiFilter {
    Any,
    Only(PoiType),
}

impl PoiFilter {
    pub fn accepts(self, kind: PoiType) -> bool {
        match self {
            PoiFilter::Any => true,
            PoiFilter::Only(wanted) => wanted == kind,
        }
    }
}

/// Spatial query and reservation capability over points of interest.
pub trait WorldIndex {
    /// Tiles matching `filter` and `status` within `radius` (Euclidean) of `origin`.
    fn find<'a>(
        &'a self,
        filter: PoiFilter,
        origin: TilePos,
        radius: i32,
        status: OccupationStatus,
    ) -> Box<dyn Iterator<Item = TilePos> + 'a>;

    /// Grave markers inside `bounds`.
    fn graves_within<'a>(&'a self, bounds: Aabb) -> Box<dyn Iterator<Item = TilePos> + 'a>;

    fn type_at(&self, tile: TilePos) -> Option<PoiType>;

    fn has_free_ticket(&self, tile: TilePos) -> bool;

    /// Claims one ticket on the tile. Returns false if none is free.
    fn reserve(&mut self, tile: TilePos) -> bool;

    /// Returns a ticket to the tile. Returns false if nothing was held.
    fn release(&mut self, tile: TilePos) -> bool;
}

/// A registered point of interest with its remaining tickets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoiRecord {
    pub kind: PoiType,
    pub free_tickets: u32,
}

impl PoiRecord {
    pub fn new(kind: PoiType) -> Self {
        Self {
            kind,
            free_tickets: kind.ticket_count(),
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.free_tickets < self.kind.ticket_count()
    }

    pub fn has_space(&self) -> bool {
        self.free_tickets > 0
    }
}

/// Resource: in-process world index
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoiStorage {
    records: BTreeMap<TilePos, PoiRecord>,
}

impl PoiStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tile: TilePos, kind: PoiType) {
        self.records.insert(tile, PoiRecord::new(kind));
    }

    pub fn remove(&mut self, tile: TilePos) -> Option<PoiRecord> {
        self.records.remove(&tile)
    }

    pub fn get(&self, tile: TilePos) -> Option<&PoiRecord> {
        self.records.get(&tile)
    }

    /// Number of claims currently held on a tile.
    pub fn claims_on(&self, tile: TilePos) -> u32 {
        self.records
            .get(&tile)
            .map(|r| r.kind.ticket_count() - r.free_tickets)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl WorldIndex for PoiStorage {
    fn find<'a>(
        &'a self,
        filter: PoiFilter,
        origin: TilePos,
        radius: i32,
        status: OccupationStatus,
    ) -> Box<dyn Iterator<Item = TilePos> + 'a> {
        let radius_sq = (radius as i64) * (radius as i64);
        Box::new(
            self.records
                .iter()
                .filter(move |(tile, record)| {
                    filter.accepts(record.kind)
                        && tile.squared_distance(&origin) <= radius_sq
                        && match status {
                            OccupationStatus::Any => true,
                            OccupationStatus::HasSpace => record.has_space(),
                            OccupationStatus::IsOccupied => record.is_occupied(),
                        }
                })
                .map(|(tile, _)| *tile),
        )
    }

    fn graves_within<'a>(&'a self, bounds: Aabb) -> Box<dyn Iterator<Item = TilePos> + 'a> {
        Box::new(
            self.records
                .iter()
                .filter(move |(tile, record)| record.kind == PoiType::Grave && bounds.contains_tile(**tile))
                .map(|(tile, _)| *tile),
        )
    }

    fn type_at(&self, tile: TilePos) -> Option<PoiType> {
        self.records.get(&tile).map(|r| r.kind)
    }

    fn has_free_ticket(&self, tile: TilePos) -> bool {
        self.records.get(&tile).is_some_and(|r| r.has_space())
    }

    fn reserve(&mut self, tile: TilePos) -> bool {
        match self.records.get_mut(&tile) {
            Some(record) if record.free_tickets > 0 => {
                record.free_tickets -= 1;
                true
            }
            _ => false,
        }
    }

    fn release(&mut self, tile: TilePos) -> bool {
        match self.records.get_mut(&tile) {
            Some(record) if record.free_tickets < record.kind.ticket_count() => {
                record.free_tickets += 1;
                true
            }
            _ => false,
        }
    }
}
