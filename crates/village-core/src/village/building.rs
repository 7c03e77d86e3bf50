//! Buildings
//!
//! A structure inside a settlement: its bounds, bed tiles, and residents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use village_events::{AgentId, TilePos};

use crate::poi::{PoiType, WorldIndex};

/// A dwelling structure registered to a settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    id: i32,
    pub building_type: String,
    /// Inclusive lower corner
    pub pos0: TilePos,
    /// Inclusive upper corner
    pub pos1: TilePos,
    pub capacity: usize,
    residents: BTreeSet<AgentId>,
    beds: BTreeSet<TilePos>,
}

impl Building {
    pub fn new(building_type: impl Into<String>, corner_a: TilePos, corner_b: TilePos, capacity: usize) -> Self {
        Self {
            id: 0,
            building_type: building_type.into(),
            pos0: TilePos::new(
                corner_a.x.min(corner_b.x),
                corner_a.y.min(corner_b.y),
                corner_a.z.min(corner_b.z),
            ),
            pos1: TilePos::new(
                corner_a.x.max(corner_b.x),
                corner_a.y.max(corner_b.y),
                corner_a.z.max(corner_b.z),
            ),
            capacity,
            residents: BTreeSet::new(),
            beds: BTreeSet::new(),
        }
    }

    pub fn with_beds(mut self, beds: impl IntoIterator<Item = TilePos>) -> Self {
        self.beds.extend(beds);
        self
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    pub fn center(&self) -> TilePos {
        TilePos::new(
            (self.pos0.x + self.pos1.x) / 2,
            (self.pos0.y + self.pos1.y) / 2,
            (self.pos0.z + self.pos1.z) / 2,
        )
    }

    pub fn contains(&self, tile: TilePos) -> bool {
        (self.pos0.x..=self.pos1.x).contains(&tile.x)
            && (self.pos0.y..=self.pos1.y).contains(&tile.y)
            && (self.pos0.z..=self.pos1.z).contains(&tile.z)
    }

    pub fn residents(&self) -> &BTreeSet<AgentId> {
        &self.residents
    }

    pub fn has_resident(&self, agent: AgentId) -> bool {
        self.residents.contains(&agent)
    }

    pub(crate) fn add_resident(&mut self, agent: AgentId) {
        self.residents.insert(agent);
    }

    pub(crate) fn remove_resident(&mut self, agent: AgentId) -> bool {
        self.residents.remove(&agent)
    }

    pub fn beds(&self) -> &BTreeSet<TilePos> {
        &self.beds
    }

    pub fn has_bed(&self, tile: TilePos) -> bool {
        self.beds.contains(&tile)
    }

    pub fn add_bed(&mut self, tile: TilePos) -> bool {
        self.beds.insert(tile)
    }

    pub fn remove_bed(&mut self, tile: TilePos) -> bool {
        self.beds.remove(&tile)
    }

    /// Advisory only; bed tickets decide actual occupancy.
    pub fn has_free_space(&self) -> bool {
        self.residents.len() < self.capacity
    }

    fn is_open_bed(index: &dyn WorldIndex, tile: TilePos) -> bool {
        index.type_at(tile) == Some(PoiType::Home) && index.has_free_ticket(tile)
    }

    /// First unclaimed bed in tile order.
    pub fn find_open_bed(&self, index: &dyn WorldIndex) -> Option<TilePos> {
        self.beds.iter().copied().find(|bed| Self::is_open_bed(index, *bed))
    }

    /// Unclaimed bed nearest to `pos`.
    pub fn find_closest_open_bed(&self, index: &dyn WorldIndex, pos: TilePos) -> Option<TilePos> {
        self.beds
            .iter()
            .copied()
            .filter(|bed| Self::is_open_bed(index, *bed))
            .min_by_key(|bed| bed.squared_distance(&pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::PoiStorage;

    fn house() -> (Building, PoiStorage) {
        let beds = [TilePos::new(1, 64, 1), TilePos::new(4, 64, 4), TilePos::new(6, 64, 1)];
        let mut index = PoiStorage::new();
        for bed in beds {
            index.add(bed, PoiType::Home);
        }
        let building = Building::new("house", TilePos::new(0, 63, 0), TilePos::new(7, 68, 7), 3).with_beds(beds);
        (building, index)
    }

    #[test]
    fn test_corners_are_normalized() {
        let b = Building::new("house", TilePos::new(5, 70, 5), TilePos::new(0, 60, 0), 1);
        assert_eq!(b.pos0, TilePos::new(0, 60, 0));
        assert!(b.contains(TilePos::new(3, 65, 2)));
        assert!(!b.contains(TilePos::new(6, 65, 2)));
    }

    #[test]
    fn test_open_bed_skips_claimed() {
        let (building, mut index) = house();
        index.reserve(TilePos::new(1, 64, 1));
        assert_eq!(building.find_open_bed(&index), Some(TilePos::new(4, 64, 4)));
    }

    #[test]
    fn test_closest_open_bed() {
        let (building, index) = house();
        assert_eq!(
            building.find_closest_open_bed(&index, TilePos::new(7, 64, 0)),
            Some(TilePos::new(6, 64, 1))
        );
    }

    #[test]
    fn test_no_open_bed_when_all_claimed() {
        let (building, mut index) = house();
        for bed in building.beds().clone() {
            index.reserve(bed);
        }
        assert_eq!(building.find_open_bed(&index), None);
    }

    #[test]
    fn test_free_space_is_advisory_capacity() {
        let (mut building, _) = house();
        building.capacity = 1;
        assert!(building.has_free_space());
        building.add_resident(AgentId::from_bytes([1; 16]));
        assert!(!building.has_free_space());
    }
}
