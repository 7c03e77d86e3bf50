//! Building Scanner
//!
//! Turns reported tiles into registered buildings. The residency controller
//! only depends on [`BuildingScanner`]; [`BlueprintScanner`] is the
//! in-process implementation driven by pre-declared building footprints.

use bevy_ecs::prelude::*;

use village_events::TilePos;

use crate::poi::{OccupationStatus, PoiFilter, PoiType, WorldIndex};

use super::{Building, VillageManager};

/// Classifies a reported tile and registers whatever structure it belongs to.
pub trait BuildingScanner: Send + Sync {
    fn classify_and_register(&mut self, villages: &mut VillageManager, index: &dyn WorldIndex, tile: TilePos);
}

/// Resource: the active scanner
#[derive(Resource)]
pub struct ScannerHandle(pub Box<dyn BuildingScanner>);

impl ScannerHandle {
    pub fn new(scanner: impl BuildingScanner + 'static) -> Self {
        Self(Box::new(scanner))
    }
}

/// Footprint of a structure that has been built but not yet discovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blueprint {
    pub building_type: String,
    pub pos0: TilePos,
    pub pos1: TilePos,
    pub capacity: usize,
}

impl Blueprint {
    pub fn new(building_type: impl Into<String>, pos0: TilePos, pos1: TilePos, capacity: usize) -> Self {
        Self {
            building_type: building_type.into(),
            pos0,
            pos1,
            capacity,
        }
    }

    fn to_building(&self) -> Building {
        Building::new(self.building_type.clone(), self.pos0, self.pos1, self.capacity)
    }
}

/// Scanner that recognises buildings from a list of pending blueprints
#[derive(Debug, Clone, Default)]
pub struct BlueprintScanner {
    pending: Vec<Blueprint>,
    /// Distance beyond a settlement's border at which a new building still joins it
    pub join_margin: i32,
}

impl BlueprintScanner {
    pub fn new(join_margin: i32) -> Self {
        Self {
            pending: Vec::new(),
            join_margin,
        }
    }

    pub fn with_blueprint(mut self, blueprint: Blueprint) -> Self {
        self.pending.push(blueprint);
        self
    }

    pub fn add_blueprint(&mut self, blueprint: Blueprint) {
        self.pending.push(blueprint);
    }

    pub fn pending(&self) -> &[Blueprint] {
        &self.pending
    }

    /// Home tiles of the index lying inside the building.
    fn beds_inside(building: &Building, index: &dyn WorldIndex) -> Vec<TilePos> {
        let center = building.center();
        let radius = (building.pos0.squared_distance(&building.pos1) as f64).sqrt().ceil() as i32 + 1;
        index
            .find(PoiFilter::Only(PoiType::Home), center, radius, OccupationStatus::Any)
            .filter(|tile| building.contains(*tile))
            .collect()
    }
}

impl BuildingScanner for BlueprintScanner {
    fn classify_and_register(&mut self, villages: &mut VillageManager, index: &dyn WorldIndex, tile: TilePos) {
        // Already registered: pick up beds placed since the last scan
        if let Some((village_id, building_id)) = villages.building_containing(tile) {
            let Some(building) = villages.get(village_id).and_then(|v| v.building(building_id)) else {
                return;
            };
            let beds = Self::beds_inside(building, index);
            if let Some(building) = villages
                .village_mut(village_id)
                .and_then(|v| v.building_mut(building_id))
            {
                for bed in beds {
                    building.add_bed(bed);
                }
            }
            return;
        }

        let Some(slot) = self.pending.iter().position(|bp| bp.to_building().contains(tile)) else {
            return;
        };
        let blueprint = self.pending.remove(slot);
        let mut building = blueprint.to_building();
        let beds = Self::beds_inside(&building, index);
        building = building.with_beds(beds);

        let center = building.center();
        let village_id = match villages.find_nearest(center, self.join_margin) {
            Some(id) => id,
            None => {
                let name = format!("Settlement {}", villages.len() + 1);
                villages.create_village(name, center)
            }
        };
        if let Some(building_id) = villages.add_building(village_id, building) {
            tracing::debug!(
                "Registered {} {} in village {} from tile {}",
                blueprint.building_type,
                building_id,
                village_id,
                tile
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::PoiStorage;

    fn house_blueprint() -> Blueprint {
        Blueprint::new("house", TilePos::new(20, 63, 0), TilePos::new(26, 68, 6), 2)
    }

    #[test]
    fn test_reported_tile_registers_blueprint() {
        let mut index = PoiStorage::new();
        index.add(TilePos::new(21, 64, 1), PoiType::Home);
        index.add(TilePos::new(40, 64, 1), PoiType::Home);

        let mut villages = VillageManager::new();
        let mut scanner = BlueprintScanner::new(32).with_blueprint(house_blueprint());
        villages.process_building(TilePos::new(21, 64, 1), &mut scanner, &index);

        assert!(scanner.pending().is_empty());
        assert_eq!(villages.len(), 1);
        let (v, b) = villages.building_containing(TilePos::new(22, 64, 2)).unwrap();
        let building = villages.get(v).unwrap().building(b).unwrap();
        assert_eq!(building.beds().len(), 1);
        assert!(villages.is_known(TilePos::new(21, 64, 1)));
    }

    #[test]
    fn test_joins_settlement_in_range() {
        let index = PoiStorage::new();
        let mut villages = VillageManager::new();
        let existing = villages.create_village("Oakvale", TilePos::new(0, 64, 0));
        let mut scanner = BlueprintScanner::new(32).with_blueprint(house_blueprint());

        villages.process_building(TilePos::new(23, 64, 3), &mut scanner, &index);

        assert_eq!(villages.len(), 1);
        assert_eq!(villages.building_containing(TilePos::new(23, 64, 3)).map(|(v, _)| v), Some(existing));
    }

    #[test]
    fn test_rescan_picks_up_new_beds() {
        let mut index = PoiStorage::new();
        let mut villages = VillageManager::new();
        let mut scanner = BlueprintScanner::new(32).with_blueprint(house_blueprint());
        villages.process_building(TilePos::new(22, 64, 2), &mut scanner, &index);

        index.add(TilePos::new(25, 64, 5), PoiType::Home);
        villages.process_building(TilePos::new(22, 64, 2), &mut scanner, &index);

        let (v, b) = villages.building_containing(TilePos::new(22, 64, 2)).unwrap();
        assert!(villages.get(v).unwrap().building(b).unwrap().has_bed(TilePos::new(25, 64, 5)));
    }

    #[test]
    fn test_tile_outside_any_blueprint_is_ignored() {
        let index = PoiStorage::new();
        let mut villages = VillageManager::new();
        let mut scanner = BlueprintScanner::new(32).with_blueprint(house_blueprint());
        villages.process_building(TilePos::new(-50, 64, 0), &mut scanner, &index);
        assert!(villages.is_empty());
        assert_eq!(scanner.pending().len(), 1);
    }
}
