//! World Setup
//!
//! Builds the demo terrain: a grass plain with one registered house, two
//! houses still waiting to be discovered, a grave, and a few patches of
//! ground nobody should be teleported onto.

use village_events::TilePos;

use crate::poi::{PoiStorage, PoiType};
use crate::terrain::{BlockKind, BlockState, GridWorld, Identifier};
use crate::village::{Blueprint, BlueprintScanner, Building, VillageManager};

/// Half-width of the square grass plain
pub const PLAIN_RADIUS: i32 = 72;
/// Height of the ground surface; agents stand one tile above it
pub const GROUND_Y: i32 = 63;

/// The house every run starts with
pub const OAKVALE_HOUSE: (TilePos, TilePos) = (TilePos::new(0, 63, 0), TilePos::new(6, 68, 6));
pub const OAKVALE_BEDS: [TilePos; 2] = [TilePos::new(2, 64, 2), TilePos::new(4, 64, 2)];

/// Next door to Oakvale, joins it once reported
pub const MILL_HOUSE: (TilePos, TilePos) = (TilePos::new(20, 63, 0), TilePos::new(26, 68, 6));
pub const MILL_BEDS: [TilePos; 2] = [TilePos::new(22, 64, 2), TilePos::new(24, 64, 4)];

/// Far enough away to found its own settlement
pub const HAMLET_HOUSE: (TilePos, TilePos) = (TilePos::new(56, 63, 40), TilePos::new(62, 68, 46));
pub const HAMLET_BEDS: [TilePos; 1] = [TilePos::new(58, 64, 42)];

pub const GRAVE: TilePos = TilePos::new(-6, 64, -6);

/// Everything the residency layer needs before the first tick
pub struct DemoWorld {
    pub grid: GridWorld,
    pub poi: PoiStorage,
    pub villages: VillageManager,
    pub scanner: BlueprintScanner,
}

fn grass() -> BlockState {
    BlockState::new(Identifier::minecraft("grass_block"), BlockKind::Solid)
}

fn bed() -> BlockState {
    BlockState::new(Identifier::minecraft("white_bed"), BlockKind::Bed)
}

fn fill_ground(grid: &mut GridWorld, min: (i32, i32), max: (i32, i32), block: BlockState) {
    for x in min.0..=max.0 {
        for z in min.1..=max.1 {
            grid.set_block(TilePos::new(x, GROUND_Y, z), block.clone());
        }
    }
}

/// Create the terrain, points of interest, and initial settlement
pub fn create_demo_world(join_margin: i32) -> DemoWorld {
    let mut grid = GridWorld::flat((-PLAIN_RADIUS, -PLAIN_RADIUS), (PLAIN_RADIUS, PLAIN_RADIUS), GROUND_Y, grass());

    let oak_leaves = Identifier::minecraft("oak_leaves");
    let birch_leaves = Identifier::minecraft("birch_leaves");
    grid.register_tag(Identifier::minecraft("leaves"), [oak_leaves.clone(), birch_leaves.clone()]);

    // A fallen canopy and a magma vent: standable, but blacklisted by default
    fill_ground(&mut grid, (30, -24), (34, -18), BlockState::new(oak_leaves, BlockKind::Solid));
    fill_ground(&mut grid, (35, -24), (36, -18), BlockState::new(birch_leaves, BlockKind::Solid));
    fill_ground(
        &mut grid,
        (-24, 18),
        (-20, 22),
        BlockState::new(Identifier::minecraft("magma_block"), BlockKind::Hazard),
    );

    let mut poi = PoiStorage::new();
    for tile in OAKVALE_BEDS.iter().chain(MILL_BEDS.iter()).chain(HAMLET_BEDS.iter()) {
        grid.set_block(*tile, bed());
        poi.add(*tile, PoiType::Home);
    }
    grid.set_block(GRAVE, BlockState::new(Identifier::minecraft("poppy"), BlockKind::Plant));
    poi.add(GRAVE, PoiType::Grave);

    let mut villages = VillageManager::new();
    let oakvale = villages.create_village("Oakvale", TilePos::new(3, 64, 3));
    let house = Building::new("house", OAKVALE_HOUSE.0, OAKVALE_HOUSE.1, OAKVALE_BEDS.len()).with_beds(OAKVALE_BEDS);
    if villages.add_building(oakvale, house).is_none() {
        tracing::warn!("Could not register the Oakvale house");
    }

    let scanner = BlueprintScanner::new(join_margin)
        .with_blueprint(Blueprint::new("house", MILL_HOUSE.0, MILL_HOUSE.1, MILL_BEDS.len()))
        .with_blueprint(Blueprint::new("house", HAMLET_HOUSE.0, HAMLET_HOUSE.1, HAMLET_BEDS.len()));

    DemoWorld {
        grid,
        poi,
        villages,
        scanner,
    }
}
