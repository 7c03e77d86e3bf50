//! Residency Controller
//!
//! Per-villager housing logic: finding a settlement, claiming a bed inside one
//! of its buildings, losing it again, and folding the settlement's shared
//! mood and reputation ledgers into the villager's own state.
//!
//! Everything here runs synchronously on the tick loop. Soft misses (no
//! settlement, no free bed, vanished building) never error; they leave the
//! villager's facts in a consistent, emptier state.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use village_events::{AgentId, EventKind, EvictionReason, GlobalTile, PlayerId, TilePos, TrackedResidency};

use crate::components::{AgentSize, MemoryModule, MemoryStore, Position, VillagerBrain, WalkTarget};
use crate::config::ResidencyConfig;
use crate::events::TickEvents;
use crate::messages::{keys, ActorMessenger};
use crate::poi::{OccupationStatus, PoiFilter, PoiType, WorldIndex};
use crate::terrain::BlockView;
use crate::village::{BuildingScanner, Village, VillageManager};

/// Component: a villager's settlement and building membership
#[derive(Component, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidencyData {
    pub village: Option<i32>,
    pub building: Option<i32>,
    pub hangout: TilePos,
}

impl From<&ResidencyData> for TrackedResidency {
    fn from(data: &ResidencyData) -> Self {
        TrackedResidency {
            village: TrackedResidency::id_to_wire(data.village),
            buildings: TrackedResidency::id_to_wire(data.building),
            hangout_pos: data.hangout,
        }
    }
}

impl From<TrackedResidency> for ResidencyData {
    fn from(tracked: TrackedResidency) -> Self {
        ResidencyData {
            village: TrackedResidency::id_from_wire(tracked.village),
            building: TrackedResidency::id_from_wire(tracked.buildings),
            hangout: tracked.hangout_pos,
        }
    }
}

/// The player on the other end of an interaction
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: PlayerId,
    pub position: Position,
}

impl Actor {
    pub fn new(id: PlayerId, position: Position) -> Self {
        Self { id, position }
    }
}

/// Result of asking a villager to live where the player stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetHomeOutcome {
    Success,
    /// Standing in a building, but it has no free bed
    BedFail,
    /// Not standing in any building of the nearest settlement
    NoBuilding,
}

impl SetHomeOutcome {
    pub fn message_key(self) -> &'static str {
        match self {
            SetHomeOutcome::Success => keys::SET_HOME_SUCCESS,
            SetHomeOutcome::BedFail => keys::SET_HOME_BED_FAIL,
            SetHomeOutcome::NoBuilding => keys::SET_HOME_FAIL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoHomeOutcome {
    Success,
    NoHome,
}

impl GoHomeOutcome {
    pub fn message_key(self) -> &'static str {
        match self {
            GoHomeOutcome::Success => keys::GO_HOME_SUCCESS,
            GoHomeOutcome::NoHome => keys::GO_HOME_NO_HOME,
        }
    }
}

/// Shared state every villager's controller reads and mutates
pub struct ResidencyWorld<'a> {
    pub villages: &'a mut VillageManager,
    pub index: &'a mut dyn WorldIndex,
    pub blocks: &'a dyn BlockView,
    pub scanner: &'a mut dyn BuildingScanner,
    pub events: &'a mut TickEvents,
    pub messenger: &'a mut dyn ActorMessenger,
    pub config: &'a ResidencyConfig,
    /// Every connected player
    pub players: &'a [Actor],
    pub tick: u64,
}

/// One villager's view of its own residency state
pub struct Resident<'a> {
    pub id: AgentId,
    pub age: u64,
    pub position: &'a Position,
    pub size: &'a AgentSize,
    pub data: &'a mut ResidencyData,
    pub memory: &'a mut MemoryStore,
    pub brain: &'a mut VillagerBrain,
    pub rng: &'a mut SmallRng,
}

impl<'a> Resident<'a> {
    fn tile(&self) -> TilePos {
        self.position.tile()
    }

    pub fn get_workplace(&self) -> TilePos {
        self.memory.job_site().map(|site| site.pos).unwrap_or(TilePos::ORIGIN)
    }

    pub fn set_workplace(&mut self, world: &mut ResidencyWorld<'_>, actor: &Actor) {
        world.messenger.notify(self.id, actor.id, keys::SET_WORKPLACE_SUCCESS);
        self.memory
            .remember_job_site(GlobalTile::new(actor.position.dimension.clone(), actor.position.tile()));
    }

    pub fn get_hangout(&self) -> TilePos {
        self.data.hangout
    }

    pub fn set_hangout(&mut self, world: &mut ResidencyWorld<'_>, actor: &Actor) {
        world.messenger.notify(self.id, actor.id, keys::SET_HANGOUT_SUCCESS);
        self.data.hangout = actor.position.tile();
    }

    /// The settlement this villager belongs to, if it still exists.
    pub fn home_village<'w>(&self, world: &'w ResidencyWorld<'_>) -> Option<&'w Village> {
        self.data.village.and_then(|id| world.villages.get(id))
    }

    /// Drops this villager from its building's resident set. Ids are kept.
    pub fn leave_home(&mut self, world: &mut ResidencyWorld<'_>) {
        let (Some(village_id), Some(building_id)) = (self.data.village, self.data.building) else {
            return;
        };
        let Some(village) = world.villages.village_mut(village_id) else {
            return;
        };
        if let Some(building) = village.building_mut(building_id) {
            building.remove_resident(self.id);
        }
    }

    pub fn get_home(&self) -> Option<&GlobalTile> {
        self.memory.home()
    }

    /// Tries to claim a bed in the building the actor stands in.
    ///
    /// Returns `None` (and says nothing) when no settlement is near the actor.
    pub fn set_home(&mut self, world: &mut ResidencyWorld<'_>, actor: &Actor) -> Option<SetHomeOutcome> {
        let tile = actor.position.tile();
        world.villages.process_building(tile, &mut *world.scanner, &*world.index);

        let village_id = world.villages.find_nearest(tile, world.config.village_discovery_margin)?;
        let building_id = world
            .villages
            .get(village_id)
            .and_then(|v| v.building_at(tile))
            .map(|b| b.id());

        let outcome = match building_id {
            Some(building_id) => {
                if self.seek_home_in_building_near(world, village_id, building_id, tile) {
                    SetHomeOutcome::Success
                } else {
                    SetHomeOutcome::BedFail
                }
            }
            None => SetHomeOutcome::NoBuilding,
        };
        world.messenger.notify(self.id, actor.id, outcome.message_key());
        Some(outcome)
    }

    /// Sends the villager toward its bed if it has one in this dimension.
    pub fn go_home(&mut self, world: &mut ResidencyWorld<'_>, actor: &Actor) -> GoHomeOutcome {
        let home = self
            .memory
            .home()
            .filter(|home| home.dimension == self.position.dimension)
            .map(|home| home.pos);

        let outcome = match home {
            Some(pos) => {
                self.memory.remember_walk_target(WalkTarget::new(
                    pos,
                    world.config.go_home_speed,
                    world.config.go_home_completion_range,
                ));
                GoHomeOutcome::Success
            }
            None => GoHomeOutcome::NoHome,
        };
        world.messenger.notify(self.id, actor.id, outcome.message_key());
        outcome
    }

    /// Periodic update, gated on the villager's age.
    pub fn tick(&mut self, world: &mut ResidencyWorld<'_>) {
        if self.age % world.config.building_scan_interval == 0 {
            self.report_buildings(world);

            if self.data.village.is_none() {
                if let Some(village_id) = world
                    .villages
                    .find_nearest(self.tile(), world.config.village_discovery_margin)
                {
                    tracing::debug!("Villager {} adopted village {}", self.id, village_id);
                    self.data.village = Some(village_id);
                    world.events.emit(world.tick, self.id, EventKind::VillageAdopted { village: village_id });
                }
            }

            if self.data.building.is_none() {
                match self.data.village.filter(|id| world.villages.get(*id).is_some()) {
                    Some(village_id) => {
                        self.seek_new_home(world, village_id);
                    }
                    None => self.data.village = None,
                }
            }

            if self.data.building.is_some() && !self.memory.has(MemoryModule::Home) {
                let building = self.data.building.take();
                if let Some(village_id) = self.data.village {
                    if let Some(village) = world.villages.village_mut(village_id) {
                        village.remove_resident(self.id);
                    }
                    tracing::debug!("Villager {} lost its bed in village {}", self.id, village_id);
                    world.events.emit(
                        world.tick,
                        self.id,
                        EventKind::Evicted {
                            village: village_id,
                            building,
                            reason: EvictionReason::LostBed,
                        },
                    );
                }
            }
        }

        if self.age % world.config.validation_interval == 0 {
            self.validate_residence(world);
        }
    }

    /// Reports nearby points of interest and graves the registry has not seen.
    fn report_buildings(&mut self, world: &mut ResidencyWorld<'_>) {
        let mut tiles: Vec<TilePos> = world
            .index
            .find(PoiFilter::Any, self.tile(), world.config.poi_scan_radius, OccupationStatus::Any)
            .filter(|tile| !world.villages.is_known(*tile))
            .collect();

        let grave_bounds = self
            .size
            .bounding_box(self.position.pos)
            .expand(world.config.grave_scan_radius);
        tiles.extend(
            world
                .index
                .graves_within(grave_bounds)
                .filter(|tile| !world.villages.is_known(*tile)),
        );

        for tile in tiles {
            world.villages.report_building(tile, &mut *world.scanner, &*world.index);
        }
    }

    /// Tries buildings with free space in random order, taking the first open bed.
    pub fn seek_new_home(&mut self, world: &mut ResidencyWorld<'_>, village_id: i32) -> bool {
        let Some(village) = world.villages.get(village_id) else {
            return false;
        };
        let mut candidates: Vec<i32> = village
            .buildings()
            .filter(|b| b.has_free_space())
            .map(|b| b.id())
            .collect();
        candidates.shuffle(&mut *self.rng);

        for building_id in candidates {
            let bed = world
                .villages
                .get(village_id)
                .and_then(|v| v.building(building_id))
                .and_then(|b| b.find_open_bed(&*world.index));
            if let Some(bed) = bed {
                self.set_bed(world, village_id, building_id, bed);
                return true;
            }
        }
        false
    }

    /// Tries every building in id order, taking the open bed closest to `anchor`.
    pub fn seek_new_home_near(&mut self, world: &mut ResidencyWorld<'_>, village_id: i32, anchor: TilePos) -> bool {
        let Some(village) = world.villages.get(village_id) else {
            return false;
        };
        let building_ids: Vec<i32> = village.buildings().map(|b| b.id()).collect();
        building_ids
            .into_iter()
            .any(|building_id| self.seek_home_in_building_near(world, village_id, building_id, anchor))
    }

    fn seek_home_in_building_near(
        &mut self,
        world: &mut ResidencyWorld<'_>,
        village_id: i32,
        building_id: i32,
        anchor: TilePos,
    ) -> bool {
        let bed = world
            .villages
            .get(village_id)
            .and_then(|v| v.building(building_id))
            .and_then(|b| b.find_closest_open_bed(&*world.index, anchor));
        match bed {
            Some(bed) => {
                self.set_bed(world, village_id, building_id, bed);
                true
            }
            None => false,
        }
    }

    /// Moves into a building. The home fact and ticket are only taken when the
    /// tile really is a bed; membership is recorded either way.
    fn set_bed(&mut self, world: &mut ResidencyWorld<'_>, village_id: i32, building_id: i32, bed: TilePos) {
        self.clear_bed(world);
        self.memory.forget(MemoryModule::Home);

        if let Some(previous) = self.data.village.filter(|id| *id != village_id) {
            if let Some(village) = world.villages.village_mut(previous) {
                village.remove_resident(self.id);
            }
        }
        self.data.village = Some(village_id);

        let claimed = world.blocks.block_at(bed).is_bed();
        if claimed {
            self.memory
                .remember_home(GlobalTile::new(self.position.dimension.clone(), bed));
            world.index.reserve(bed);
        }

        self.data.building = Some(building_id);
        if let Some(village) = world.villages.village_mut(village_id) {
            village.add_resident(self.id, building_id);
        }

        if claimed {
            tracing::debug!("Villager {} took bed {} in building {}", self.id, bed, building_id);
            world.events.emit(
                world.tick,
                self.id,
                EventKind::TookResidence {
                    village: village_id,
                    building: building_id,
                    bed,
                },
            );
        }
    }

    /// Returns the ticket on the remembered bed. The fact itself stays.
    pub fn clear_bed(&mut self, world: &mut ResidencyWorld<'_>) {
        if let Some(home) = self.memory.home() {
            if world.index.type_at(home.pos) == Some(PoiType::Home) {
                world.index.release(home.pos);
            }
        }
    }

    fn evict(&mut self, world: &mut ResidencyWorld<'_>) {
        self.data.building = None;
        self.clear_bed(world);
        self.memory.forget(MemoryModule::Home);
    }

    fn validate_residence(&mut self, world: &mut ResidencyWorld<'_>) {
        let Some(village) = self.home_village(world) else {
            let previous = self.data.village.take();
            let building = self.data.building;
            self.evict(world);
            if let Some(village_id) = previous {
                tracing::debug!("Villager {} lost village {}", self.id, village_id);
                world.events.emit(
                    world.tick,
                    self.id,
                    EventKind::Evicted {
                        village: village_id,
                        building,
                        reason: EvictionReason::VillageGone,
                    },
                );
            }
            return;
        };
        let village_id = village.id();

        let home = self.memory.home().map(|h| h.pos);
        let valid = self
            .data
            .building
            .and_then(|id| village.building(id))
            .is_some_and(|b| b.has_resident(self.id) && home.map_or(true, |bed| b.has_bed(bed)));

        if !valid {
            let building = self.data.building;
            self.evict(world);
            if building.is_some() {
                tracing::debug!("Villager {} is no longer a resident of village {}", self.id, village_id);
                world.events.emit(
                    world.tick,
                    self.id,
                    EventKind::Evicted {
                        village: village_id,
                        building,
                        reason: EvictionReason::NotResident,
                    },
                );
            }
            return;
        }

        self.sync_ledgers(world, village_id);
    }

    /// Pulls pending deltas from the settlement and pushes reputation back.
    fn sync_ledgers(&mut self, world: &mut ResidencyWorld<'_>, village_id: i32) {
        let Some(village) = world.villages.village_mut(village_id) else {
            return;
        };

        let mood = village.pop_mood();
        if mood != 0 {
            self.brain.modify_mood(mood);
            world.events.emit(
                world.tick,
                self.id,
                EventKind::MoodApplied {
                    delta: mood,
                    mood: self.brain.mood(),
                },
            );
        }

        let nearby = world
            .players
            .iter()
            .filter(|p| p.position.dimension == self.position.dimension);

        for player in nearby.clone() {
            let hearts = village.pop_hearts(player.id);
            if hearts != 0 {
                self.brain.memories_for_player(player.id).mod_hearts(hearts);
                world.events.emit(
                    world.tick,
                    self.id,
                    EventKind::HeartsApplied {
                        player: player.id,
                        delta: hearts,
                    },
                );
            }
        }

        for player in nearby {
            let hearts = self.brain.memories_for_player(player.id).hearts;
            village.set_reputation(player.id, self.id, hearts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Outbox;
    use crate::poi::PoiStorage;
    use crate::terrain::{BlockKind, BlockState, GridWorld, Identifier};
    use crate::village::{BlueprintScanner, Building};
    use rand::SeedableRng;

    struct Fixture {
        villages: VillageManager,
        index: PoiStorage,
        blocks: GridWorld,
        scanner: BlueprintScanner,
        events: TickEvents,
        outbox: Outbox,
        config: ResidencyConfig,
        players: Vec<Actor>,
    }

    impl Fixture {
        fn world(&mut self, tick: u64) -> ResidencyWorld<'_> {
            ResidencyWorld {
                villages: &mut self.villages,
                index: &mut self.index,
                blocks: &self.blocks,
                scanner: &mut self.scanner,
                events: &mut self.events,
                messenger: &mut self.outbox,
                config: &self.config,
                players: &self.players,
                tick,
            }
        }
    }

    struct Agent {
        id: AgentId,
        position: Position,
        size: AgentSize,
        data: ResidencyData,
        memory: MemoryStore,
        brain: VillagerBrain,
        rng: SmallRng,
    }

    impl Agent {
        fn at(tile: TilePos) -> Self {
            Self {
                id: AgentId::from_bytes([9; 16]),
                position: Position::at_tile(tile),
                size: AgentSize::default(),
                data: ResidencyData::default(),
                memory: MemoryStore::new(),
                brain: VillagerBrain::new(),
                rng: SmallRng::seed_from_u64(5),
            }
        }

        fn resident(&mut self, age: u64) -> Resident<'_> {
            Resident {
                id: self.id,
                age,
                position: &self.position,
                size: &self.size,
                data: &mut self.data,
                memory: &mut self.memory,
                brain: &mut self.brain,
                rng: &mut self.rng,
            }
        }
    }

    const BED: TilePos = TilePos::new(2, 64, 2);

    /// One village with one house holding a single bed at `BED`.
    fn fixture() -> (Fixture, i32, i32) {
        let mut blocks = GridWorld::flat(
            (-30, -30),
            (30, 30),
            63,
            BlockState::new(Identifier::minecraft("grass_block"), BlockKind::Solid),
        );
        blocks.set_block(BED, BlockState::new(Identifier::minecraft("red_bed"), BlockKind::Bed));
        let mut index = PoiStorage::new();
        index.add(BED, PoiType::Home);

        let mut villages = VillageManager::new();
        let village = villages.create_village("Oakvale", TilePos::new(3, 64, 3));
        let building = villages
            .add_building(
                village,
                Building::new("house", TilePos::new(0, 63, 0), TilePos::new(6, 68, 6), 1).with_beds([BED]),
            )
            .unwrap();

        let fixture = Fixture {
            villages,
            index,
            blocks,
            scanner: BlueprintScanner::new(32),
            events: TickEvents::new(),
            outbox: Outbox::new(),
            config: ResidencyConfig::default(),
            players: vec![Actor::new(PlayerId::from_bytes([1; 16]), Position::at_tile(TilePos::new(3, 64, 3)))],
        };
        (fixture, village, building)
    }

    #[test]
    fn test_tracked_residency_uses_sentinel() {
        let data = ResidencyData {
            village: Some(2),
            building: None,
            hangout: TilePos::new(1, 2, 3),
        };
        let tracked = TrackedResidency::from(&data);
        assert_eq!(tracked.buildings, -1);
        assert_eq!(ResidencyData::from(tracked), data);
    }

    #[test]
    fn test_first_scan_adopts_village_and_claims_bed() {
        let (mut fx, village, building) = fixture();
        let mut agent = Agent::at(TilePos::new(10, 64, 10));
        agent.resident(600).tick(&mut fx.world(600));

        assert_eq!(agent.data.village, Some(village));
        assert_eq!(agent.data.building, Some(building));
        assert_eq!(agent.memory.home().map(|h| h.pos), Some(BED));
        assert_eq!(fx.index.claims_on(BED), 1);
        assert!(fx.villages.get(village).unwrap().has_resident(agent.id));
    }

    #[test]
    fn test_missing_village_resets_village_id() {
        let (mut fx, _, _) = fixture();
        let mut agent = Agent::at(TilePos::new(10, 64, 10));
        agent.data.village = Some(42);
        agent.resident(600).tick(&mut fx.world(600));
        // The stale id is dropped; discovery only runs for villagers without one
        assert_eq!(agent.data.village, None);
        assert_eq!(agent.data.building, None);
    }

    #[test]
    fn test_lost_bed_leaves_building() {
        let (mut fx, village, building) = fixture();
        let mut agent = Agent::at(TilePos::new(3, 64, 3));
        agent.data.village = Some(village);
        agent.data.building = Some(building);
        fx.villages.village_mut(village).unwrap().add_resident(agent.id, building);

        agent.resident(600).tick(&mut fx.world(600));

        assert_eq!(agent.data.building, None);
        assert!(!fx.villages.get(village).unwrap().has_resident(agent.id));
    }

    #[test]
    fn test_non_bed_tile_still_records_membership() {
        let (mut fx, village, building) = fixture();
        let floor = TilePos::new(4, 64, 4);
        fx.index.add(floor, PoiType::Home);
        let mut agent = Agent::at(floor);
        agent.resident(1).set_bed(&mut fx.world(1), village, building, floor);

        assert_eq!(agent.data.building, Some(building));
        assert!(agent.memory.home().is_none());
        assert_eq!(fx.index.claims_on(floor), 0);
        assert!(fx.villages.get(village).unwrap().has_resident(agent.id));
    }

    #[test]
    fn test_clear_then_set_same_bed_holds_one_ticket() {
        let (mut fx, village, building) = fixture();
        let mut agent = Agent::at(TilePos::new(3, 64, 3));
        agent.resident(1).set_bed(&mut fx.world(1), village, building, BED);
        agent.resident(1).clear_bed(&mut fx.world(1));
        agent.resident(1).set_bed(&mut fx.world(1), village, building, BED);
        assert_eq!(fx.index.claims_on(BED), 1);
    }

    #[test]
    fn test_validation_syncs_ledgers() {
        let (mut fx, village, _) = fixture();
        let player = fx.players[0].id;
        let mut agent = Agent::at(TilePos::new(3, 64, 3));
        agent.resident(600).tick(&mut fx.world(600));

        {
            let v = fx.villages.village_mut(village).unwrap();
            v.push_mood(4);
            v.push_hearts(player, 6);
        }
        agent.resident(1200).tick(&mut fx.world(1200));

        assert_eq!(agent.brain.mood(), 4);
        assert_eq!(agent.brain.hearts_for(player), 6);
        assert_eq!(fx.villages.get(village).unwrap().reputation(player), 6);
    }

    #[test]
    fn test_vanished_village_resets_everything() {
        let (mut fx, village, _) = fixture();
        let mut agent = Agent::at(TilePos::new(3, 64, 3));
        agent.resident(600).tick(&mut fx.world(600));
        fx.villages.remove_village(village);

        agent.resident(1200).tick(&mut fx.world(1200));

        assert_eq!(agent.data.village, None);
        assert_eq!(agent.data.building, None);
        assert!(agent.memory.home().is_none());
        assert_eq!(fx.index.claims_on(BED), 0);
    }

    #[test]
    fn test_dropped_from_building_is_evicted_at_validation() {
        let (mut fx, village, building) = fixture();
        let mut agent = Agent::at(TilePos::new(3, 64, 3));
        agent.resident(600).tick(&mut fx.world(600));
        assert_eq!(agent.data.building, Some(building));
        fx.events.drain();

        fx.villages
            .village_mut(village)
            .unwrap()
            .building_mut(building)
            .unwrap()
            .remove_resident(agent.id);
        agent.resident(1200).tick(&mut fx.world(1200));

        assert_eq!(agent.data.village, Some(village));
        assert_eq!(agent.data.building, None);
        assert!(agent.memory.home().is_none());
        assert_eq!(fx.index.claims_on(BED), 0);
        let events = fx.events.drain();
        assert!(events.iter().any(|e| e.kind
            == EventKind::Evicted {
                village,
                building: Some(building),
                reason: EvictionReason::NotResident,
            }));
    }

    /// Adds a second single-capacity house with two beds to the fixture.
    fn add_second_house(fx: &mut Fixture, village: i32) -> (i32, TilePos, TilePos) {
        let back_bed = TilePos::new(14, 64, 14);
        let front_bed = TilePos::new(11, 64, 11);
        for bed in [back_bed, front_bed] {
            fx.blocks
                .set_block(bed, BlockState::new(Identifier::minecraft("red_bed"), BlockKind::Bed));
            fx.index.add(bed, PoiType::Home);
        }
        let building = fx
            .villages
            .add_building(
                village,
                Building::new("house", TilePos::new(10, 63, 10), TilePos::new(16, 68, 16), 1).with_beds([back_bed, front_bed]),
            )
            .unwrap();
        (building, back_bed, front_bed)
    }

    #[test]
    fn test_seek_near_takes_closest_bed_in_first_open_building() {
        let (mut fx, village, first) = fixture();
        let (second, back_bed, _) = add_second_house(&mut fx, village);
        assert!(first < second);
        let anchor = TilePos::new(15, 64, 15);

        // Buildings are tried in id order, so the first house wins while it has a bed
        let mut agent = Agent::at(anchor);
        assert!(agent.resident(1).seek_new_home_near(&mut fx.world(1), village, anchor));
        assert_eq!(agent.data.building, Some(first));
        assert_eq!(agent.memory.home().map(|h| h.pos), Some(BED));

        let mut second_agent = Agent::at(anchor);
        second_agent.id = AgentId::from_bytes([8; 16]);
        assert!(second_agent.resident(1).seek_new_home_near(&mut fx.world(1), village, anchor));
        assert_eq!(second_agent.data.building, Some(second));
        assert_eq!(second_agent.memory.home().map(|h| h.pos), Some(back_bed));
    }

    #[test]
    fn test_seek_near_ignores_free_space() {
        let (mut fx, village, _) = fixture();
        let (second, back_bed, front_bed) = add_second_house(&mut fx, village);
        fx.index.reserve(BED);

        // The second house is full by head count but still has open tickets
        let lodger = AgentId::from_bytes([7; 16]);
        fx.villages.village_mut(village).unwrap().add_resident(lodger, second);
        assert!(!fx.villages.get(village).unwrap().building(second).unwrap().has_free_space());

        let mut agent = Agent::at(TilePos::new(0, 64, 0));
        assert!(!agent.resident(600).seek_new_home(&mut fx.world(600), village));
        assert!(agent.resident(1).seek_new_home_near(&mut fx.world(1), village, TilePos::new(10, 64, 10)));
        assert_eq!(agent.data.building, Some(second));
        assert_eq!(agent.memory.home().map(|h| h.pos), Some(front_bed));

        let mut other = Agent::at(TilePos::new(0, 64, 0));
        other.id = AgentId::from_bytes([8; 16]);
        assert!(other.resident(1).seek_new_home_near(&mut fx.world(1), village, TilePos::new(10, 64, 10)));
        assert_eq!(other.memory.home().map(|h| h.pos), Some(back_bed));

        let mut late = Agent::at(TilePos::new(0, 64, 0));
        late.id = AgentId::from_bytes([6; 16]);
        assert!(!late.resident(1).seek_new_home_near(&mut fx.world(1), village, TilePos::new(10, 64, 10)));
        assert_eq!(late.data.building, None);
        assert_eq!(fx.index.claims_on(BED), 1);
    }

    #[test]
    fn test_set_home_outcomes() {
        let (mut fx, _, _) = fixture();
        let mut agent = Agent::at(TilePos::new(10, 64, 10));
        let inside = Actor::new(PlayerId::from_bytes([1; 16]), Position::at_tile(TilePos::new(3, 64, 3)));
        let outside = Actor::new(PlayerId::from_bytes([1; 16]), Position::at_tile(TilePos::new(12, 64, 12)));
        let far = Actor::new(PlayerId::from_bytes([1; 16]), Position::at_tile(TilePos::new(-400, 64, 0)));

        assert_eq!(agent.resident(7).set_home(&mut fx.world(7), &outside), Some(SetHomeOutcome::NoBuilding));
        assert_eq!(agent.resident(7).set_home(&mut fx.world(7), &inside), Some(SetHomeOutcome::Success));
        assert_eq!(agent.memory.home().map(|h| h.pos), Some(BED));

        let mut rival = Agent::at(TilePos::new(10, 64, 10));
        rival.id = AgentId::from_bytes([8; 16]);
        assert_eq!(rival.resident(7).set_home(&mut fx.world(7), &inside), Some(SetHomeOutcome::BedFail));

        let sent = fx.outbox.len();
        assert_eq!(agent.resident(7).set_home(&mut fx.world(7), &far), None);
        assert_eq!(fx.outbox.len(), sent);
    }

    #[test]
    fn test_go_home_sets_walk_target() {
        let (mut fx, _, _) = fixture();
        let actor = fx.players[0].clone();
        let mut agent = Agent::at(TilePos::new(10, 64, 10));

        assert_eq!(agent.resident(1).go_home(&mut fx.world(1), &actor), GoHomeOutcome::NoHome);
        assert!(agent.memory.walk_target().is_none());

        agent.memory.remember_home(GlobalTile::new(agent.position.dimension.clone(), BED));
        assert_eq!(agent.resident(1).go_home(&mut fx.world(1), &actor), GoHomeOutcome::Success);
        assert_eq!(agent.memory.walk_target().map(|t| t.look_target), Some(BED));
        assert_eq!(
            fx.outbox.last_for(actor.id).map(|m| m.key.as_str()),
            Some(keys::GO_HOME_SUCCESS)
        );
    }

    #[test]
    fn test_workplace_and_hangout_follow_actor() {
        let (mut fx, _, _) = fixture();
        let actor = fx.players[0].clone();
        let mut agent = Agent::at(TilePos::new(10, 64, 10));
        assert_eq!(agent.resident(1).get_workplace(), TilePos::ORIGIN);

        agent.resident(1).set_workplace(&mut fx.world(1), &actor);
        agent.resident(1).set_hangout(&mut fx.world(1), &actor);
        assert_eq!(agent.resident(1).get_workplace(), TilePos::new(3, 64, 3));
        assert_eq!(agent.resident(1).get_hangout(), TilePos::new(3, 64, 3));
        assert_eq!(fx.outbox.len(), 2);
    }
}
