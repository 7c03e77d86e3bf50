//! Village Residency Simulation
//!
//! Runs the demo settlement: villagers discover houses, claim beds, follow
//! errands and player requests, and the village registry is saved whenever
//! it changes.

use bevy_ecs::prelude::*;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use village_core::events::{EventLogger, TickEvents};
use village_core::messages::Outbox;
use village_core::residency::ResidencyData;
use village_core::setup;
use village_core::systems::NavigationFaults;
use village_core::village::VillageManager;
use village_core::{build_schedule, Config, SimClock};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "village_sim")]
#[command(about = "Villager residency and navigation simulation")]
struct Args {
    /// Random seed for reproducibility (overrides the tuning file)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate (overrides the tuning file)
    #[arg(long)]
    ticks: Option<u64>,

    /// Tuning file
    #[arg(long, default_value = village_core::config::DEFAULT_TUNING_PATH)]
    config: PathBuf,

    /// Where the village registry is saved
    #[arg(long, default_value = "output/villages.json")]
    save: PathBuf,

    /// Event log (JSON lines)
    #[arg(long, default_value = "output/events.jsonl")]
    events: PathBuf,

    /// Let villagers teleport toward distant targets
    #[arg(long)]
    allow_teleporting: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = if args.config.exists() {
        match Config::load(&args.config) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: Could not load {}: {}", args.config.display(), e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        Config::default()
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(ticks) = args.ticks {
        config.simulation.ticks = ticks;
    }
    if args.allow_teleporting {
        config.navigation.allow_teleporting = true;
    }

    println!("Village Residency Simulation");
    println!("============================");
    println!("Seed: {}", config.simulation.seed);
    println!("Ticks: {}", config.simulation.ticks);
    println!("Teleporting: {}", config.navigation.allow_teleporting);
    println!();

    for path in [&args.save, &args.events] {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(dir) {
                eprintln!("Warning: Could not create {}: {}", dir.display(), e);
            }
        }
    }

    println!("Creating world...");
    let mut world = match setup::init_world(&config) {
        Ok(world) => world,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let summary = setup::get_spawn_summary(&mut world);
    println!("  Spawned {} players and {} villagers", summary.players, summary.villagers);
    println!("  Known villages: {}", world.resource::<VillageManager>().len());

    let mut logger = EventLogger::new(&args.events).unwrap_or_else(|e| {
        eprintln!("Warning: Could not open event log {}: {}", args.events.display(), e);
        EventLogger::null()
    });

    let mut driver = Schedule::default();
    driver.add_systems(setup::assign_errands);
    let mut schedule = build_schedule();

    println!();
    println!("Starting simulation...");
    println!();

    let save_interval = config.simulation.save_interval.max(1);
    let mut status = ExitCode::SUCCESS;
    for _ in 0..config.simulation.ticks {
        world.resource_mut::<SimClock>().advance();
        let tick = world.resource::<SimClock>().tick;

        driver.run(&mut world);
        schedule.run(&mut world);

        let events = world.resource_mut::<TickEvents>().drain();
        if let Err(e) = logger.log_batch(&events) {
            eprintln!("Warning: Could not write events at tick {}: {}", tick, e);
        }
        world.resource_mut::<Outbox>().drain();

        if let Some((agent, error)) = world.resource::<NavigationFaults>().first() {
            eprintln!("Error: Navigation for villager {} failed at tick {}: {}", agent, tick, error);
            status = ExitCode::FAILURE;
            break;
        }

        if tick % save_interval == 0 {
            save_registry(&mut world, &args.save);
        }

        if tick % 600 == 0 {
            print_progress(&mut world, tick, config.simulation.ticks);
        }
    }

    save_registry(&mut world, &args.save);
    if let Err(e) = logger.flush() {
        eprintln!("Warning: Could not flush event log: {}", e);
    }

    let final_tick = world.resource::<SimClock>().tick;
    println!();
    println!(
        "Simulation complete. Ran {} ticks, logged {} events.",
        final_tick,
        logger.event_count()
    );
    for (kind, count) in logger.tally() {
        println!("  {}: {}", kind, count);
    }
    print_progress(&mut world, final_tick, config.simulation.ticks);
    status
}

/// Write the registry if anything changed since the last save
fn save_registry(world: &mut World, path: &Path) {
    let mut villages = world.resource_mut::<VillageManager>();
    if !villages.is_dirty() {
        return;
    }
    if let Err(e) = villages.save(path) {
        eprintln!("Warning: Could not save villages to {}: {}", path.display(), e);
    }
}

fn print_progress(world: &mut World, tick: u64, total: u64) {
    let (housed, settled, total_villagers) = {
        let mut query = world.query::<&ResidencyData>();
        query.iter(world).fold((0, 0, 0), |(housed, settled, total), data| {
            (
                housed + data.building.is_some() as usize,
                settled + data.village.is_some() as usize,
                total + 1,
            )
        })
    };
    let villages = world.resource::<VillageManager>();
    let populations: Vec<String> = villages
        .villages()
        .map(|v| format!("{} ({})", v.name, v.population()))
        .collect();
    println!(
        "Tick {} / {}: {}/{} villagers housed, {} settled | {}",
        tick,
        total,
        housed,
        total_villagers,
        settled,
        populations.join(", ")
    );
}
