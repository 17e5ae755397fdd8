//! Planet Pop headless demo
//!
//! Runs the simulation core at the fixed timestep with scripted input:
//! the session timer starts, creatures spawn and roam, and a bomb is
//! previewed and placed at a random surface point every couple of seconds.
//! Progress goes to the log; the end-of-run report prints score and the
//! unlocked rarity catalogue.

use glam::Vec3;
use log::info;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use planet_pop::audio::NullAudio;
use planet_pop::consts::SIM_DT;
use planet_pop::leaderboard::LocalLeaderboard;
use planet_pop::master::{builtin_creature_table, builtin_weapon_table};
use planet_pop::persistence::MemoryStore;
use planet_pop::sim::sphere::random_unit_vector;
use planet_pop::{Tuning, World, WorldError};

/// Simulated run length in seconds
const RUN_SECONDS: f32 = 180.0;
/// Seconds between scripted bomb placements
const PLACEMENT_PERIOD: f32 = 2.0;
/// Seconds between progress log lines
const REPORT_PERIOD: f32 = 15.0;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("startup failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), WorldError> {
    let creature_table = builtin_creature_table();
    let weapon_table = builtin_weapon_table();

    let mut world = World::new(
        0xB0B5,
        Tuning::default(),
        &creature_table,
        &weapon_table,
        Box::new(MemoryStore::new()),
        Box::new(LocalLeaderboard::new()),
        Box::new(NullAudio),
    )?;
    world.load_saved();
    world.data.set_running_timer(true);

    // Input script RNG, separate from the simulation's own stream
    let mut rng = Pcg32::seed_from_u64(0x5EED);
    let radius = world.tuning.sphere_radius;

    let total_ticks = (RUN_SECONDS / SIM_DT) as u64;
    let placement_ticks = (PLACEMENT_PERIOD / SIM_DT) as u64;
    let report_ticks = (REPORT_PERIOD / SIM_DT) as u64;

    info!("running {RUN_SECONDS}s at {:.0} Hz", 1.0 / SIM_DT);

    for tick in 0..total_ticks {
        // Hover a bomb over a random surface point, confirm next tick
        if tick % placement_ticks == 0 {
            let aim: Vec3 = random_unit_vector(&mut rng) * radius * 2.0;
            world.input.weapon_position.set(aim);
            world.input.is_preview.set(true);
        } else if tick % placement_ticks == 1 {
            world.input.is_placed.set(true);
        }

        world.tick(SIM_DT);

        if tick % report_ticks == 0 {
            info!(
                "t={:>5.1}s score={:>5.0} special={:>3.0} creatures={:>3} placed={:>2}",
                tick as f32 * SIM_DT,
                world.data.score(),
                world.data.special_score(),
                world.active_creature_count(),
                world.placed_weapon_count(),
            );
        }
    }

    println!("final score:         {:.0}", world.data.score());
    println!("final special score: {:.0}", world.data.special_score());
    let unlocked: Vec<usize> = world
        .data
        .rarity_flags()
        .iter()
        .enumerate()
        .filter_map(|(i, &set)| set.then_some(i))
        .collect();
    println!("rarity catalogue:    {unlocked:?}");
    println!("creatures roaming:   {}", world.active_creature_count());

    Ok(())
}
