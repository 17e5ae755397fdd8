//! Fixed timestep simulation tick
//!
//! `World` owns the whole core: tuning, RNG, pools, scheduler, shared game
//! data, the player's input signals, and the injected ports. One `tick`
//! call advances everything a single frame; all updates run synchronously
//! on the calling thread.

use glam::Vec3;
use log::warn;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use thiserror::Error;

use crate::audio::AudioService;
use crate::consts::RARITY_FLAG_COUNT;
use crate::leaderboard::LeaderboardGateway;
use crate::master::{CreatureDef, MasterTable, WeaponDef};
use crate::persistence::PersistenceGateway;
use crate::sim::pool::{Pool, build_creature_pool, build_weapon_pool};
use crate::sim::spawn::SpawnScheduler;
use crate::sim::state::{Creature, GameData, PlayerInput, Weapon};
use crate::sim::weapon::PlacementFlow;
use crate::sim::{roam, weapon};
use crate::tuning::Tuning;

/// Startup failure. Anything here aborts scene setup; nothing mid-session
/// ever produces one.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("creature pool built empty; master table unusable")]
    EmptyCreaturePool,
    #[error("weapon pool built empty; master table unusable")]
    EmptyWeaponPool,
}

/// The complete simulation core.
pub struct World {
    pub tuning: Tuning,
    pub data: GameData,
    pub input: PlayerInput,
    pub creatures: Pool<Creature>,
    pub weapons: Pool<Weapon>,
    scheduler: SpawnScheduler,
    flow: PlacementFlow,
    rng: Pcg32,
    center: Vec3,
    time_ticks: u64,
    persistence: Box<dyn PersistenceGateway>,
    leaderboard: Box<dyn LeaderboardGateway>,
    audio: Box<dyn AudioService>,
}

impl World {
    /// Build the world from initialized master tables and injected ports.
    /// Pools are fully pre-instantiated here; nothing is allocated per
    /// spawn afterwards.
    pub fn new(
        seed: u64,
        tuning: Tuning,
        creature_table: &MasterTable<CreatureDef>,
        weapon_table: &MasterTable<WeaponDef>,
        persistence: Box<dyn PersistenceGateway>,
        leaderboard: Box<dyn LeaderboardGateway>,
        audio: Box<dyn AudioService>,
    ) -> Result<Self, WorldError> {
        let creatures = build_creature_pool(creature_table, &tuning);
        if creatures.is_empty() {
            return Err(WorldError::EmptyCreaturePool);
        }
        let weapons = build_weapon_pool(weapon_table, &tuning);
        if weapons.is_empty() {
            return Err(WorldError::EmptyWeaponPool);
        }

        Ok(Self {
            tuning,
            data: GameData::new(),
            input: PlayerInput::default(),
            creatures,
            weapons,
            scheduler: SpawnScheduler::new(),
            flow: PlacementFlow::new(),
            rng: Pcg32::seed_from_u64(seed),
            center: Vec3::ZERO,
            time_ticks: 0,
            persistence,
            leaderboard,
            audio,
        })
    }

    /// Hydrate scores and the rarity catalogue from the persistence port.
    /// Fetch failures fall back to defaults with a log line; they never
    /// abort startup.
    pub fn load_saved(&mut self) {
        match self.persistence.fetch_score() {
            Ok(score) => self.data.set_score(score),
            Err(e) => warn!("score fetch failed, defaulting to 0: {e}"),
        }
        match self.persistence.fetch_special_score() {
            Ok(score) => self.data.set_special_score(score),
            Err(e) => warn!("special score fetch failed, defaulting to 0: {e}"),
        }
        for index in 0..RARITY_FLAG_COUNT {
            match self.persistence.fetch_unlock_flag(index) {
                Ok(true) => {
                    let _ = self.data.unlock_rarity(index);
                }
                Ok(false) => {}
                Err(e) => warn!("rarity flag {index} fetch failed, defaulting: {e}"),
            }
        }
    }

    /// Advance the simulation by one fixed timestep.
    pub fn tick(&mut self, dt: f32) {
        self.time_ticks += 1;

        let _ = self.scheduler.tick(
            dt,
            &self.data,
            &mut self.creatures,
            self.center,
            &self.tuning,
            &mut self.rng,
        );

        for creature in self.creatures.slots_mut() {
            roam::update(creature, self.center, dt, &self.tuning, &mut self.rng);
        }

        self.flow.process(
            &mut self.input,
            &mut self.weapons,
            &self.data,
            self.center,
            &self.tuning,
        );

        let Self {
            weapons,
            creatures,
            data,
            persistence,
            leaderboard,
            audio,
            tuning,
            ..
        } = self;
        for slot in weapons.slots_mut() {
            weapon::update(
                slot,
                creatures.slots_mut(),
                data,
                persistence.as_mut(),
                leaderboard.as_mut(),
                audio.as_mut(),
                tuning,
                dt,
            );
        }
    }

    /// Ticks advanced since construction.
    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// World center the sphere surface wraps.
    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn active_creature_count(&self) -> usize {
        self.creatures.active_count()
    }

    pub fn active_weapon_count(&self) -> usize {
        self.weapons.active_count()
    }

    pub fn has_reached_max_creatures(&self) -> bool {
        self.creatures.has_reached_max(self.tuning.max_creatures)
    }

    pub fn has_reached_max_weapons(&self) -> bool {
        self.weapons.has_reached_max(self.tuning.max_weapons)
    }

    /// Weapons currently armed on the surface.
    pub fn placed_weapon_count(&self) -> usize {
        self.weapons
            .slots()
            .iter()
            .filter(|w| w.is_placed.get())
            .count()
    }

    /// Weapon slot the player is previewing, if any.
    pub fn previewing_slot(&self) -> Option<usize> {
        self.flow.current()
    }
}
