//! Creature spawn scheduling
//!
//! A frame-ticked timer that, every interval, widens its tier draw by the
//! difficulty ladder, pulls one inactive creature from that tier, and drops
//! it at a random point on the sphere surface. Weapons have no scheduler;
//! the placement flow pulls them on demand.

use glam::Vec3;
use log::debug;
use rand::Rng;

use crate::sim::pool::Pool;
use crate::sim::roam;
use crate::sim::sphere::{random_unit_vector, surface_up};
use crate::sim::state::{Creature, GameData};
use crate::tuning::Tuning;

/// Interval-gated spawn timer.
#[derive(Debug, Default)]
pub struct SpawnScheduler {
    elapsed: f32,
}

impl SpawnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the timer and maybe spawn one creature. Returns the slot
    /// spawned this tick, if any. Only runs while the session timer runs.
    pub fn tick(
        &mut self,
        dt: f32,
        data: &GameData,
        pool: &mut Pool<Creature>,
        center: Vec3,
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) -> Option<usize> {
        if !data.running_timer() {
            return None;
        }

        self.elapsed += dt;
        if self.elapsed <= tuning.spawn_interval {
            return None;
        }
        self.elapsed = 0.0;

        if pool.has_reached_max(tuning.max_creatures) {
            return None;
        }

        let tier = draw_tier(data, tuning, rng);

        // Tier exhausted: skip this attempt, never fall back to another tier.
        let slot = pool.acquire(tier)?;

        let pos = center + random_unit_vector(rng) * tuning.sphere_radius;
        let up = surface_up(pos, center);
        let creature = pool.get_mut(slot)?;
        creature.activate_at(pos, up);
        roam::pick_wander_target(creature, center, tuning, rng);

        debug!("spawned creature {} (tier {tier})", creature.id);
        Some(slot)
    }
}

/// Draw a spawn tier for the current scores: uniform over `0..=upper` where
/// `upper` comes from the difficulty ladder. Below the first rung the draw
/// is pinned to tier 0 without consuming randomness.
pub fn draw_tier(data: &GameData, tuning: &Tuning, rng: &mut impl Rng) -> usize {
    let upper = tuning.max_spawn_tier(data.score(), data.special_score());
    if upper == 0 {
        0
    } else {
        rng.random_range(0..=upper)
    }
}
