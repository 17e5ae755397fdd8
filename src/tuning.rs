//! Data-driven game balance
//!
//! Every gameplay constant lives here so balance changes are data edits, not
//! code edits. `Tuning::default()` matches the shipped values; a full struct
//! can also be deserialized from JSON.

use serde::{Deserialize, Serialize};

/// One rung of the difficulty ladder: the widest tier a spawn draw may pick
/// once both score requirements are met. Rows are evaluated top-down and the
/// first match wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DifficultyStep {
    /// Minimum score for this rung
    pub min_score: f32,
    /// Minimum special score for this rung (0 when unused)
    pub min_special_score: f32,
    /// Inclusive upper bound of the spawn tier draw
    pub max_tier: usize,
}

/// Maps a contiguous span of pool slot indices onto one tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierSpan {
    /// First slot index (inclusive)
    pub first: usize,
    /// Last slot index (inclusive)
    pub last: usize,
    /// Tier the span belongs to
    pub tier: usize,
}

/// All balance values for the simulation core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Playable sphere radius; every entity stays glued to this surface
    pub sphere_radius: f32,
    /// How far from its current spot a creature may pick a wander target
    pub wander_radius: f32,
    /// Distance at which a roaming creature counts as arrived
    pub arrival_threshold: f32,
    /// Creature surface speed, units per second
    pub move_speed: f32,
    /// Creature facing turn rate, degrees per second
    pub turn_speed_deg: f32,
    /// Seconds between creature spawn attempts
    pub spawn_interval: f32,
    /// Creature pool size and simultaneous-active cap
    pub max_creatures: usize,
    /// Weapon pool size and simultaneous-active cap
    pub max_weapons: usize,
    /// Radius of a placed weapon's creature scan
    pub detection_radius: f32,
    /// Most creatures one scan tick may catch
    pub max_scan_results: usize,
    /// How long the detonation particle effect plays, seconds
    pub particle_duration: f32,
    /// Hard bound on the detonation wait, seconds
    pub detonation_timeout: f32,
    /// Difficulty ladder, widest rung first
    pub difficulty: Vec<DifficultyStep>,
    /// Slot-index to tier assignment for the creature pool
    pub tier_table: Vec<TierSpan>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            sphere_radius: 15.0,
            wander_radius: 8.0,
            arrival_threshold: 0.5,
            move_speed: 1.0,
            turn_speed_deg: 180.0,
            spawn_interval: 0.5,
            max_creatures: 100,
            max_weapons: 100,
            detection_radius: 2.0,
            max_scan_results: 50,
            particle_duration: 1.5,
            detonation_timeout: 5.0,
            difficulty: vec![
                DifficultyStep { min_score: 80.0, min_special_score: 20.0, max_tier: 8 },
                DifficultyStep { min_score: 70.0, min_special_score: 10.0, max_tier: 7 },
                DifficultyStep { min_score: 60.0, min_special_score: 0.0, max_tier: 6 },
                DifficultyStep { min_score: 50.0, min_special_score: 0.0, max_tier: 5 },
                DifficultyStep { min_score: 40.0, min_special_score: 0.0, max_tier: 4 },
                DifficultyStep { min_score: 30.0, min_special_score: 0.0, max_tier: 3 },
                DifficultyStep { min_score: 20.0, min_special_score: 0.0, max_tier: 2 },
                DifficultyStep { min_score: 10.0, min_special_score: 0.0, max_tier: 1 },
            ],
            // The bulk of the population is tier 0; the top eight slots are
            // each their own exclusive rarity tier.
            tier_table: vec![
                TierSpan { first: 0, last: 91, tier: 0 },
                TierSpan { first: 92, last: 92, tier: 1 },
                TierSpan { first: 93, last: 93, tier: 2 },
                TierSpan { first: 94, last: 94, tier: 3 },
                TierSpan { first: 95, last: 95, tier: 4 },
                TierSpan { first: 96, last: 96, tier: 5 },
                TierSpan { first: 97, last: 97, tier: 6 },
                TierSpan { first: 98, last: 98, tier: 7 },
                TierSpan { first: 99, last: 99, tier: 8 },
            ],
        }
    }
}

impl Tuning {
    /// Tier assigned to a creature pool slot. Slots not covered by the table
    /// fall back to tier 0.
    pub fn tier_of_slot(&self, slot: usize) -> usize {
        self.tier_table
            .iter()
            .find(|span| slot >= span.first && slot <= span.last)
            .map(|span| span.tier)
            .unwrap_or(0)
    }

    /// Number of tiers the table defines.
    pub fn tier_count(&self) -> usize {
        self.tier_table
            .iter()
            .map(|span| span.tier + 1)
            .max()
            .unwrap_or(1)
    }

    /// Inclusive upper bound of the spawn tier draw for the given scores.
    /// First matching ladder rung wins; below every rung the draw is pinned
    /// to tier 0.
    pub fn max_spawn_tier(&self, score: f32, special_score: f32) -> usize {
        self.difficulty
            .iter()
            .find(|step| score >= step.min_score && special_score >= step.min_special_score)
            .map(|step| step.max_tier)
            .unwrap_or(0)
    }

    /// Creature facing turn rate in radians per second.
    pub fn turn_speed_rad(&self) -> f32 {
        self.turn_speed_deg.to_radians()
    }
}
