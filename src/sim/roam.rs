//! Creature roaming
//!
//! Wandering motion toward randomly chosen surface targets. Targets are
//! picked near the creature's current spot (slerp-blended by wander radius
//! over sphere radius), so the population drifts instead of teleporting
//! across the globe. Runs once per tick per creature slot.

use glam::Vec3;
use rand::Rng;

use crate::sim::sphere::{
    project_onto_sphere, random_unit_vector, slerp_direction, surface_up, tangent_direction,
};
use crate::sim::state::Creature;
use crate::tuning::Tuning;

/// Pick a fresh wander target near the creature's current position and
/// start moving toward it.
pub fn pick_wander_target(
    creature: &mut Creature,
    center: Vec3,
    tuning: &Tuning,
    rng: &mut impl Rng,
) {
    let current_dir = surface_up(creature.pos, center);
    let random_dir = random_unit_vector(rng);
    let blend = tuning.wander_radius / tuning.sphere_radius;
    let target_dir = slerp_direction(current_dir, random_dir, blend);
    creature.target = center + target_dir * tuning.sphere_radius;
    creature.moving = true;
}

/// Advance one creature by one tick.
///
/// The active/collider reconcile runs every tick, not just on change
/// events: a collider knocked out by a detonation scan retires the slot on
/// its next update, and an active slot re-asserts its collider enabled.
/// The `is_active` stream is re-emitted each tick with the current value.
pub fn update(
    creature: &mut Creature,
    center: Vec3,
    dt: f32,
    tuning: &Tuning,
    rng: &mut impl Rng,
) {
    // A disabled collider on a live slot means a blast caught it.
    if creature.active && !creature.collider_enabled {
        creature.deactivate();
        return;
    }

    // Per-tick reconcile; closes the one-frame window where a disabled
    // collider could re-enter collision queries on a slot still flagged
    // inactive, or the reverse.
    creature.collider_enabled = creature.active;
    creature.is_active.set(creature.active);

    if !creature.active {
        return;
    }

    let distance = creature.pos.distance(creature.target);
    if distance <= tuning.arrival_threshold {
        // Arrived: stop and immediately pick the next target, no idle gap.
        creature.moving = false;
        pick_wander_target(creature, center, tuning, rng);
        return;
    }

    let direction = tangent_direction(creature.pos, creature.target, center);
    if direction == Vec3::ZERO {
        // Radially aligned with the target; counts as arrived.
        creature.moving = false;
        pick_wander_target(creature, center, tuning, rng);
        return;
    }

    // Advance along the tangent, then correct numerical drift back onto
    // the surface.
    let stepped = creature.pos + direction * tuning.move_speed * dt;
    creature.pos = project_onto_sphere(stepped, center, tuning.sphere_radius);
    creature.up = surface_up(creature.pos, center);

    let turn = (tuning.turn_speed_rad() * dt).min(1.0);
    creature.facing = slerp_direction(creature.facing, direction, turn);
}
