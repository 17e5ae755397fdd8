//! Shared simulation state and entity types
//!
//! Everything UI bindings observe lives here: scores, session flags, the
//! rarity catalogue, per-entity activity, and the player's placement input
//! signals. Entities are plain structs; controllers in `roam`/`weapon` are
//! free functions invoked once per tick.

use glam::Vec3;

use crate::consts::RARITY_FLAG_COUNT;
use crate::master::{CreatureDef, WeaponDef};
use crate::observable::Observable;

/// Score, session flags, and the nine-entry rarity catalogue.
///
/// Scores are clamped to `[0, +inf)` on every write. Rarity flags are
/// monotonic for the session: once true they never revert.
#[derive(Debug)]
pub struct GameData {
    score: Observable<f32>,
    special_score: Observable<f32>,
    counting_down: Observable<bool>,
    running_timer: Observable<bool>,
    rarity_flags: [bool; RARITY_FLAG_COUNT],
}

impl Default for GameData {
    fn default() -> Self {
        Self::new()
    }
}

impl GameData {
    pub fn new() -> Self {
        Self {
            score: Observable::new(0.0),
            special_score: Observable::new(0.0),
            counting_down: Observable::new(false),
            running_timer: Observable::new(false),
            rarity_flags: [false; RARITY_FLAG_COUNT],
        }
    }

    pub fn score(&self) -> f32 {
        self.score.get()
    }

    pub fn special_score(&self) -> f32 {
        self.special_score.get()
    }

    pub fn counting_down(&self) -> bool {
        self.counting_down.get()
    }

    pub fn running_timer(&self) -> bool {
        self.running_timer.get()
    }

    /// Observable score stream for UI bindings.
    pub fn score_observable(&mut self) -> &mut Observable<f32> {
        &mut self.score
    }

    /// Observable special-score stream for UI bindings.
    pub fn special_score_observable(&mut self) -> &mut Observable<f32> {
        &mut self.special_score
    }

    pub fn set_score(&mut self, value: f32) {
        self.score.set(value.max(0.0));
    }

    pub fn set_special_score(&mut self, value: f32) {
        self.special_score.set(value.max(0.0));
    }

    pub fn set_counting_down(&mut self, state: bool) {
        self.counting_down.set(state);
    }

    pub fn set_running_timer(&mut self, state: bool) {
        self.running_timer.set(state);
    }

    pub fn rarity_flag(&self, index: usize) -> bool {
        self.rarity_flags[index]
    }

    pub fn rarity_flags(&self) -> &[bool; RARITY_FLAG_COUNT] {
        &self.rarity_flags
    }

    /// Set a rarity flag. Idempotent; the catalogue only ever grows within
    /// a session. Returns true when the flag transitioned false -> true,
    /// the only transition persistence cares about.
    pub fn unlock_rarity(&mut self, index: usize) -> bool {
        if self.rarity_flags[index] {
            return false;
        }
        self.rarity_flags[index] = true;
        true
    }
}

/// Detonation particle effect handle. The visual itself is out of scope;
/// the simulation only tracks "still playing" so the detonation wait can
/// resolve when the effect naturally stops.
#[derive(Debug, Default)]
pub struct ParticleEffect {
    playing: bool,
    remaining: f32,
}

impl ParticleEffect {
    pub fn start(&mut self, duration: f32) {
        self.playing = true;
        self.remaining = duration;
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.remaining = 0.0;
    }

    pub fn tick(&mut self, dt: f32) {
        if self.playing {
            self.remaining -= dt;
            if self.remaining <= 0.0 {
                self.stop();
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

/// A pooled creature slot: identity, rarity marker, activity, and its
/// roaming state. Slots are reused for the process lifetime; "spawning"
/// repositions and reactivates one.
#[derive(Debug)]
pub struct Creature {
    /// Stable per-slot id
    pub id: u32,
    /// Master definition id this slot was built from
    pub def_id: String,
    /// Rarity tier the slot belongs to
    pub tier: usize,
    /// Rarity catalogue index carried into detonation scoring, rare kinds only
    pub rarity: Option<usize>,
    /// Whether the slot is live in the world
    pub active: bool,
    /// Collision participation; reconciled against `active` every tick
    pub collider_enabled: bool,
    /// Activity stream for UI bindings, re-emitted every tick
    pub is_active: Observable<bool>,
    /// Position on the sphere surface
    pub pos: Vec3,
    /// Current wander target on the sphere surface
    pub target: Vec3,
    /// Whether a wander target is being pursued
    pub moving: bool,
    /// Surface normal at `pos`
    pub up: Vec3,
    /// Facing direction, slerped toward travel
    pub facing: Vec3,
}

impl Creature {
    pub fn new(id: u32, def: &CreatureDef) -> Self {
        Self {
            id,
            def_id: def.id.clone(),
            tier: def.tier,
            rarity: def.rarity,
            active: false,
            collider_enabled: false,
            is_active: Observable::new(false),
            pos: Vec3::ZERO,
            target: Vec3::ZERO,
            moving: false,
            up: Vec3::Y,
            facing: Vec3::X,
        }
    }

    /// Bring the slot into the world at a surface position.
    pub fn activate_at(&mut self, pos: Vec3, up: Vec3) {
        self.pos = pos;
        self.up = up;
        self.active = true;
        self.collider_enabled = true;
        self.is_active.set(true);
    }

    /// Return the slot to the pool, clearing its roaming state.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.collider_enabled = false;
        self.moving = false;
        self.is_active.set(false);
    }
}

/// Placement phase of a weapon slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeaponPhase {
    /// In the pool, inactive
    #[default]
    Idle,
    /// Held by the player, following the pointer
    Previewing,
    /// Armed on the surface, scanning every tick
    Placed,
    /// Scan hit; waiting for the particle effect to finish
    Detonating,
}

/// A pooled weapon slot and its placement state machine.
#[derive(Debug)]
pub struct Weapon {
    /// Stable per-slot id
    pub id: u32,
    /// Master definition id this slot was built from
    pub def_id: String,
    /// Whether the slot is live in the world
    pub active: bool,
    /// Current placement phase
    pub phase: WeaponPhase,
    /// Activity stream for UI bindings
    pub is_active: Observable<bool>,
    /// Placed stream; persisted-visible
    pub is_placed: Observable<bool>,
    /// Preview stream; transient UI state
    pub is_previewing: Observable<bool>,
    /// Whether the preview tint shows a valid placement
    pub preview_valid: bool,
    /// Position on the sphere surface
    pub pos: Vec3,
    /// Surface normal at `pos`
    pub up: Vec3,
    /// Detonation particle handle
    pub particle: ParticleEffect,
    /// Creatures caught by the triggering scan
    pub score_delta: u32,
    /// Rarity-marked creatures caught by the triggering scan
    pub special_delta: u32,
    /// Rarity indices caught by the triggering scan
    pub pending_rarities: Vec<usize>,
    /// Seconds spent in the detonation wait, for the defensive bound
    pub detonation_elapsed: f32,
}

impl Weapon {
    pub fn new(id: u32, def: &WeaponDef) -> Self {
        Self {
            id,
            def_id: def.id.clone(),
            active: false,
            phase: WeaponPhase::Idle,
            is_active: Observable::new(false),
            is_placed: Observable::new(false),
            is_previewing: Observable::new(false),
            preview_valid: true,
            pos: Vec3::ZERO,
            up: Vec3::Y,
            particle: ParticleEffect::default(),
            score_delta: 0,
            special_delta: 0,
            pending_rarities: Vec::new(),
            detonation_elapsed: 0.0,
        }
    }

    /// Return the slot to the pool, clearing all placement state.
    pub fn recycle(&mut self) {
        self.active = false;
        self.phase = WeaponPhase::Idle;
        self.preview_valid = true;
        self.particle.stop();
        self.score_delta = 0;
        self.special_delta = 0;
        self.pending_rarities.clear();
        self.detonation_elapsed = 0.0;
        self.is_previewing.set(false);
        self.is_placed.set(false);
        self.is_active.set(false);
    }
}

/// Player input signals the placement flow consumes. Written by the input
/// layer, read (and consumed) by the simulation each tick.
#[derive(Debug)]
pub struct PlayerInput {
    /// Pointer position in world space; projected to the surface on use
    pub weapon_position: Observable<Vec3>,
    /// Pointer hover: request a placement preview
    pub is_preview: Observable<bool>,
    /// Confirm signal: commit the previewed placement
    pub is_placed: Observable<bool>,
}

impl Default for PlayerInput {
    fn default() -> Self {
        Self {
            weapon_position: Observable::new(Vec3::ZERO),
            is_preview: Observable::new(false),
            is_placed: Observable::new(false),
        }
    }
}
