//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable pool iteration order
//! - No rendering or platform dependencies; platform concerns enter
//!   through the injected ports on `World`

pub mod pool;
pub mod roam;
pub mod spawn;
pub mod sphere;
pub mod state;
pub mod tick;
pub mod weapon;

pub use pool::{Pool, Pooled, build_creature_pool, build_weapon_pool};
pub use spawn::SpawnScheduler;
pub use sphere::{project_onto_sphere, surface_up, tangent_direction};
pub use state::{Creature, GameData, ParticleEffect, PlayerInput, Weapon, WeaponPhase};
pub use tick::{World, WorldError};
pub use weapon::PlacementFlow;
