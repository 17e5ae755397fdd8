//! Fixed-capacity entity pools partitioned into tiers
//!
//! Every entity is built once at pool construction and reused for the
//! process lifetime. Acquiring scans a tier's slots for the first inactive
//! one; an exhausted tier yields `None`, which is an expected "skip this
//! spawn" signal and never an error.

use log::warn;

use crate::master::{CreatureDef, MasterTable, WeaponDef};
use crate::sim::state::{Creature, Weapon};
use crate::tuning::Tuning;

/// Entity that can live in a [`Pool`].
pub trait Pooled {
    fn is_active(&self) -> bool;
}

impl Pooled for Creature {
    fn is_active(&self) -> bool {
        self.active
    }
}

impl Pooled for Weapon {
    fn is_active(&self) -> bool {
        self.active
    }
}

/// Fixed set of pre-built entities grouped into tiers. Tier lists hold slot
/// indices and never grow after construction.
#[derive(Debug)]
pub struct Pool<T> {
    slots: Vec<T>,
    tiers: Vec<Vec<usize>>,
}

impl<T: Pooled> Pool<T> {
    /// First inactive slot in a tier, if any. Never falls back to another
    /// tier; an exhausted tier means this draw is skipped.
    pub fn acquire(&self, tier: usize) -> Option<usize> {
        self.tiers.get(tier)?.iter().copied().find(|&slot| !self.slots[slot].is_active())
    }

    /// Number of slots assigned to a tier.
    pub fn tier_len(&self, tier: usize) -> usize {
        self.tiers.get(tier).map(Vec::len).unwrap_or(0)
    }

    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Active slots across all tiers.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_active()).count()
    }

    /// Active slots within one tier.
    pub fn active_count_in_tier(&self, tier: usize) -> usize {
        self.tiers
            .get(tier)
            .map(|list| list.iter().filter(|&&slot| self.slots[slot].is_active()).count())
            .unwrap_or(0)
    }

    /// Whether the pool has hit its simultaneous-active cap.
    pub fn has_reached_max(&self, max: usize) -> bool {
        self.active_count() >= max
    }

    pub fn get(&self, slot: usize) -> Option<&T> {
        self.slots.get(slot)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.slots.get_mut(slot)
    }

    pub fn slots(&self) -> &[T] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [T] {
        &mut self.slots
    }
}

/// Build the creature pool: one slot per index in the tuning's tier table,
/// each wired to its tier's master definition. A missing definition skips
/// that slot with a log line; everything else keeps building.
pub fn build_creature_pool(table: &MasterTable<CreatureDef>, tuning: &Tuning) -> Pool<Creature> {
    let mut slots = Vec::with_capacity(tuning.max_creatures);
    let mut tiers = vec![Vec::new(); tuning.tier_count()];

    for i in 0..tuning.max_creatures {
        let tier = tuning.tier_of_slot(i);
        let def_id = format!("creature_{tier}");
        let Some(def) = table.find_by_id(&def_id) else {
            warn!("creature definition `{def_id}` missing; slot {i} skipped");
            continue;
        };
        let slot = slots.len();
        slots.push(Creature::new(i as u32, def));
        tiers[tier].push(slot);
    }

    Pool { slots, tiers }
}

/// Build the weapon pool: one kind, one flat tier.
pub fn build_weapon_pool(table: &MasterTable<WeaponDef>, tuning: &Tuning) -> Pool<Weapon> {
    let mut slots = Vec::with_capacity(tuning.max_weapons);

    for i in 0..tuning.max_weapons {
        let def_id = "weapon_0";
        let Some(def) = table.find_by_id(def_id) else {
            warn!("weapon definition `{def_id}` missing; slot {i} skipped");
            continue;
        };
        slots.push(Weapon::new(i as u32, def));
    }

    let tiers = vec![(0..slots.len()).collect()];
    Pool { slots, tiers }
}
