//! Master-data definitions and id-indexed lookup tables.
//!
//! Tables must be initialized before lookups; calling `find_by_id` on an
//! uninitialized table is a precondition violation and panics. A missing id
//! after initialization is an expected condition and returns `None`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::RARITY_FLAG_COUNT;

/// Failure while building a master table. Fatal at scene startup.
#[derive(Debug, Error)]
pub enum MasterError {
    #[error("master table `{0}` is empty or missing")]
    EmptyTable(&'static str),
    #[error("master table has duplicate id `{0}`")]
    DuplicateId(String),
    #[error("master table asset failed to parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Record stored in a master table.
pub trait MasterRecord {
    fn id(&self) -> &str;
}

/// Creature definition: which tier its pool slots belong to, and the rarity
/// catalogue index it carries into detonation scoring (rare tiers only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatureDef {
    pub id: String,
    pub tier: usize,
    pub rarity: Option<usize>,
}

impl MasterRecord for CreatureDef {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Weapon definition. One kind ships today; the id keeps the lookup path
/// uniform with creatures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponDef {
    pub id: String,
}

impl MasterRecord for WeaponDef {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Fixed master-data table with an id index built by [`MasterTable::initialize`].
#[derive(Debug)]
pub struct MasterTable<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
    initialized: bool,
}

impl<T: MasterRecord> MasterTable<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            index: HashMap::new(),
            initialized: false,
        }
    }

    /// Build the id index. Idempotent. Duplicate ids are a build-time fault.
    pub fn initialize(&mut self) -> Result<(), MasterError> {
        if self.initialized {
            return Ok(());
        }
        let mut index = HashMap::with_capacity(self.items.len());
        for (i, item) in self.items.iter().enumerate() {
            if index.insert(item.id().to_owned(), i).is_some() {
                return Err(MasterError::DuplicateId(item.id().to_owned()));
            }
        }
        self.index = index;
        self.initialized = true;
        Ok(())
    }

    /// Look up a record by id.
    ///
    /// # Panics
    /// Panics if the table has not been initialized; initialize-before-use
    /// is a hard precondition, not a soft no-op.
    pub fn find_by_id(&self, id: &str) -> Option<&T> {
        assert!(
            self.initialized,
            "master table not initialized; call initialize() first"
        );
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }
}

/// Load a creature table from a JSON asset. A load or parse failure here
/// aborts startup.
pub fn load_creature_table(json: &str) -> Result<MasterTable<CreatureDef>, MasterError> {
    let items: Vec<CreatureDef> = serde_json::from_str(json)?;
    if items.is_empty() {
        return Err(MasterError::EmptyTable("creatures"));
    }
    let mut table = MasterTable::new(items);
    table.initialize()?;
    Ok(table)
}

/// Load a weapon table from a JSON asset.
pub fn load_weapon_table(json: &str) -> Result<MasterTable<WeaponDef>, MasterError> {
    let items: Vec<WeaponDef> = serde_json::from_str(json)?;
    if items.is_empty() {
        return Err(MasterError::EmptyTable("weapons"));
    }
    let mut table = MasterTable::new(items);
    table.initialize()?;
    Ok(table)
}

/// The shipped creature catalogue: one common kind plus eight rare kinds,
/// each rare kind carrying its rarity catalogue index. Index 0 is the base
/// variant, unlocked from the start, so the common kind carries no marker.
pub fn builtin_creature_table() -> MasterTable<CreatureDef> {
    let items = (0..RARITY_FLAG_COUNT)
        .map(|tier| CreatureDef {
            id: format!("creature_{tier}"),
            tier,
            rarity: (tier > 0).then_some(tier),
        })
        .collect();
    let mut table = MasterTable::new(items);
    table
        .initialize()
        .expect("builtin creature ids are distinct");
    table
}

/// The shipped weapon catalogue.
pub fn builtin_weapon_table() -> MasterTable<WeaponDef> {
    let mut table = MasterTable::new(vec![WeaponDef {
        id: "weapon_0".to_owned(),
    }]);
    table.initialize().expect("builtin weapon ids are distinct");
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "not initialized")]
    fn test_lookup_before_initialize_panics() {
        let table = MasterTable::new(vec![WeaponDef {
            id: "weapon_0".to_owned(),
        }]);
        let _ = table.find_by_id("weapon_0");
    }

    #[test]
    fn test_lookup_miss_returns_none() {
        let table = builtin_creature_table();
        assert!(table.find_by_id("creature_0").is_some());
        assert!(table.find_by_id("creature_99").is_none());
    }

    #[test]
    fn test_builtin_rarity_mapping() {
        let table = builtin_creature_table();
        assert_eq!(table.len(), 9);
        assert_eq!(table.find_by_id("creature_0").unwrap().rarity, None);
        for tier in 1..9 {
            let def = table.find_by_id(&format!("creature_{tier}")).unwrap();
            assert_eq!(def.rarity, Some(tier));
            assert_eq!(def.tier, tier);
        }
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut table = MasterTable::new(vec![
            WeaponDef { id: "weapon_0".to_owned() },
            WeaponDef { id: "weapon_0".to_owned() },
        ]);
        assert!(matches!(
            table.initialize(),
            Err(MasterError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_empty_asset_is_fatal() {
        assert!(matches!(
            load_creature_table("[]"),
            Err(MasterError::EmptyTable(_))
        ));
        assert!(load_creature_table("not json").is_err());
    }

    #[test]
    fn test_json_table_load() {
        let json = r#"[
            {"id": "creature_0", "tier": 0, "rarity": null},
            {"id": "creature_1", "tier": 1, "rarity": 1}
        ]"#;
        let table = load_creature_table(json).unwrap();
        assert_eq!(table.find_by_id("creature_1").unwrap().rarity, Some(1));
    }
}
