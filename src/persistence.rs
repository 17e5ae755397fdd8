//! Key/value save gateway for score and unlock state.
//!
//! The simulation only ever round-trips scalar primitives: two scores and
//! nine unlock flags. Absent keys resolve to defaults (scores 0, flags
//! false except the base variant at index 0, which ships unlocked).

use std::collections::HashMap;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::RARITY_FLAG_COUNT;

const SCORE_KEY: &str = "planet_pop_score";
const SPECIAL_SCORE_KEY: &str = "planet_pop_special_score";

fn flag_key(index: usize) -> String {
    format!("planet_pop_rarity_flag_{index}")
}

/// Gateway failure. The simulation logs these and continues; it never
/// retries and never aborts a tick over one.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unlock flag index {0} out of range")]
    FlagIndexOutOfRange(usize),
    #[error("persistence backend error: {0}")]
    Backend(String),
}

/// Port to whatever stores the player's progress.
pub trait PersistenceGateway {
    fn fetch_score(&self) -> Result<f32, PersistenceError>;
    fn save_score(&mut self, value: f32) -> Result<(), PersistenceError>;

    fn fetch_special_score(&self) -> Result<f32, PersistenceError>;
    fn save_special_score(&mut self, value: f32) -> Result<(), PersistenceError>;

    fn fetch_unlock_flag(&self, index: usize) -> Result<bool, PersistenceError>;
    fn save_unlock_flag(&mut self, index: usize, value: bool) -> Result<(), PersistenceError>;
}

/// Scalar value as stored. Kept as an enum so a snapshot serializes without
/// structural encoding beyond key/value pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Float(f32),
    Bool(bool),
}

/// In-memory key/value store. The bundled gateway for tests and the demo
/// binary; a platform build would swap in its own backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, Scalar>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the whole store for inspection or a save-file dump.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.values).unwrap_or_else(|_| "{}".to_owned())
    }

    /// Restore a previously dumped store. Unknown keys are kept as-is.
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let values: HashMap<String, Scalar> =
            serde_json::from_str(json).map_err(|e| PersistenceError::Backend(e.to_string()))?;
        info!("restored {} persisted values", values.len());
        Ok(Self { values })
    }

    fn float(&self, key: &str, default: f32) -> f32 {
        match self.values.get(key) {
            Some(Scalar::Float(v)) => *v,
            _ => default,
        }
    }

    fn bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(Scalar::Bool(v)) => *v,
            _ => default,
        }
    }
}

fn check_flag_index(index: usize) -> Result<(), PersistenceError> {
    if index >= RARITY_FLAG_COUNT {
        return Err(PersistenceError::FlagIndexOutOfRange(index));
    }
    Ok(())
}

impl PersistenceGateway for MemoryStore {
    fn fetch_score(&self) -> Result<f32, PersistenceError> {
        Ok(self.float(SCORE_KEY, 0.0))
    }

    fn save_score(&mut self, value: f32) -> Result<(), PersistenceError> {
        self.values.insert(SCORE_KEY.to_owned(), Scalar::Float(value));
        Ok(())
    }

    fn fetch_special_score(&self) -> Result<f32, PersistenceError> {
        Ok(self.float(SPECIAL_SCORE_KEY, 0.0))
    }

    fn save_special_score(&mut self, value: f32) -> Result<(), PersistenceError> {
        self.values
            .insert(SPECIAL_SCORE_KEY.to_owned(), Scalar::Float(value));
        Ok(())
    }

    fn fetch_unlock_flag(&self, index: usize) -> Result<bool, PersistenceError> {
        check_flag_index(index)?;
        // The base variant ships unlocked
        Ok(self.bool(&flag_key(index), index == 0))
    }

    fn save_unlock_flag(&mut self, index: usize, value: bool) -> Result<(), PersistenceError> {
        check_flag_index(index)?;
        self.values.insert(flag_key(index), Scalar::Bool(value));
        Ok(())
    }
}
