//! Progress and settings persistence
//!
//! The simulation never touches storage. A [`ProgressStore`] is injected into the
//! session and handed whole records; stores only move JSON text in and out:
//! - [`MemoryStore`]: in-process, shared between clones (tests, headless runs)
//! - [`JsonFileStore`]: one JSON file per record (native)
//! - [`LocalStorageStore`]: browser LocalStorage (wasm)

#[cfg(not(target_arch = "wasm32"))]
mod file;
#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(not(target_arch = "wasm32"))]
pub use file::JsonFileStore;
#[cfg(target_arch = "wasm32")]
pub use web::LocalStorageStore;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::Settings;
use crate::sim::attribute::AttributeKind;
use crate::sim::stats::StatLevels;

/// Record key for player progress
pub const PROGRESS_KEY: &str = "cube_survivor_progress";
/// Record key for settings
pub const SETTINGS_KEY: &str = "cube_survivor_settings";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("record is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// An unlocked cube variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeRecord {
    pub cube_id: String,
    pub level: u32,
    pub attribute: AttributeKind,
    pub unlocked: bool,
}

/// Everything about the player that outlives a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionSnapshot {
    pub stat_levels: StatLevels,
    pub attribute: AttributeKind,
    pub gold: u64,
    /// Total running time across all sessions, in seconds
    pub play_time: f32,
    pub total_kills: u64,
    pub highest_wave: u32,
    pub best_level: u32,
    pub unlocked_cubes: Vec<CubeRecord>,
}

impl Default for ProgressionSnapshot {
    fn default() -> Self {
        Self {
            stat_levels: StatLevels::default(),
            attribute: AttributeKind::None,
            gold: 0,
            play_time: 0.0,
            total_kills: 0,
            highest_wave: 0,
            best_level: 1,
            unlocked_cubes: Vec::new(),
        }
    }
}

impl ProgressionSnapshot {
    /// Record a newly unlocked cube. Returns false if it was already unlocked.
    pub fn unlock_cube(&mut self, cube_id: &str, attribute: AttributeKind) -> bool {
        if self.unlocked_cubes.iter().any(|c| c.cube_id == cube_id) {
            return false;
        }
        self.unlocked_cubes.push(CubeRecord {
            cube_id: cube_id.to_string(),
            level: 1,
            attribute,
            unlocked: true,
        });
        true
    }
}

/// Persistence collaborator
///
/// Implementors provide raw record access; the typed load/save methods are shared.
/// A missing record loads as its default.
pub trait ProgressStore {
    /// Read the JSON text stored under `key`, if any
    fn read_record(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Replace the JSON text stored under `key`
    fn write_record(&mut self, key: &str, json: &str) -> Result<(), PersistenceError>;

    fn load_progress(&self) -> Result<ProgressionSnapshot, PersistenceError> {
        load_record(self, PROGRESS_KEY)
    }

    fn save_progress(&mut self, snapshot: &ProgressionSnapshot) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(snapshot)?;
        self.write_record(PROGRESS_KEY, &json)
    }

    fn load_settings(&self) -> Result<Settings, PersistenceError> {
        load_record(self, SETTINGS_KEY)
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(settings)?;
        self.write_record(SETTINGS_KEY, &json)
    }
}

fn load_record<T, S>(store: &S, key: &str) -> Result<T, PersistenceError>
where
    T: Default + for<'de> Deserialize<'de>,
    S: ProgressStore + ?Sized,
{
    match store.read_record(key)? {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(T::default()),
    }
}

/// In-memory store; clones share the same records
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON currently stored under `key`
    pub fn raw(&self, key: &str) -> Option<String> {
        self.records.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl ProgressStore for MemoryStore {
    fn read_record(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.raw(key))
    }

    fn write_record(&mut self, key: &str, json: &str) -> Result<(), PersistenceError> {
        self.records
            .borrow_mut()
            .insert(key.to_string(), json.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_records_load_as_defaults() {
        let store = MemoryStore::new();
        assert_eq!(store.load_progress().unwrap(), ProgressionSnapshot::default());
        assert_eq!(store.load_settings().unwrap(), Settings::default());
    }

    #[test]
    fn test_progress_survives_save_and_load() {
        let mut store = MemoryStore::new();
        let mut snapshot = ProgressionSnapshot {
            gold: 250,
            total_kills: 42,
            highest_wave: 3,
            attribute: AttributeKind::Earth,
            ..Default::default()
        };
        snapshot.stat_levels.speed = 4;
        assert!(snapshot.unlock_cube("pebble", AttributeKind::Earth));
        assert!(!snapshot.unlock_cube("pebble", AttributeKind::Earth));

        store.save_progress(&snapshot).unwrap();
        let shared = store.clone();
        assert_eq!(shared.load_progress().unwrap(), snapshot);
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let mut store = MemoryStore::new();
        store.write_record(PROGRESS_KEY, "{ not json").unwrap();
        assert!(matches!(store.load_progress(), Err(PersistenceError::Format(_))));
    }

    #[test]
    fn test_older_records_fill_new_fields() {
        let mut store = MemoryStore::new();
        store
            .write_record(PROGRESS_KEY, r#"{ "gold": 7, "play_time": 12.5 }"#)
            .unwrap();
        let snapshot = store.load_progress().unwrap();
        assert_eq!(snapshot.gold, 7);
        assert_eq!(snapshot.best_level, 1);
        assert_eq!(snapshot.stat_levels, StatLevels::default());
    }
}
