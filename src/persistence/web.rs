//! Browser LocalStorage records

use super::{PersistenceError, ProgressStore};

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> Result<web_sys::Storage, PersistenceError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| PersistenceError::Unavailable("LocalStorage is not accessible".into()))
    }
}

impl ProgressStore for LocalStorageStore {
    fn read_record(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Self::storage()?
            .get_item(key)
            .map_err(|_| PersistenceError::Unavailable(format!("could not read {key}")))
    }

    fn write_record(&mut self, key: &str, json: &str) -> Result<(), PersistenceError> {
        Self::storage()?
            .set_item(key, json)
            .map_err(|_| PersistenceError::Unavailable(format!("could not write {key}")))?;
        log::info!("Saved {key} to LocalStorage");
        Ok(())
    }
}
