//! One JSON file per record, written through a temp file and renamed into place

use std::fs;
use std::path::{Path, PathBuf};

use super::{PersistenceError, ProgressStore};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Store records under `dir` (created on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl ProgressStore for JsonFileStore {
    fn read_record(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_record(&mut self, key: &str, json: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::ProgressionSnapshot;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cube_survivor_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_round_trip_on_disk() {
        let dir = scratch_dir("file_store");
        let mut store = JsonFileStore::new(&dir);
        assert_eq!(store.load_progress().unwrap(), ProgressionSnapshot::default());

        let snapshot = ProgressionSnapshot {
            gold: 99,
            highest_wave: 4,
            ..Default::default()
        };
        store.save_progress(&snapshot).unwrap();
        assert!(dir.join("cube_survivor_progress.json").exists());
        assert!(!dir.join("cube_survivor_progress.json.tmp").exists());

        let reopened = JsonFileStore::new(&dir);
        assert_eq!(reopened.load_progress().unwrap(), snapshot);
        let _ = fs::remove_dir_all(&dir);
    }
}
