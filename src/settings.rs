//! Game settings and preferences
//!
//! Persisted separately from progress through the same store.

use serde::{Deserialize, Serialize};

use crate::persistence::{PersistenceError, ProgressStore};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Background music volume (0.0 - 1.0)
    pub bgm_volume: f32,
    /// Mute when window loses focus
    pub mute_on_blur: bool,

    // === Haptics ===
    pub vibration_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            sfx_volume: 1.0,
            bgm_volume: 1.0,
            mute_on_blur: true,
            vibration_enabled: true,
        }
    }
}

impl Settings {
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = clamp_unit(volume);
    }

    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = clamp_unit(volume);
    }

    pub fn set_bgm_volume(&mut self, volume: f32) {
        self.bgm_volume = clamp_unit(volume);
    }

    pub fn set_vibration(&mut self, enabled: bool) {
        self.vibration_enabled = enabled;
    }

    /// Effective sound effects volume (master * sfx)
    pub fn effective_sfx_volume(&self) -> f32 {
        self.master_volume * self.sfx_volume
    }

    /// Effective music volume (master * bgm)
    pub fn effective_bgm_volume(&self) -> f32 {
        self.master_volume * self.bgm_volume
    }

    /// Load from `store`, falling back to defaults when the record is unreadable
    pub fn load(store: &dyn ProgressStore) -> Self {
        match store.load_settings() {
            Ok(settings) => {
                log::info!("Loaded settings");
                settings.sanitized()
            }
            Err(e) => {
                log::warn!("Using default settings: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn ProgressStore) -> Result<(), PersistenceError> {
        store.save_settings(self)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Clamp hand-edited records back into range
    fn sanitized(mut self) -> Self {
        self.master_volume = clamp_unit(self.master_volume);
        self.sfx_volume = clamp_unit(self.sfx_volume);
        self.bgm_volume = clamp_unit(self.bgm_volume);
        self
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, SETTINGS_KEY};

    #[test]
    fn test_setters_clamp() {
        let mut settings = Settings::default();
        settings.set_master_volume(1.5);
        settings.set_sfx_volume(-0.2);
        settings.set_bgm_volume(0.25);
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.sfx_volume, 0.0);
        assert_eq!(settings.effective_bgm_volume(), 0.25);
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.set_vibration(false);
        settings.set_sfx_volume(0.5);
        settings.save(&mut store).unwrap();
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_bad_record_falls_back() {
        let mut store = MemoryStore::new();
        store.write_record(SETTINGS_KEY, "[]").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());

        store
            .write_record(SETTINGS_KEY, r#"{ "master_volume": 7.0 }"#)
            .unwrap();
        assert_eq!(Settings::load(&store).master_volume, 1.0);
    }
}
