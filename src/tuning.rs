//! Data-driven game balance
//!
//! Every balance number lives in [`Tuning`]. All sections default, so a tuning file
//! only needs the values it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::attribute::PulseConfig;
use crate::sim::enemy::{EnemyArchetype, EnemyStats, EnemyTemplate};
use crate::sim::player::PlayerConfig;
use crate::sim::progression::ProgressionConfig;
use crate::sim::spawn::SpawnConfig;
use crate::sim::stats::StatKind;
use crate::sim::wave::WaveConfig;

/// Errors raised while loading or validating tuning data
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {field} {reason}")]
    Invalid { field: String, reason: &'static str },
}

fn invalid(field: impl Into<String>, reason: &'static str) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason,
    }
}

/// One enemy pool category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSpec {
    pub tag: String,
    /// Instances created up front
    pub size: usize,
    #[serde(default)]
    pub enemy: EnemyTemplate,
}

/// Session-level timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds of running time between progress checkpoints
    pub autosave_interval: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autosave_interval: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub wave: WaveConfig,
    pub spawn: SpawnConfig,
    pub pools: Vec<PoolSpec>,
    pub player: PlayerConfig,
    pub progression: ProgressionConfig,
    pub pulse: PulseConfig,
    pub session: SessionConfig,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            wave: WaveConfig::default(),
            spawn: SpawnConfig::default(),
            pools: default_pools(),
            player: PlayerConfig::default(),
            progression: ProgressionConfig::default(),
            pulse: PulseConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// The stock enemy roster
pub fn default_pools() -> Vec<PoolSpec> {
    let pool =
        |tag: &str, size, archetype, stats: EnemyStats, experience_reward, gold_reward| PoolSpec {
            tag: tag.to_string(),
            size,
            enemy: EnemyTemplate {
                archetype,
                stats,
                experience_reward,
                gold_reward,
            },
        };
    let base = EnemyStats::default();
    vec![
        pool("normal", 20, EnemyArchetype::Normal, base, 10.0, 1),
        pool(
            "speedy",
            10,
            EnemyArchetype::Speedy,
            EnemyStats {
                max_health: 60.0,
                ..base
            },
            12.0,
            2,
        ),
        pool(
            "tank",
            5,
            EnemyArchetype::Tank,
            EnemyStats {
                max_health: 250.0,
                attack_damage: 15.0,
                ..base
            },
            25.0,
            5,
        ),
        pool(
            "ranged",
            8,
            EnemyArchetype::Ranged,
            EnemyStats {
                max_health: 80.0,
                attack_damage: 8.0,
                attack_range: 8.0,
                attack_cooldown: 2.0,
                ..base
            },
            15.0,
            3,
        ),
    ]
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate a JSON tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check numeric ranges. Spawn rules naming a missing pool only warn.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let wave = &self.wave;
        if wave.wave_interval <= 0.0 {
            return Err(invalid("wave.wave_interval", "must be positive"));
        }
        if wave.initial_difficulty < 1.0 {
            return Err(invalid("wave.initial_difficulty", "must be at least 1"));
        }
        if wave.difficulty_growth_step < 1.0 {
            return Err(invalid("wave.difficulty_growth_step", "must be at least 1"));
        }
        if wave.difficulty_growth_interval <= 0.0 {
            return Err(invalid("wave.difficulty_growth_interval", "must be positive"));
        }
        if wave.wave_weight < 0.0 {
            return Err(invalid("wave.wave_weight", "must not be negative"));
        }

        let spawn = &self.spawn;
        if spawn.min_interval <= 0.0 {
            return Err(invalid("spawn.min_interval", "must be positive"));
        }
        if spawn.min_interval > spawn.base_interval {
            return Err(invalid("spawn.min_interval", "must not exceed base_interval"));
        }
        if spawn.interval_decrease_per_wave < 0.0 {
            return Err(invalid("spawn.interval_decrease_per_wave", "must not be negative"));
        }
        for rule in &spawn.rules {
            if rule.weight < 0.0 || !rule.weight.is_finite() {
                return Err(invalid(
                    format!("spawn.rules[{}].weight", rule.tag),
                    "must be a finite non-negative number",
                ));
            }
            if !self.pools.iter().any(|p| p.tag == rule.tag) {
                log::warn!("Spawn rule {} has no matching pool", rule.tag);
            }
        }

        for kind in StatKind::ALL {
            if self.player.stats.get(kind).growth_rate <= 1.0 {
                return Err(invalid(
                    format!("player.stats.{kind}.growth_rate"),
                    "must be greater than 1",
                ));
            }
        }

        let progression = &self.progression;
        if progression.base_experience <= 0.0 {
            return Err(invalid("progression.base_experience", "must be positive"));
        }
        if progression.experience_curve < 1.0 {
            return Err(invalid("progression.experience_curve", "must be at least 1"));
        }
        if progression.evolution_duration < 0.0 {
            return Err(invalid("progression.evolution_duration", "must not be negative"));
        }
        for path in &progression.evolution_paths {
            if path.stages.is_empty() {
                return Err(invalid(
                    format!("progression.evolution_paths.{}", path.name),
                    "has no stages",
                ));
            }
        }

        if self.pulse.interval <= 0.0 {
            return Err(invalid("pulse.interval", "must be positive"));
        }
        if self.player.strike_interval <= 0.0 {
            return Err(invalid("player.strike_interval", "must be positive"));
        }
        if self.session.autosave_interval <= 0.0 {
            return Err(invalid("session.autosave_interval", "must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        let tuning = Tuning::default();
        tuning.validate().unwrap();
        assert_eq!(tuning.pools.len(), 4);
        assert_eq!(tuning.wave.wave_interval, 30.0);
        assert_eq!(tuning.spawn.min_interval, 0.5);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "wave": { "wave_interval": 10.0 } }"#).unwrap();
        assert_eq!(tuning.wave.wave_interval, 10.0);
        assert!((tuning.wave.initial_difficulty - 1.1).abs() < 1e-6);
        assert_eq!(tuning.pools, default_pools());
    }

    #[test]
    fn test_round_trips_through_json() {
        let tuning = Tuning::default();
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }

    #[test]
    fn test_rejects_bad_ranges() {
        let err = Tuning::from_json(r#"{ "spawn": { "base_interval": 0.2, "min_interval": 0.5 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err =
            Tuning::from_json(r#"{ "wave": { "difficulty_growth_step": 0.9 } }"#).unwrap_err();
        assert!(err.to_string().contains("difficulty_growth_step"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("cube_survivor_no_such_tuning.json");
        assert!(matches!(Tuning::load(path), Err(ConfigError::Io(_))));
    }
}
