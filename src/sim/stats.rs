//! Player stat block
//!
//! Each stat grows geometrically with its own upgrade level:
//! `value = base * growth^(level - 1)`. The derived current value is only ever
//! written by [`recalculate_stats`](super::progression::recalculate_stats).

use serde::{Deserialize, Serialize};

/// The four tracked stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Health,
    Attack,
    Defense,
    Speed,
}

impl StatKind {
    pub const ALL: [StatKind; 4] = [
        StatKind::Health,
        StatKind::Attack,
        StatKind::Defense,
        StatKind::Speed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::Health => "health",
            StatKind::Attack => "attack",
            StatKind::Defense => "defense",
            StatKind::Speed => "speed",
        }
    }

    /// Parse a stat name at a string boundary (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "health" | "max health" | "hp" => Some(StatKind::Health),
            "attack" | "atk" => Some(StatKind::Attack),
            "defense" | "def" => Some(StatKind::Defense),
            "speed" | "spd" => Some(StatKind::Speed),
            _ => None,
        }
    }
}

impl std::fmt::Display for StatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tuning data for one stat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatTemplate {
    pub base_value: f32,
    /// Per-level growth (> 1)
    pub growth_rate: f32,
    /// Price of the first upgrade before growth
    pub upgrade_price: f32,
}

impl StatTemplate {
    pub const fn new(base_value: f32) -> Self {
        Self {
            base_value,
            growth_rate: 1.1,
            upgrade_price: 100.0,
        }
    }
}

/// Default templates for every stat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatDefaults {
    pub health: StatTemplate,
    pub attack: StatTemplate,
    pub defense: StatTemplate,
    pub speed: StatTemplate,
}

impl Default for StatDefaults {
    fn default() -> Self {
        Self {
            health: StatTemplate::new(100.0),
            attack: StatTemplate::new(10.0),
            defense: StatTemplate::new(5.0),
            speed: StatTemplate::new(5.0),
        }
    }
}

impl StatDefaults {
    pub fn get(&self, kind: StatKind) -> &StatTemplate {
        match kind {
            StatKind::Health => &self.health,
            StatKind::Attack => &self.attack,
            StatKind::Defense => &self.defense,
            StatKind::Speed => &self.speed,
        }
    }
}

/// Persisted upgrade level of every stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatLevels {
    pub health: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
}

impl Default for StatLevels {
    fn default() -> Self {
        Self {
            health: 1,
            attack: 1,
            defense: 1,
            speed: 1,
        }
    }
}

impl StatLevels {
    pub fn get(&self, kind: StatKind) -> u32 {
        match kind {
            StatKind::Health => self.health,
            StatKind::Attack => self.attack,
            StatKind::Defense => self.defense,
            StatKind::Speed => self.speed,
        }
    }
}

/// One live stat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub base_value: f32,
    /// Upgrade level (>= 1)
    pub level: u32,
    pub growth_rate: f32,
    pub upgrade_price: f32,
    current_value: f32,
}

impl Stat {
    pub fn from_template(template: &StatTemplate, level: u32) -> Self {
        let mut stat = Self {
            base_value: template.base_value,
            level: level.max(1),
            growth_rate: template.growth_rate,
            upgrade_price: template.upgrade_price,
            current_value: 0.0,
        };
        stat.current_value = stat.leveled_value();
        stat
    }

    /// `base * growth^(level - 1)`, before any multiplier
    pub fn leveled_value(&self) -> f32 {
        self.base_value * self.growth_rate.powi(self.level.saturating_sub(1) as i32)
    }

    /// Price of the next upgrade: `price * growth^level`
    pub fn next_upgrade_price(&self) -> f32 {
        self.upgrade_price * self.growth_rate.powi(self.level as i32)
    }

    /// Derived value including multipliers
    pub fn current(&self) -> f32 {
        self.current_value
    }

    pub(crate) fn set_current(&mut self, value: f32) {
        self.current_value = value;
    }
}

/// Health, attack, defense and speed of the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub health: Stat,
    pub attack: Stat,
    pub defense: Stat,
    pub speed: Stat,
}

impl StatBlock {
    pub fn new(defaults: &StatDefaults, levels: &StatLevels) -> Self {
        Self {
            health: Stat::from_template(&defaults.health, levels.health),
            attack: Stat::from_template(&defaults.attack, levels.attack),
            defense: Stat::from_template(&defaults.defense, levels.defense),
            speed: Stat::from_template(&defaults.speed, levels.speed),
        }
    }

    pub fn get(&self, kind: StatKind) -> &Stat {
        match kind {
            StatKind::Health => &self.health,
            StatKind::Attack => &self.attack,
            StatKind::Defense => &self.defense,
            StatKind::Speed => &self.speed,
        }
    }

    pub fn get_mut(&mut self, kind: StatKind) -> &mut Stat {
        match kind {
            StatKind::Health => &mut self.health,
            StatKind::Attack => &mut self.attack,
            StatKind::Defense => &mut self.defense,
            StatKind::Speed => &mut self.speed,
        }
    }

    pub fn levels(&self) -> StatLevels {
        StatLevels {
            health: self.health.level,
            attack: self.attack.level,
            defense: self.defense.level,
            speed: self.speed.level,
        }
    }
}
