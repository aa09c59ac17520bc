//! Elemental attributes and their periodic area effects

use serde::{Deserialize, Serialize};

/// Attribute classification of the player cube
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttributeKind {
    #[default]
    None,
    /// High damage
    Fire,
    /// Slower, sturdier
    Ice,
    /// Fast
    Lightning,
    /// Knockback
    Earth,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 5] = [
        AttributeKind::None,
        AttributeKind::Fire,
        AttributeKind::Ice,
        AttributeKind::Lightning,
        AttributeKind::Earth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::None => "None",
            AttributeKind::Fire => "Fire",
            AttributeKind::Ice => "Ice",
            AttributeKind::Lightning => "Lightning",
            AttributeKind::Earth => "Earth",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Some(AttributeKind::None),
            "fire" => Some(AttributeKind::Fire),
            "ice" => Some(AttributeKind::Ice),
            "lightning" => Some(AttributeKind::Lightning),
            "earth" => Some(AttributeKind::Earth),
            _ => None,
        }
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stat multipliers granted by an attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeEffect {
    pub kind: AttributeKind,
    #[serde(default = "one")]
    pub damage_multiplier: f32,
    #[serde(default = "one")]
    pub speed_multiplier: f32,
    #[serde(default = "one")]
    pub defense_multiplier: f32,
    #[serde(default)]
    pub description: String,
}

fn one() -> f32 {
    1.0
}

impl AttributeEffect {
    pub fn new(
        kind: AttributeKind,
        damage: f32,
        speed: f32,
        defense: f32,
        description: &str,
    ) -> Self {
        Self {
            kind,
            damage_multiplier: damage,
            speed_multiplier: speed,
            defense_multiplier: defense,
            description: description.to_string(),
        }
    }

    /// The stock attribute table
    pub fn defaults() -> Vec<AttributeEffect> {
        vec![
            Self::new(AttributeKind::None, 1.0, 1.0, 1.0, "Plain cube"),
            Self::new(AttributeKind::Fire, 1.5, 1.0, 1.0, "High damage, burns nearby enemies"),
            Self::new(AttributeKind::Ice, 1.0, 0.9, 1.3, "Slower, tougher"),
            Self::new(AttributeKind::Lightning, 1.1, 1.4, 1.0, "Very fast"),
            Self::new(AttributeKind::Earth, 1.0, 0.8, 1.2, "Knocks enemies back"),
        ]
    }
}

/// Look up the configured effect for an attribute
pub fn find_effect(effects: &[AttributeEffect], kind: AttributeKind) -> Option<&AttributeEffect> {
    effects.iter().find(|e| e.kind == kind)
}

/// Periodic area effect settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Seconds between pulses
    pub interval: f32,
    pub radius: f32,
    /// Fire damage before the damage multiplier
    pub fire_damage: f32,
    /// Earth knockback impulse
    pub earth_knockback: f32,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            interval: 0.5,
            radius: 3.0,
            fire_damage: 10.0,
            earth_knockback: 10.0,
        }
    }
}

/// What a pulse does to enemies within its radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AreaEffect {
    /// Ice and Lightning pulses: only the trigger notification, enemies are unaffected.
    /// Slows and chain hits would need per-enemy status effects.
    Cosmetic,
    Damage(f32),
    /// Radial impulse away from the player
    Knockback(f32),
}

/// Resolve the pulse of `kind`; `None` for the plain attribute (no pulse at all)
pub fn area_effect(
    kind: AttributeKind,
    effect: Option<&AttributeEffect>,
    pulse: &PulseConfig,
) -> Option<AreaEffect> {
    let damage_multiplier = effect.map_or(1.0, |e| e.damage_multiplier);
    match kind {
        AttributeKind::None => None,
        AttributeKind::Fire => Some(AreaEffect::Damage(pulse.fire_damage * damage_multiplier)),
        AttributeKind::Earth => Some(AreaEffect::Knockback(pulse.earth_knockback)),
        AttributeKind::Ice | AttributeKind::Lightning => Some(AreaEffect::Cosmetic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_damage_scales_with_multiplier() {
        let effects = AttributeEffect::defaults();
        let fire = find_effect(&effects, AttributeKind::Fire);
        let pulse = PulseConfig::default();
        assert_eq!(
            area_effect(AttributeKind::Fire, fire, &pulse),
            Some(AreaEffect::Damage(15.0))
        );
    }

    #[test]
    fn test_plain_attribute_has_no_pulse() {
        assert_eq!(area_effect(AttributeKind::None, None, &PulseConfig::default()), None);
    }

    #[test]
    fn test_ice_and_lightning_pulses_only_notify() {
        let effects = AttributeEffect::defaults();
        let pulse = PulseConfig::default();
        for kind in [AttributeKind::Ice, AttributeKind::Lightning] {
            let effect = find_effect(&effects, kind);
            assert_eq!(area_effect(kind, effect, &pulse), Some(AreaEffect::Cosmetic));
        }
    }

    #[test]
    fn test_parse_round_trips_names() {
        for kind in AttributeKind::ALL {
            assert_eq!(AttributeKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AttributeKind::parse("water"), None);
    }
}
