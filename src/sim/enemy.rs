//! Pooled enemy behaviour
//!
//! Enemies chase the last known player position (refreshed on a short timer),
//! attack when in range and on cooldown, and take damage until defeated. Stats are
//! scaled by the difficulty read once when the enemy is initialised.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::timer::Countdown;
use crate::flatten;
use crate::pool::{PooledObject, Transform};

/// Turn rate used when facing the movement direction
const TURN_RATE: f32 = 10.0;
/// Knockback velocity lost per second (fraction)
const KNOCKBACK_DECAY: f32 = 5.0;

/// Movement style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnemyArchetype {
    #[default]
    Normal,
    Speedy,
    Tank,
    /// Keeps its distance around attack range
    Ranged,
}

impl EnemyArchetype {
    /// Multiplier on move speed when approaching
    pub fn approach_speed(&self) -> f32 {
        match self {
            EnemyArchetype::Normal => 1.0,
            EnemyArchetype::Speedy => 1.5,
            EnemyArchetype::Tank => 0.7,
            EnemyArchetype::Ranged => 0.5,
        }
    }
}

/// Unscaled enemy stats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyStats {
    pub max_health: f32,
    pub move_speed: f32,
    pub attack_damage: f32,
    pub attack_range: f32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    /// Seconds between target position refreshes
    pub retarget_interval: f32,
}

impl Default for EnemyStats {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            move_speed: 5.0,
            attack_damage: 10.0,
            attack_range: 1.5,
            attack_cooldown: 1.0,
            retarget_interval: 0.1,
        }
    }
}

/// Prototype data for a pool category
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnemyTemplate {
    #[serde(default)]
    pub archetype: EnemyArchetype,
    #[serde(default)]
    pub stats: EnemyStats,
    #[serde(default)]
    pub experience_reward: f32,
    #[serde(default)]
    pub gold_reward: u64,
}

/// A live (or dormant, when pooled) enemy
#[derive(Debug, Clone)]
pub struct Enemy {
    template: EnemyTemplate,
    difficulty: f32,
    health: f32,
    target: Vec3,
    can_attack: bool,
    attack_cooldown: Countdown,
    retarget: Countdown,
    knockback: Vec3,
    defeated: bool,
}

impl Enemy {
    pub fn new(template: EnemyTemplate) -> Self {
        Self {
            template,
            difficulty: 1.0,
            health: template.stats.max_health,
            target: Vec3::ZERO,
            can_attack: true,
            attack_cooldown: Countdown::disarmed(),
            retarget: Countdown::repeating(template.stats.retarget_interval),
            knockback: Vec3::ZERO,
            defeated: false,
        }
    }

    /// Bind to a fresh spawn: difficulty is read once here and never again
    pub fn initialize(&mut self, difficulty: f32, target: Vec3) {
        self.difficulty = difficulty.max(0.0);
        self.health = self.max_health();
        self.target = target;
    }

    pub fn template(&self) -> &EnemyTemplate {
        &self.template
    }

    pub fn archetype(&self) -> EnemyArchetype {
        self.template.archetype
    }

    pub fn difficulty(&self) -> f32 {
        self.difficulty
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.template.stats.max_health * self.difficulty
    }

    pub fn attack_damage(&self) -> f32 {
        self.template.stats.attack_damage * self.difficulty
    }

    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    pub fn can_attack(&self) -> bool {
        self.can_attack
    }

    /// Last known player position
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Apply damage; returns true only on the call that defeats the enemy
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.defeated {
            return false;
        }
        self.health -= amount.max(0.0);
        if self.health <= 0.0 {
            self.health = 0.0;
            self.defeated = true;
            return true;
        }
        false
    }

    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.knockback += flatten(impulse);
    }

    /// Advance one tick. Returns the damage of an attack landed this tick.
    pub fn update(&mut self, transform: &mut Transform, player_pos: Vec3, dt: f32) -> Option<f32> {
        if self.defeated {
            return None;
        }

        if self.attack_cooldown.tick(dt) > 0 {
            self.can_attack = true;
        }

        let mut landed = None;
        if self.retarget.tick(dt) > 0 {
            self.target = player_pos;
            let in_range =
                transform.position.distance(self.target) <= self.template.stats.attack_range;
            if self.can_attack && in_range {
                self.can_attack = false;
                self.attack_cooldown.arm(self.template.stats.attack_cooldown);
                landed = Some(self.attack_damage());
            }
        }

        self.steer(transform, dt);

        if self.knockback != Vec3::ZERO {
            transform.position += self.knockback * dt;
            self.knockback *= (1.0 - KNOCKBACK_DECAY * dt).max(0.0);
            if self.knockback.length_squared() < 1e-4 {
                self.knockback = Vec3::ZERO;
            }
        }

        landed
    }

    fn steer(&self, transform: &mut Transform, dt: f32) {
        let stats = &self.template.stats;
        let to_target = flatten(self.target - transform.position);
        let distance = to_target.length();

        let approach = to_target.normalize_or_zero() * stats.move_speed;
        let velocity = match self.template.archetype {
            EnemyArchetype::Ranged => {
                if distance < stats.attack_range * 0.8 {
                    // back away
                    -approach
                } else if distance > stats.attack_range * 1.2 {
                    approach * self.template.archetype.approach_speed()
                } else {
                    Vec3::ZERO
                }
            }
            archetype => approach * archetype.approach_speed(),
        };

        if velocity == Vec3::ZERO {
            return;
        }
        transform.position += velocity * dt;

        let facing = Quat::from_rotation_y(to_target.x.atan2(to_target.z));
        transform.rotation = transform.rotation.slerp(facing, (TURN_RATE * dt).min(1.0));
    }
}

impl PooledObject for Enemy {
    fn on_spawn(&mut self) {
        self.can_attack = true;
        self.defeated = false;
        self.health = self.max_health();
        self.knockback = Vec3::ZERO;
        self.attack_cooldown.disarm();
        self.retarget.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enemy(archetype: EnemyArchetype) -> Enemy {
        Enemy::new(EnemyTemplate {
            archetype,
            ..Default::default()
        })
    }

    fn at(x: f32, z: f32) -> Transform {
        Transform {
            position: Vec3::new(x, 0.0, z),
            rotation: Quat::IDENTITY,
        }
    }

    #[test]
    fn test_initialize_scales_health_and_damage() {
        let mut e = enemy(EnemyArchetype::Normal);
        e.initialize(1.5, Vec3::ZERO);
        assert!((e.health() - 150.0).abs() < 1e-4);
        assert!((e.attack_damage() - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_defeat_reported_once() {
        let mut e = enemy(EnemyArchetype::Normal);
        e.initialize(1.0, Vec3::ZERO);
        assert!(!e.take_damage(60.0));
        assert!(e.take_damage(60.0));
        assert!(!e.take_damage(60.0));
        assert_eq!(e.health(), 0.0);
        assert!(e.is_defeated());
    }

    #[test]
    fn test_normal_moves_toward_player() {
        let mut e = enemy(EnemyArchetype::Normal);
        e.initialize(1.0, Vec3::ZERO);
        let mut t = at(10.0, 0.0);
        e.update(&mut t, Vec3::ZERO, 0.1);
        assert!(t.position.x < 10.0);
        assert!((t.position.x - 9.5).abs() < 1e-4);
    }

    #[test]
    fn test_speedy_and_tank_speeds() {
        let cases = [(EnemyArchetype::Speedy, 0.75), (EnemyArchetype::Tank, 0.35)];
        for (archetype, expected) in cases {
            let mut e = enemy(archetype);
            e.initialize(1.0, Vec3::ZERO);
            let mut t = at(10.0, 0.0);
            e.update(&mut t, Vec3::ZERO, 0.1);
            assert!((10.0 - t.position.x - expected).abs() < 1e-4, "{archetype:?}");
        }
    }

    #[test]
    fn test_ranged_keeps_distance() {
        let mut e = enemy(EnemyArchetype::Ranged);
        e.initialize(1.0, Vec3::ZERO);

        // too close: backs away
        let mut t = at(0.5, 0.0);
        e.update(&mut t, Vec3::ZERO, 0.1);
        assert!(t.position.x > 0.5);

        // inside the comfort band: holds position
        let mut t = at(1.5, 0.0);
        e.update(&mut t, Vec3::ZERO, 0.1);
        assert!((t.position.x - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_attack_respects_cooldown() {
        let mut e = enemy(EnemyArchetype::Ranged);
        e.initialize(2.0, Vec3::ZERO);
        let mut t = at(1.5, 0.0);

        let mut hits = Vec::new();
        // 1.5 seconds in 0.05s steps
        for _ in 0..30 {
            if let Some(d) = e.update(&mut t, Vec3::ZERO, 0.05) {
                hits.push(d);
            }
        }
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|d| (*d - 20.0).abs() < 1e-4));
    }

    #[test]
    fn test_on_spawn_resets_state() {
        let mut e = enemy(EnemyArchetype::Normal);
        e.initialize(1.0, Vec3::ZERO);
        e.take_damage(500.0);
        e.apply_impulse(Vec3::X * 3.0);
        e.on_spawn();
        assert!(!e.is_defeated());
        assert!(e.can_attack());
        assert!((e.health() - 100.0).abs() < 1e-4);
    }
}
