//! The player-controlled cube
//!
//! Holds the progression subject's data (stats, level, attribute, evolution stage,
//! health) and the motion inputs handed to the physics collaborator. All progression
//! rules live in [`super::progression`]; this module only owns state and movement.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::attribute::AttributeKind;
use super::stats::{StatBlock, StatDefaults, StatLevels};
use super::timer::Countdown;
use crate::consts::{GRAVITY, GROUND_HEIGHT};
use crate::flatten;

/// Level, experience and the evolving flag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressionState {
    /// Player level (>= 1)
    pub level: u32,
    /// Experience toward the next level (>= 0)
    pub experience: f32,
    pub is_evolving: bool,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0.0,
            is_evolving: false,
        }
    }
}

/// How [`Motion::apply_force`] interprets its argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceMode {
    /// Instant velocity change
    Impulse,
    /// Velocity change per second, scaled by `dt`
    Acceleration,
}

/// Kinematic body standing in for the physics collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Quat,
    pub grounded: bool,
    /// Cleared while an evolution sequence runs
    pub control_enabled: bool,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            grounded: true,
            control_enabled: true,
        }
    }
}

impl Motion {
    /// Queue a force; ignored while control is disabled
    pub fn apply_force(&mut self, force: Vec3, mode: ForceMode, dt: f32) {
        if !self.control_enabled {
            return;
        }
        match mode {
            ForceMode::Impulse => self.velocity += force,
            ForceMode::Acceleration => self.velocity += force * dt,
        }
        if self.velocity.y > 0.0 {
            self.grounded = false;
        }
    }

    pub fn stop_movement(&mut self) {
        self.velocity = Vec3::ZERO;
    }

    /// Turn toward `direction` (ground plane) by at most `max_angle` radians
    pub fn face_towards(&mut self, direction: Vec3, max_angle: f32) {
        let flat = flatten(direction);
        if flat.length_squared() < 1e-8 {
            return;
        }
        let target = Quat::from_rotation_y(flat.x.atan2(flat.z));
        let angle = self.rotation.angle_between(target);
        self.rotation = if angle <= max_angle {
            target
        } else {
            self.rotation.slerp(target, max_angle / angle)
        };
    }

    /// Advance position with gravity, ground contact and horizontal damping
    pub fn integrate(&mut self, damping: f32, dt: f32) {
        if !self.grounded {
            self.velocity.y -= GRAVITY * dt;
        }
        let keep = (1.0 - damping * dt).max(0.0);
        self.velocity.x *= keep;
        self.velocity.z *= keep;

        self.position += self.velocity * dt;
        if self.position.y <= GROUND_HEIGHT {
            self.position.y = GROUND_HEIGHT;
            if self.velocity.y < 0.0 {
                self.velocity.y = 0.0;
            }
            self.grounded = true;
        }
    }
}

/// Movement commands for one tick, already normalised by the input collaborator
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveInput {
    /// Ground-plane intent: `x` maps to world X, `y` to world Z
    pub direction: Vec2,
    pub jump: bool,
}

/// Player tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub stats: StatDefaults,
    /// Facing turn rate in degrees per second
    pub rotation_speed_deg: f32,
    pub jump_force: f32,
    /// Fraction of horizontal velocity lost per second
    pub damping: f32,
    /// Seconds between automatic strikes
    pub strike_interval: f32,
    pub strike_radius: f32,
    /// Experience granted for every second of running time
    pub passive_experience_per_second: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            stats: StatDefaults::default(),
            rotation_speed_deg: 720.0,
            jump_force: 5.0,
            damping: 2.0,
            strike_interval: 1.0,
            strike_radius: 2.0,
            passive_experience_per_second: 1.0,
        }
    }
}

/// The progression subject
#[derive(Debug, Clone)]
pub struct Player {
    pub(crate) stats: StatBlock,
    pub(crate) progression: ProgressionState,
    pub(crate) health: f32,
    pub(crate) dead: bool,
    pub(crate) attribute: AttributeKind,
    /// Attribute chosen while evolving, applied when the sequence completes
    pub(crate) pending_attribute: Option<AttributeKind>,
    /// Index into the configured evolution paths
    pub(crate) path: Option<usize>,
    /// Index of the active stage inside `path`
    pub(crate) stage: Option<usize>,
    pub(crate) evolution: Countdown,
    pub(crate) motion: Motion,
    pub(crate) gold: u64,
}

impl Player {
    /// Raw player at level 1; run [`progression::initialize`](super::progression::initialize)
    /// before use so the attribute path and derived stats are in place.
    pub fn new(
        defaults: &StatDefaults,
        levels: &StatLevels,
        attribute: AttributeKind,
        gold: u64,
    ) -> Self {
        let stats = StatBlock::new(defaults, levels);
        Self {
            health: stats.health.current(),
            stats,
            progression: ProgressionState::default(),
            dead: false,
            attribute,
            pending_attribute: None,
            path: None,
            stage: None,
            evolution: Countdown::disarmed(),
            motion: Motion::default(),
            gold,
        }
    }

    pub fn stats(&self) -> &StatBlock {
        &self.stats
    }

    pub fn progression(&self) -> ProgressionState {
        self.progression
    }

    pub fn level(&self) -> u32 {
        self.progression.level
    }

    pub fn experience(&self) -> f32 {
        self.progression.experience
    }

    pub fn is_evolving(&self) -> bool {
        self.progression.is_evolving
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.stats.health.current()
    }

    pub fn attack(&self) -> f32 {
        self.stats.attack.current()
    }

    pub fn defense(&self) -> f32 {
        self.stats.defense.current()
    }

    pub fn speed(&self) -> f32 {
        self.stats.speed.current()
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn attribute(&self) -> AttributeKind {
        self.attribute
    }

    /// The attribute the player will have once any running evolution completes
    pub fn chosen_attribute(&self) -> AttributeKind {
        self.pending_attribute.unwrap_or(self.attribute)
    }

    pub fn path_index(&self) -> Option<usize> {
        self.path
    }

    pub fn stage_index(&self) -> Option<usize> {
        self.stage
    }

    pub fn gold(&self) -> u64 {
        self.gold
    }

    pub fn add_gold(&mut self, amount: u64) {
        self.gold = self.gold.saturating_add(amount);
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn position(&self) -> Vec3 {
        self.motion.position
    }

    /// External force from the physics collaborator (ignored while evolving)
    pub fn apply_force(&mut self, force: Vec3, mode: ForceMode, dt: f32) {
        self.motion.apply_force(force, mode, dt);
    }

    /// Apply one tick of movement input, then integrate.
    ///
    /// Input is dropped while control is disabled; the body still settles under gravity.
    pub fn update_motion(&mut self, input: &MoveInput, config: &PlayerConfig, dt: f32) {
        if self.motion.control_enabled && !self.dead {
            let direction =
                Vec3::new(input.direction.x, 0.0, input.direction.y).clamp_length_max(1.0);
            if direction != Vec3::ZERO {
                self.motion
                    .apply_force(direction * self.speed(), ForceMode::Acceleration, dt);
                self.motion
                    .face_towards(direction, config.rotation_speed_deg.to_radians() * dt);
            }
            if input.jump && self.motion.grounded {
                self.motion
                    .apply_force(Vec3::Y * config.jump_force, ForceMode::Impulse, dt);
            }
        }
        self.motion.integrate(config.damping, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(&StatDefaults::default(), &StatLevels::default(), AttributeKind::None, 0)
    }

    #[test]
    fn test_move_input_accelerates_by_speed() {
        let mut p = player();
        let config = PlayerConfig {
            damping: 0.0,
            ..Default::default()
        };
        let input = MoveInput {
            direction: Vec2::new(1.0, 0.0),
            jump: false,
        };
        p.update_motion(&input, &config, 0.5);
        // speed 5 for half a second
        assert!((p.motion().velocity.x - 2.5).abs() < 1e-5);
        assert!(p.position().x > 0.0);
        assert_eq!(p.position().y, 0.0);
    }

    #[test]
    fn test_jump_only_when_grounded() {
        let mut p = player();
        let config = PlayerConfig::default();
        let jump = MoveInput {
            direction: Vec2::ZERO,
            jump: true,
        };
        p.update_motion(&jump, &config, 1.0 / 60.0);
        assert!(!p.motion().grounded);
        let vy = p.motion().velocity.y;
        p.update_motion(&jump, &config, 1.0 / 60.0);
        assert!(p.motion().velocity.y < vy);

        for _ in 0..120 {
            p.update_motion(&MoveInput::default(), &config, 1.0 / 60.0);
        }
        assert!(p.motion().grounded);
        assert_eq!(p.position().y, 0.0);
    }

    #[test]
    fn test_rotation_limited_by_turn_rate() {
        let mut motion = Motion::default();
        let max = 720f32.to_radians() / 60.0;
        motion.face_towards(Vec3::new(0.0, 0.0, -1.0), max);
        assert!((motion.rotation.angle_between(Quat::IDENTITY) - max).abs() < 1e-3);
    }

    #[test]
    fn test_forces_ignored_without_control() {
        let mut p = player();
        p.motion.control_enabled = false;
        p.apply_force(Vec3::X * 10.0, ForceMode::Impulse, 0.1);
        p.update_motion(
            &MoveInput {
                direction: Vec2::X,
                jump: true,
            },
            &PlayerConfig::default(),
            0.1,
        );
        assert_eq!(p.motion().velocity, Vec3::ZERO);
        assert_eq!(p.position(), Vec3::ZERO);
    }
}
