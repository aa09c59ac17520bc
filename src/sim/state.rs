//! Game state - the complete simulation snapshot
//!
//! Owns every component of a run (director, spawner, enemy pool, player, session
//! timers) and the out-queue of events produced while ticking.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::attribute::{AreaEffect, AttributeKind, area_effect, find_effect};
use super::enemy::Enemy;
use super::events::GameEvent;
use super::player::Player;
use super::progression::{self, UpgradeError};
use super::spawn::SpawnController;
use super::stats::{StatKind, StatLevels};
use super::timer::TimerQueue;
use super::wave::{GamePhase, WaveDirector};
use crate::flatten;
use crate::pool::{InstanceId, ObjectPool};
use crate::tuning::Tuning;

/// Periodic work scheduled on the shared session clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTimer {
    /// Attribute area effect
    AttributePulse,
    /// Automatic player strike on nearby enemies
    PlayerStrike,
    /// One second of passive experience
    PassiveExperience,
    /// Progress checkpoint
    Autosave,
}

/// What a run starts from: persisted upgrades, attribute and wallet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Loadout {
    pub stat_levels: StatLevels,
    pub attribute: AttributeKind,
    pub gold: u64,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// RNG seed the state was created with
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub director: WaveDirector,
    pub spawner: SpawnController,
    pub enemies: ObjectPool<Enemy>,
    pub player: Player,
    pub timers: TimerQueue<SessionTimer>,
    /// Running ticks simulated so far
    pub time_ticks: u64,
    /// Events produced since the last [`take_events`](Self::take_events)
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Build an idle state; nothing moves until [`start`](Self::start)
    pub fn new(tuning: Tuning, seed: u64, loadout: &Loadout) -> Self {
        let mut enemies = ObjectPool::new();
        enemies.initialize(
            tuning
                .pools
                .iter()
                .map(|spec| (spec.tag.clone(), Enemy::new(spec.enemy), spec.size)),
        );
        let spawner = SpawnController::new(tuning.spawn.clone(), &enemies);
        let director = WaveDirector::new(tuning.wave);

        let mut events = Vec::new();
        let player = Self::fresh_player(&tuning, loadout, &mut events);

        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            director,
            spawner,
            enemies,
            player,
            timers: TimerQueue::new(),
            time_ticks: 0,
            events,
        }
    }

    fn fresh_player(tuning: &Tuning, loadout: &Loadout, out: &mut Vec<GameEvent>) -> Player {
        let mut player = Player::new(
            &tuning.player.stats,
            &loadout.stat_levels,
            loadout.attribute,
            loadout.gold,
        );
        progression::initialize(&mut player, &tuning.progression, out);
        player
    }

    pub fn phase(&self) -> GamePhase {
        self.director.phase()
    }

    /// Upgrades, attribute and gold the player currently holds
    pub fn loadout(&self) -> Loadout {
        Loadout {
            stat_levels: self.player.stats().levels(),
            attribute: self.player.chosen_attribute(),
            gold: self.player.gold(),
        }
    }

    /// Begin a run: clears the field, resets the player to level 1 with the current
    /// loadout and schedules the session timers. Ignored while a run is in progress.
    pub fn start(&mut self) -> bool {
        if !self.director.start(&mut self.events) {
            return false;
        }
        let loadout = self.loadout();
        self.player = Self::fresh_player(&self.tuning, &loadout, &mut self.events);
        self.enemies.release_all();
        self.spawner.suspend();
        self.time_ticks = 0;

        self.timers.clear();
        self.timers
            .schedule_repeating(SessionTimer::AttributePulse, self.tuning.pulse.interval);
        self.timers
            .schedule_repeating(SessionTimer::PlayerStrike, self.tuning.player.strike_interval);
        self.timers
            .schedule_repeating(SessionTimer::PassiveExperience, 1.0);
        self.timers
            .schedule_repeating(SessionTimer::Autosave, self.tuning.session.autosave_interval);
        true
    }

    pub fn pause(&mut self) -> bool {
        let paused = self.director.pause(&mut self.events);
        if paused {
            self.spawner.suspend();
        }
        paused
    }

    pub fn resume(&mut self) -> bool {
        self.director.resume(&mut self.events)
    }

    /// End the run; returns the elapsed running time
    pub fn end(&mut self) -> Option<f32> {
        let elapsed = self.director.end(&mut self.events)?;
        self.spawner.suspend();
        Some(elapsed)
    }

    /// Drain the events produced so far
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn upgrade_stat(&mut self, stat: StatKind) -> Result<f32, UpgradeError> {
        let config = &self.tuning.progression;
        progression::upgrade_stat(&mut self.player, stat, config, &mut self.events)
    }

    pub fn set_attribute(&mut self, attribute: AttributeKind) {
        let config = &self.tuning.progression;
        progression::set_attribute(&mut self.player, attribute, config, &mut self.events);
    }

    /// Damage an active enemy (for an external weapon collaborator).
    ///
    /// Returns true if this hit defeated it; the kill is collected on the next tick.
    pub fn damage_enemy(&mut self, id: InstanceId, amount: f32) -> bool {
        match self.enemies.get_mut(id) {
            Some(instance) if instance.active => instance.item.take_damage(amount),
            _ => false,
        }
    }

    /// Trigger the player's attribute area effect
    pub(crate) fn attribute_pulse(&mut self) {
        let attribute = self.player.attribute();
        let effect = find_effect(&self.tuning.progression.attributes, attribute);
        let Some(area) = area_effect(attribute, effect, &self.tuning.pulse) else {
            return;
        };

        let center = flatten(self.player.position());
        let radius = self.tuning.pulse.radius;
        self.events.push(GameEvent::AttributeEffectTriggered {
            attribute,
            position: center,
        });

        for instance in self.enemies.iter_active_mut() {
            let offset = flatten(instance.transform.position) - center;
            if offset.length() > radius || instance.item.is_defeated() {
                continue;
            }
            match area {
                AreaEffect::Cosmetic => {}
                AreaEffect::Damage(amount) => {
                    instance.item.take_damage(amount);
                }
                AreaEffect::Knockback(force) => {
                    let direction = if offset == Vec3::ZERO { Vec3::Z } else { offset.normalize() };
                    instance.item.apply_impulse(direction * force);
                }
            }
        }
    }

    /// Hit every active enemy within strike range with the player's attack
    pub(crate) fn player_strike(&mut self) {
        if self.player.is_dead() {
            return;
        }
        let center = flatten(self.player.position());
        let radius = self.tuning.player.strike_radius;
        let damage = self.player.attack();

        for instance in self.enemies.iter_active_mut() {
            if instance.item.is_defeated() {
                continue;
            }
            if flatten(instance.transform.position).distance(center) <= radius {
                instance.item.take_damage(damage);
            }
        }
    }

    /// Release defeated enemies, count the kills and pay out rewards.
    ///
    /// Kills still count once the player is dead; rewards are no longer paid.
    pub(crate) fn collect_defeated(&mut self) {
        let defeated: Vec<_> = self
            .enemies
            .iter_active()
            .filter(|i| i.item.is_defeated())
            .map(|i| {
                let template = i.item.template();
                (i.id, i.category, template.experience_reward, template.gold_reward)
            })
            .collect();

        for (id, category, experience, gold) in defeated {
            self.enemies.release_in(category, id);
            let tag = self.enemies.tag(category).to_string();
            log::debug!("Defeated {tag} #{}", id.index());

            self.director.add_kill(&mut self.events);
            self.events.push(GameEvent::EnemyDefeated { tag, id });
            if self.player.is_dead() {
                continue;
            }
            self.player.add_gold(gold);
            if experience > 0.0 {
                let config = &self.tuning.progression;
                let events = &mut self.events;
                progression::gain_experience(&mut self.player, experience, config, events);
            }
        }
    }
}
