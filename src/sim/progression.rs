//! Stat, leveling and evolution rules
//!
//! Stateless functions over [`Player`]. [`recalculate_stats`] is the only writer of
//! derived stat values; everything that changes a base value, a level or a multiplier
//! ends by calling it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::attribute::{AttributeEffect, AttributeKind, find_effect};
use super::events::{GameEvent, StageInfo};
use super::evolution::{EvolutionPath, find_path};
use super::player::Player;
use super::stats::{StatKind, StatLevels};
use super::timer::Countdown;

/// Leveling and evolution tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Experience needed for level 2
    pub base_experience: f32,
    /// Threshold growth per level
    pub experience_curve: f32,
    /// Base-value multiplier applied to health, attack and defense on level-up
    pub level_up_bonus: f32,
    /// Seconds an evolution sequence takes
    pub evolution_duration: f32,
    pub attributes: Vec<AttributeEffect>,
    pub evolution_paths: Vec<EvolutionPath>,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            base_experience: 100.0,
            experience_curve: 1.2,
            level_up_bonus: 1.1,
            evolution_duration: 2.0,
            attributes: AttributeEffect::defaults(),
            evolution_paths: EvolutionPath::defaults(),
        }
    }
}

impl ProgressionConfig {
    /// `base * curve^(level - 1)`
    pub fn required_experience(&self, level: u32) -> f32 {
        self.base_experience * self.experience_curve.powi(level.saturating_sub(1) as i32)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpgradeError {
    #[error("upgrading {stat} costs {price} gold but only {available} is available")]
    InsufficientGold { stat: StatKind, price: u64, available: u64 },
}

/// Bind the player to its attribute's path and stage and fill health
pub fn initialize(player: &mut Player, config: &ProgressionConfig, out: &mut Vec<GameEvent>) {
    select_path(player, config);
    recalculate_stats(player, config, out);
    player.health = player.max_health();
    out.push(health_changed(player));
}

/// Recompute every derived stat from base, level and the current multipliers.
///
/// Health is clamped to the new maximum. Calling it twice in a row changes nothing.
pub fn recalculate_stats(
    player: &mut Player,
    config: &ProgressionConfig,
    out: &mut Vec<GameEvent>,
) {
    let (damage, speed, defense) = find_effect(&config.attributes, player.attribute)
        .map_or((1.0, 1.0, 1.0), |e| {
            (e.damage_multiplier, e.speed_multiplier, e.defense_multiplier)
        });
    let evolution = stage_multiplier(player, config);

    let stats = &mut player.stats;
    stats.health.set_current(stats.health.leveled_value() * evolution);
    stats.attack.set_current(stats.attack.leveled_value() * damage * evolution);
    stats.defense.set_current(stats.defense.leveled_value() * defense * evolution);
    stats.speed.set_current(stats.speed.leveled_value() * speed);

    player.health = player.health.clamp(0.0, player.stats.health.current());
    out.push(health_changed(player));
}

/// Multiplier of the active evolution stage (1 when there is none)
pub fn stage_multiplier(player: &Player, config: &ProgressionConfig) -> f32 {
    active_stage_info(player, config).map_or(1.0, |s| s.stat_multiplier)
}

pub fn active_stage_info(player: &Player, config: &ProgressionConfig) -> Option<StageInfo> {
    let path = config.evolution_paths.get(player.path?)?;
    path.stage_info(player.stage?)
}

/// Apply `max(1, raw - defense)` damage. Returns the damage actually dealt.
///
/// Health never drops below zero and the death notification fires once.
pub fn take_damage(player: &mut Player, raw_damage: f32, out: &mut Vec<GameEvent>) -> f32 {
    if player.dead {
        return 0.0;
    }
    let actual = (raw_damage - player.defense()).max(1.0);
    let before = player.health;
    player.health = (player.health - actual).max(0.0);
    out.push(health_changed(player));

    if player.health <= 0.0 {
        player.dead = true;
        log::info!("Player died at level {}", player.level());
        out.push(GameEvent::PlayerDied);
    }
    before - player.health
}

pub fn heal(player: &mut Player, amount: f32, out: &mut Vec<GameEvent>) {
    if player.dead {
        return;
    }
    player.health = (player.health + amount.max(0.0)).min(player.max_health());
    out.push(health_changed(player));
}

/// Add experience and level up as many times as the total covers.
///
/// Negative amounts count as zero, non-finite amounts are dropped and a dead player
/// gains nothing. Returns the number of level-ups.
pub fn gain_experience(
    player: &mut Player,
    amount: f32,
    config: &ProgressionConfig,
    out: &mut Vec<GameEvent>,
) -> u32 {
    if player.dead {
        return 0;
    }
    if !amount.is_finite() {
        log::warn!("Ignoring non-finite experience gain {amount}");
        return 0;
    }
    let amount = amount.max(0.0);
    player.progression.experience += amount;
    out.push(GameEvent::ExperienceGained { amount });

    let mut levels = 0;
    loop {
        let required = config.required_experience(player.progression.level);
        if !required.is_finite() || required <= 0.0 || player.progression.experience < required {
            break;
        }
        player.progression.experience -= required;
        level_up(player, config, out);
        levels += 1;
    }
    levels
}

/// Increase the level, grow base stats, heal fully and check for evolution.
///
/// Ignored once the player is dead.
pub fn level_up(player: &mut Player, config: &ProgressionConfig, out: &mut Vec<GameEvent>) {
    if player.dead {
        return;
    }
    player.progression.level += 1;
    let level = player.progression.level;
    log::info!("Level up: {level}");
    out.push(GameEvent::LevelUp { level });

    let stats = &mut player.stats;
    for stat in [&mut stats.health, &mut stats.attack, &mut stats.defense] {
        stat.base_value *= config.level_up_bonus;
    }
    recalculate_stats(player, config, out);

    player.health = player.max_health();
    out.push(health_changed(player));

    if let Some(stage) = evolution_candidate(player, config) {
        begin_evolution(player, stage, config, out);
    }
}

/// Buy the next level of `stat` with gold. Returns the new derived value.
pub fn upgrade_stat(
    player: &mut Player,
    stat: StatKind,
    config: &ProgressionConfig,
    out: &mut Vec<GameEvent>,
) -> Result<f32, UpgradeError> {
    let price = upgrade_price(player, stat);
    if player.gold < price {
        return Err(UpgradeError::InsufficientGold {
            stat,
            price,
            available: player.gold,
        });
    }

    player.gold -= price;
    player.stats.get_mut(stat).level += 1;
    recalculate_stats(player, config, out);

    let value = player.stats.get(stat).current();
    log::info!("Upgraded {stat} to level {} for {price} gold", player.stats.get(stat).level);
    out.push(GameEvent::StatUpgraded { stat, value });
    Ok(value)
}

/// Whole-gold price of the next upgrade of `stat`, rounded up.
///
/// Float noise within `PRICE_EPSILON` of a whole number does not round up.
pub fn upgrade_price(player: &Player, stat: StatKind) -> u64 {
    (player.stats.get(stat).next_upgrade_price() - PRICE_EPSILON)
        .max(0.0)
        .ceil() as u64
}

const PRICE_EPSILON: f32 = 1e-3;

/// [`upgrade_stat`] for a stat named at a string boundary.
///
/// Unknown names are a warning and a no-op.
pub fn upgrade_stat_by_name(
    player: &mut Player,
    name: &str,
    config: &ProgressionConfig,
    out: &mut Vec<GameEvent>,
) -> Option<Result<f32, UpgradeError>> {
    let Some(stat) = StatKind::parse(name) else {
        log::warn!("Unknown stat {name}; upgrade ignored");
        return None;
    };
    Some(upgrade_stat(player, stat, config, out))
}

/// Switch attribute, re-select the evolution path and recalculate.
///
/// No-op when unchanged; warns and keeps the current attribute when the attribute has
/// no configured effect. While evolving the switch is held back and applied when the
/// sequence completes, so the stage never changes mid-sequence.
pub fn set_attribute(
    player: &mut Player,
    attribute: AttributeKind,
    config: &ProgressionConfig,
    out: &mut Vec<GameEvent>,
) {
    if player.chosen_attribute() == attribute {
        return;
    }
    if find_effect(&config.attributes, attribute).is_none() {
        log::warn!("No effect configured for attribute {attribute}");
        return;
    }

    if player.progression.is_evolving {
        player.pending_attribute = (attribute != player.attribute).then_some(attribute);
        log::info!("Attribute {attribute} queued until evolution completes");
        return;
    }
    apply_attribute(player, attribute, config, out);
}

fn apply_attribute(
    player: &mut Player,
    attribute: AttributeKind,
    config: &ProgressionConfig,
    out: &mut Vec<GameEvent>,
) {
    player.attribute = attribute;
    select_path(player, config);
    recalculate_stats(player, config, out);
    log::info!("Attribute changed to {attribute}");
    out.push(GameEvent::AttributeChanged { attribute });
}

/// Current levels of every stat, for persistence
pub fn stat_levels(player: &Player) -> StatLevels {
    player.stats.levels()
}

/// Stage the player should evolve into, if any.
///
/// The highest stage of the current path whose requirement is met, when it differs
/// from the active stage.
pub fn evolution_candidate(player: &Player, config: &ProgressionConfig) -> Option<usize> {
    let path = config.evolution_paths.get(player.path?)?;
    let best = path.active_stage(player.progression.level)?;
    (Some(best) != player.stage).then_some(best)
}

/// Enter the evolving state: movement stops and control is withheld until
/// [`advance_evolution`] completes the sequence. Ignored if already evolving.
pub fn begin_evolution(
    player: &mut Player,
    stage: usize,
    config: &ProgressionConfig,
    out: &mut Vec<GameEvent>,
) {
    if player.progression.is_evolving {
        return;
    }
    let Some(info) = player
        .path
        .and_then(|p| config.evolution_paths.get(p))
        .and_then(|path| path.stage_info(stage))
    else {
        return;
    };

    player.progression.is_evolving = true;
    player.motion.stop_movement();
    player.motion.control_enabled = false;
    player.evolution = Countdown::once(config.evolution_duration);
    log::info!("Evolving into {}", info.name);
    out.push(GameEvent::EvolutionStarted { stage: info });
}

/// Run the evolution timer; on completion apply any queued attribute, swap the stage,
/// reapply multipliers, restore control and check again for a further stage.
pub fn advance_evolution(
    player: &mut Player,
    dt: f32,
    config: &ProgressionConfig,
    out: &mut Vec<GameEvent>,
) {
    if !player.progression.is_evolving || player.evolution.tick(dt) == 0 {
        return;
    }

    if let Some(attribute) = player.pending_attribute.take() {
        apply_attribute(player, attribute, config, out);
    }

    let target = player
        .path
        .and_then(|p| config.evolution_paths.get(p))
        .and_then(|path| path.active_stage(player.progression.level));
    if target.is_some() {
        player.stage = target;
    }
    recalculate_stats(player, config, out);

    player.motion.control_enabled = true;
    player.progression.is_evolving = false;

    if let Some(info) = active_stage_info(player, config) {
        log::info!("Evolution complete: {}", info.name);
        out.push(GameEvent::EvolutionComplete { stage: info });
    }

    if let Some(next) = evolution_candidate(player, config) {
        begin_evolution(player, next, config, out);
    }
}

fn select_path(player: &mut Player, config: &ProgressionConfig) {
    player.path = find_path(&config.evolution_paths, player.attribute);
    match player.path {
        Some(p) => {
            player.stage = config.evolution_paths[p].active_stage(player.progression.level);
        }
        None => {
            log::warn!("No evolution path found for attribute {}", player.attribute);
            player.stage = None;
        }
    }
}

fn health_changed(player: &Player) -> GameEvent {
    GameEvent::HealthChanged {
        current: player.health,
        max: player.max_health(),
    }
}
