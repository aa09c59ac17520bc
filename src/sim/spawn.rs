//! Enemy spawn scheduling and selection
//!
//! While the run is `Running`, the controller spawns one enemy per cadence interval:
//! a weighted random pick among the rules unlocked by the current wave, placed on a
//! ring around the player and initialised with the difficulty at that moment.
//! The interval shrinks with the wave number down to a floor. Leaving `Running`
//! discards the current interval; the cadence restarts with an immediate spawn.

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enemy::Enemy;
use super::events::GameEvent;
use super::wave::WaveDirector;
use crate::ground_ring_point;
use crate::pool::{CategoryId, InstanceId, ObjectPool};

/// A (category, weight, minimum wave) selection rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRule {
    /// Pool category to draw from
    pub tag: String,
    /// Relative weight (>= 0)
    pub weight: f32,
    /// First wave at which the rule is eligible
    #[serde(default)]
    pub min_wave: u32,
}

impl SpawnRule {
    pub fn new(tag: &str, weight: f32, min_wave: u32) -> Self {
        Self {
            tag: tag.to_string(),
            weight,
            min_wave,
        }
    }

    pub fn is_eligible(&self, wave: u32) -> bool {
        self.min_wave <= wave
    }
}

/// Spawn cadence and placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub base_interval: f32,
    /// Seconds removed from the interval per wave
    pub interval_decrease_per_wave: f32,
    pub min_interval: f32,
    /// Distance from the player at which enemies appear
    pub spawn_radius: f32,
    pub rules: Vec<SpawnRule>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            base_interval: 2.0,
            interval_decrease_per_wave: 0.1,
            min_interval: 0.5,
            spawn_radius: 15.0,
            rules: vec![
                SpawnRule::new("normal", 10.0, 0),
                SpawnRule::new("speedy", 6.0, 1),
                SpawnRule::new("tank", 3.0, 3),
                SpawnRule::new("ranged", 4.0, 5),
            ],
        }
    }
}

impl SpawnConfig {
    /// `max(min, base - decrease * wave)`
    pub fn interval_for_wave(&self, wave: u32) -> f32 {
        (self.base_interval - self.interval_decrease_per_wave * wave as f32).max(self.min_interval)
    }
}

/// Weighted draw over `weights`.
///
/// Draws `r` in `[0, total)` and returns the first index whose cumulative weight reaches
/// `r` (zero-weight entries are never picked this way). Falls back to index 0 when the
/// total is not positive or float drift overshoots. `None` only for an empty slice.
pub fn pick_weighted<R: Rng + ?Sized>(weights: &[f32], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: f32 = weights.iter().map(|w| w.max(0.0)).sum();
    if total <= 0.0 {
        return Some(0);
    }

    let r = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, weight) in weights.iter().enumerate() {
        let weight = weight.max(0.0);
        cumulative += weight;
        if weight > 0.0 && cumulative >= r {
            return Some(i);
        }
    }
    Some(0)
}

#[derive(Debug, Clone)]
struct ResolvedRule {
    rule: SpawnRule,
    category: Option<CategoryId>,
}

/// Schedules and performs enemy spawns
#[derive(Debug, Clone)]
pub struct SpawnController {
    config: SpawnConfig,
    rules: Vec<ResolvedRule>,
    current_interval: f32,
    /// Seconds until the next spawn; `None` means spawn on the next running tick
    countdown: Option<f32>,
    total_spawned: u64,
}

impl SpawnController {
    /// Build the controller, resolving every rule's tag against `pool` once
    pub fn new(config: SpawnConfig, pool: &ObjectPool<Enemy>) -> Self {
        let rules = config
            .rules
            .iter()
            .map(|rule| {
                let category = pool.category(&rule.tag);
                if category.is_none() {
                    log::warn!(
                        "Spawn rule references unknown pool {}; it will never spawn",
                        rule.tag
                    );
                }
                ResolvedRule {
                    rule: rule.clone(),
                    category,
                }
            })
            .collect();

        Self {
            current_interval: config.base_interval,
            config,
            rules,
            countdown: None,
            total_spawned: 0,
        }
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    pub fn current_interval(&self) -> f32 {
        self.current_interval
    }

    /// Seconds until the next spawn, if the cadence is running
    pub fn time_until_next(&self) -> Option<f32> {
        self.countdown
    }

    pub fn total_spawned(&self) -> u64 {
        self.total_spawned
    }

    /// Drop the in-flight interval (called whenever the run leaves `Running`)
    pub fn suspend(&mut self) {
        self.countdown = None;
    }

    /// Rules eligible at `wave`, in configuration order
    pub fn eligible_rules(&self, wave: u32) -> Vec<&SpawnRule> {
        self.rules
            .iter()
            .map(|r| &r.rule)
            .filter(|r| r.is_eligible(wave))
            .collect()
    }

    /// Pick an eligible rule for `wave`; `None` when nothing is unlocked yet
    pub fn select_rule<R: Rng + ?Sized>(&self, wave: u32, rng: &mut R) -> Option<&SpawnRule> {
        let eligible = self.eligible_rules(wave);
        let weights: Vec<f32> = eligible.iter().map(|r| r.weight).collect();
        pick_weighted(&weights, rng).map(|i| eligible[i])
    }

    /// Advance the cadence by `dt` and spawn whatever came due.
    ///
    /// Must run after the director's tick so selection sees the post-advance wave.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        director: &WaveDirector,
        pool: &mut ObjectPool<Enemy>,
        rng: &mut R,
        player_pos: Vec3,
        out: &mut Vec<GameEvent>,
    ) -> Vec<InstanceId> {
        if !director.is_running() {
            self.suspend();
            return Vec::new();
        }

        let mut budget = match self.countdown {
            None => 0.0,
            Some(remaining) => remaining - dt,
        };
        if budget > 0.0 {
            self.countdown = Some(budget);
            return Vec::new();
        }

        let mut spawned = Vec::new();
        while budget <= 0.0 {
            if let Some(id) = self.spawn_once(director, pool, rng, player_pos, out) {
                spawned.push(id);
            }
            self.current_interval = self.config.interval_for_wave(director.current_wave());
            if self.current_interval <= 0.0 {
                budget = 0.0;
                break;
            }
            budget += self.current_interval;
        }
        self.countdown = Some(budget.max(0.0));
        spawned
    }

    /// Perform a single spawn cycle (selection, placement, initialisation)
    pub fn spawn_once<R: Rng + ?Sized>(
        &mut self,
        director: &WaveDirector,
        pool: &mut ObjectPool<Enemy>,
        rng: &mut R,
        player_pos: Vec3,
        out: &mut Vec<GameEvent>,
    ) -> Option<InstanceId> {
        let wave = director.current_wave();
        let eligible: Vec<&ResolvedRule> = self
            .rules
            .iter()
            .filter(|r| r.rule.is_eligible(wave))
            .collect();
        let weights: Vec<f32> = eligible.iter().map(|r| r.rule.weight).collect();
        let chosen = eligible[pick_weighted(&weights, rng)?];

        let Some(category) = chosen.category else {
            log::debug!("Skipping spawn of unknown pool {}", chosen.rule.tag);
            return None;
        };

        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let position = ground_ring_point(player_pos, self.config.spawn_radius, angle);
        let id = pool.acquire_in(category, position, Quat::IDENTITY);

        let difficulty = director.current_difficulty();
        if let Some(instance) = pool.get_mut(id) {
            instance.item.initialize(difficulty, player_pos);
        }

        self.total_spawned += 1;
        log::debug!(
            "Spawned {} #{} at ({:.1}, {:.1}) difficulty {:.2}",
            chosen.rule.tag,
            id.index(),
            position.x,
            position.z,
            difficulty
        );
        out.push(GameEvent::EnemySpawned {
            tag: chosen.rule.tag.clone(),
            id,
        });
        Some(id)
    }
}
