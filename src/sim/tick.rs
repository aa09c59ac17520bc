//! Fixed timestep simulation tick
//!
//! Advances every component in a fixed order so spawn decisions always see the wave
//! and difficulty of the current tick.

use super::player::MoveInput;
use super::progression;
use super::state::{GameState, SessionTimer};
use super::wave::GamePhase;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Normalised movement intent and jump trigger
    pub movement: MoveInput,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.pause {
        match state.phase() {
            GamePhase::Running => {
                state.pause();
                return;
            }
            GamePhase::Paused => {
                state.resume();
            }
            _ => {}
        }
    }

    // Nothing accrues outside Running, so every timer is frozen while paused
    if state.phase() != GamePhase::Running {
        return;
    }
    state.time_ticks += 1;

    // Waves and difficulty first; spawning reads the advanced values
    state.director.tick(dt, &mut state.events);

    let player_pos = state.player.position();
    state.spawner.update(
        dt,
        &state.director,
        &mut state.enemies,
        &mut state.rng,
        player_pos,
        &mut state.events,
    );

    state
        .player
        .update_motion(&input.movement, &state.tuning.player, dt);
    progression::advance_evolution(
        &mut state.player,
        dt,
        &state.tuning.progression,
        &mut state.events,
    );

    let player_pos = state.player.position();
    let hits: Vec<f32> = state
        .enemies
        .iter_active_mut()
        .filter_map(|instance| instance.item.update(&mut instance.transform, player_pos, dt))
        .collect();
    for damage in hits {
        progression::take_damage(&mut state.player, damage, &mut state.events);
    }

    for timer in state.timers.advance(dt) {
        match timer {
            SessionTimer::AttributePulse => state.attribute_pulse(),
            SessionTimer::PlayerStrike => state.player_strike(),
            SessionTimer::PassiveExperience => {
                let amount = state.tuning.player.passive_experience_per_second;
                if amount > 0.0 {
                    progression::gain_experience(
                        &mut state.player,
                        amount,
                        &state.tuning.progression,
                        &mut state.events,
                    );
                }
            }
            SessionTimer::Autosave => {
                state.events.push(super::events::GameEvent::Checkpoint {
                    elapsed: state.director.elapsed_time(),
                });
            }
        }
    }

    state.collect_defeated();

    if state.player.is_dead() {
        state.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::events::GameEvent;
    use crate::sim::spawn::SpawnRule;
    use crate::sim::state::Loadout;
    use crate::tuning::Tuning;
    use glam::Vec2;

    fn started(tuning: Tuning, seed: u64) -> GameState {
        let mut state = GameState::new(tuning, seed, &Loadout::default());
        state.start();
        state.take_events();
        state
    }

    fn scripted_input(step: u64) -> TickInput {
        let angle = step as f32 * 0.01;
        TickInput {
            movement: MoveInput {
                direction: Vec2::new(angle.cos(), angle.sin()),
                jump: step % 240 == 0,
            },
            pause: false,
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = started(Tuning::default(), 99);
        let mut b = started(Tuning::default(), 99);

        for step in 0..3_600 {
            let input = scripted_input(step);
            tick(&mut a, &input, SIM_DT);
            tick(&mut b, &input, SIM_DT);
        }

        assert_eq!(a.take_events(), b.take_events());
        assert_eq!(a.player.position(), b.player.position());
        assert_eq!(a.director.state(), b.director.state());
        let positions = |s: &GameState| {
            s.enemies
                .iter_active()
                .map(|i| (i.id, i.transform.position))
                .collect::<Vec<_>>()
        };
        assert_eq!(positions(&a), positions(&b));
        assert!(a.spawner.total_spawned() > 0);
    }

    #[test]
    fn test_spawn_sees_wave_advanced_this_tick() {
        let mut tuning = Tuning::default();
        tuning.wave.wave_interval = 1.0;
        tuning.spawn.base_interval = 0.01;
        tuning.spawn.min_interval = 0.01;
        tuning.spawn.rules = vec![SpawnRule::new("normal", 1.0, 1)];
        let mut state = started(tuning, 1);

        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            let events = state.take_events();
            let wave_at = events
                .iter()
                .position(|e| matches!(e, GameEvent::WaveChanged { wave: 1 }));
            if let Some(wave_at) = wave_at {
                let spawn_at = events
                    .iter()
                    .position(|e| matches!(e, GameEvent::EnemySpawned { .. }));
                assert!(spawn_at.is_some_and(|s| s > wave_at));
                return;
            }
            assert!(!events.iter().any(|e| matches!(e, GameEvent::EnemySpawned { .. })));
        }
        panic!("wave 1 never started");
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut state = started(Tuning::default(), 3);
        for _ in 0..300 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, SIM_DT);
        assert_eq!(state.phase(), GamePhase::Paused);

        let elapsed = state.director.elapsed_time();
        let spawned = state.spawner.total_spawned();
        let clock = state.timers.now();
        for _ in 0..6_000 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.director.elapsed_time(), elapsed);
        assert_eq!(state.spawner.total_spawned(), spawned);
        assert_eq!(state.timers.now(), clock);

        // resuming spawns straight away on a fresh cadence
        tick(&mut state, &pause, SIM_DT);
        assert_eq!(state.phase(), GamePhase::Running);
        assert_eq!(state.spawner.total_spawned(), spawned + 1);
    }

    #[test]
    fn test_player_death_ends_run() {
        let mut state = started(Tuning::default(), 5);
        tick(&mut state, &TickInput::default(), SIM_DT);
        progression::take_damage(&mut state.player, 10_000.0, &mut state.events);
        tick(&mut state, &TickInput::default(), SIM_DT);

        assert_eq!(state.phase(), GamePhase::Ended);
        let events = state.take_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::GameOver { .. })));

        let elapsed = state.director.elapsed_time();
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.director.elapsed_time(), elapsed);
    }

    #[test]
    fn test_passive_experience_and_checkpoints() {
        let mut tuning = Tuning::default();
        tuning.spawn.rules.clear();
        tuning.session.autosave_interval = 2.0;
        let mut state = started(tuning, 8);

        // a little over 2 seconds
        for _ in 0..125 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert!((state.player.experience() - 2.0).abs() < 1e-4);
        let checkpoints = state
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Checkpoint { .. }))
            .count();
        assert_eq!(checkpoints, 1);
    }
}
