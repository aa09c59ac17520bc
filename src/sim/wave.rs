//! Wave and difficulty state machine
//!
//! `Idle -> Running <-> Paused -> Ended`. While running, elapsed time advances the
//! wave counter every `wave_interval` seconds and a separate periodic timer compounds
//! the difficulty factor. Nothing advances outside `Running`.

use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use super::timer::Countdown;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Not started (main menu)
    #[default]
    Idle,
    Running,
    Paused,
    /// Run over; only `start` leaves this phase
    Ended,
}

/// Wave pacing and difficulty curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Seconds between waves
    pub wave_interval: f32,
    /// Difficulty factor at start (>= 1)
    pub initial_difficulty: f32,
    /// Multiplier applied on every growth step (>= 1)
    pub difficulty_growth_step: f32,
    /// Seconds of running time between growth steps
    pub difficulty_growth_interval: f32,
    /// Linear difficulty added per wave
    pub wave_weight: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            wave_interval: 30.0,
            initial_difficulty: 1.1,
            difficulty_growth_step: 1.1,
            difficulty_growth_interval: 60.0,
            wave_weight: 0.1,
        }
    }
}

/// Read-only view of the director's counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveState {
    pub elapsed_time: f32,
    pub current_wave: u32,
    pub next_wave_time: f32,
    pub difficulty_factor: f32,
}

/// Single writer of wave/difficulty state
#[derive(Debug, Clone)]
pub struct WaveDirector {
    config: WaveConfig,
    phase: GamePhase,
    state: WaveState,
    kill_count: u32,
    growth: Countdown,
}

impl WaveDirector {
    pub fn new(config: WaveConfig) -> Self {
        Self {
            config,
            phase: GamePhase::Idle,
            state: Self::fresh_state(&config),
            kill_count: 0,
            growth: Countdown::disarmed(),
        }
    }

    fn fresh_state(config: &WaveConfig) -> WaveState {
        WaveState {
            elapsed_time: 0.0,
            current_wave: 0,
            next_wave_time: config.wave_interval,
            difficulty_factor: config.initial_difficulty.max(1.0),
        }
    }

    pub fn config(&self) -> &WaveConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn state(&self) -> WaveState {
        self.state
    }

    pub fn elapsed_time(&self) -> f32 {
        self.state.elapsed_time
    }

    pub fn current_wave(&self) -> u32 {
        self.state.current_wave
    }

    pub fn next_wave_time(&self) -> f32 {
        self.state.next_wave_time
    }

    pub fn difficulty_factor(&self) -> f32 {
        self.state.difficulty_factor
    }

    pub fn kill_count(&self) -> u32 {
        self.kill_count
    }

    /// `factor * (1 + wave * wave_weight)`: compounding time growth times linear wave growth
    pub fn current_difficulty(&self) -> f32 {
        let wave_scale = 1.0 + self.state.current_wave as f32 * self.config.wave_weight;
        self.state.difficulty_factor * wave_scale
    }

    /// Reset all counters and enter `Running`. Ignored while a run is in progress.
    pub fn start(&mut self, out: &mut Vec<GameEvent>) -> bool {
        if matches!(self.phase, GamePhase::Running | GamePhase::Paused) {
            log::warn!("Run already in progress; ignoring start");
            return false;
        }
        self.state = Self::fresh_state(&self.config);
        self.kill_count = 0;
        self.growth = Countdown::repeating(self.config.difficulty_growth_interval);
        log::info!("Run started (wave interval {}s)", self.config.wave_interval);
        self.set_phase(GamePhase::Running, out);
        true
    }

    /// Freeze progression. Counters and the growth timer keep their values.
    pub fn pause(&mut self, out: &mut Vec<GameEvent>) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        log::info!("Paused at {:.1}s", self.state.elapsed_time);
        self.set_phase(GamePhase::Paused, out);
        true
    }

    pub fn resume(&mut self, out: &mut Vec<GameEvent>) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        log::info!("Resumed at {:.1}s", self.state.elapsed_time);
        self.set_phase(GamePhase::Running, out);
        true
    }

    /// Stop the run for good. Returns the total elapsed running time.
    pub fn end(&mut self, out: &mut Vec<GameEvent>) -> Option<f32> {
        if !matches!(self.phase, GamePhase::Running | GamePhase::Paused) {
            return None;
        }
        self.growth.disarm();
        self.set_phase(GamePhase::Ended, out);
        log::info!(
            "Run ended after {:.1}s on wave {} with {} kills",
            self.state.elapsed_time,
            self.state.current_wave,
            self.kill_count
        );
        out.push(GameEvent::GameOver {
            elapsed: self.state.elapsed_time,
            wave: self.state.current_wave,
            kills: self.kill_count,
        });
        Some(self.state.elapsed_time)
    }

    /// Advance elapsed time, waves and difficulty growth. No-op unless running.
    pub fn tick(&mut self, dt: f32, out: &mut Vec<GameEvent>) {
        if self.phase != GamePhase::Running {
            return;
        }
        let dt = dt.max(0.0);
        self.state.elapsed_time += dt;

        if self.state.elapsed_time >= self.state.next_wave_time {
            self.state.current_wave += 1;
            self.state.next_wave_time = self.state.elapsed_time + self.config.wave_interval;
            log::info!("Wave {} begins", self.state.current_wave);
            out.push(GameEvent::WaveChanged {
                wave: self.state.current_wave,
            });
        }

        let steps = self.growth.tick(dt);
        if steps > 0 {
            let step = self.config.difficulty_growth_step.max(1.0);
            self.state.difficulty_factor *= step.powi(steps as i32);
            log::debug!("Difficulty factor now {:.3}", self.state.difficulty_factor);
            out.push(GameEvent::DifficultyIncreased {
                factor: self.state.difficulty_factor,
            });
        }
    }

    /// Record a defeated enemy
    pub fn add_kill(&mut self, out: &mut Vec<GameEvent>) {
        self.kill_count += 1;
        out.push(GameEvent::KillCountChanged {
            count: self.kill_count,
        });
    }

    fn set_phase(&mut self, phase: GamePhase, out: &mut Vec<GameEvent>) {
        self.phase = phase;
        out.push(GameEvent::PhaseChanged { phase });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn running() -> (WaveDirector, Vec<GameEvent>) {
        let mut director = WaveDirector::new(WaveConfig::default());
        let mut out = Vec::new();
        assert!(director.start(&mut out));
        (director, out)
    }

    fn run_for(director: &mut WaveDirector, seconds: f32, dt: f32, out: &mut Vec<GameEvent>) {
        let steps = (seconds / dt).round() as u32;
        for _ in 0..steps {
            director.tick(dt, out);
        }
    }

    #[test]
    fn test_start_resets_counters() {
        let (director, out) = running();
        assert_eq!(director.phase(), GamePhase::Running);
        assert_eq!(director.current_wave(), 0);
        assert_eq!(director.next_wave_time(), 30.0);
        assert!((director.difficulty_factor() - 1.1).abs() < 1e-6);
        assert_eq!(out, vec![GameEvent::PhaseChanged { phase: GamePhase::Running }]);
    }

    #[test]
    fn test_wave_advances_at_interval() {
        let (mut director, mut out) = running();
        run_for(&mut director, 29.5, 0.5, &mut out);
        assert_eq!(director.current_wave(), 0);
        director.tick(0.5, &mut out);
        assert_eq!(director.current_wave(), 1);
        assert_eq!(director.next_wave_time(), 60.0);
        assert!(out.contains(&GameEvent::WaveChanged { wave: 1 }));
    }

    #[test]
    fn test_pause_excludes_paused_time() {
        let (mut director, mut out) = running();
        run_for(&mut director, 45.0, 0.5, &mut out);
        assert_eq!(director.current_wave(), 1);

        assert!(director.pause(&mut out));
        run_for(&mut director, 100.0, 0.5, &mut out);
        assert_eq!(director.elapsed_time(), 45.0);
        assert!(director.resume(&mut out));

        run_for(&mut director, 14.5, 0.5, &mut out);
        assert_eq!(director.current_wave(), 1);
        director.tick(0.5, &mut out);
        assert_eq!(director.current_wave(), 2);
        assert_eq!(director.elapsed_time(), 60.0);
    }

    #[test]
    fn test_difficulty_grows_periodically() {
        let (mut director, mut out) = running();
        run_for(&mut director, 60.0, 0.5, &mut out);
        assert!((director.difficulty_factor() - 1.21).abs() < 1e-4);
        // wave 2 reached at t=60 as well
        assert_eq!(director.current_wave(), 2);
        assert!((director.current_difficulty() - 1.21 * 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_growth_suspended_while_paused() {
        let (mut director, mut out) = running();
        run_for(&mut director, 50.0, 0.5, &mut out);
        director.pause(&mut out);
        run_for(&mut director, 30.0, 0.5, &mut out);
        director.resume(&mut out);
        run_for(&mut director, 9.5, 0.5, &mut out);
        assert!((director.difficulty_factor() - 1.1).abs() < 1e-6);
        director.tick(0.5, &mut out);
        assert!((director.difficulty_factor() - 1.21).abs() < 1e-4);
    }

    #[test]
    fn test_end_is_terminal_until_restart() {
        let (mut director, mut out) = running();
        run_for(&mut director, 10.0, 0.5, &mut out);
        director.add_kill(&mut out);
        assert_eq!(director.end(&mut out), Some(10.0));
        assert!(out.contains(&GameEvent::GameOver { elapsed: 10.0, wave: 0, kills: 1 }));

        director.tick(5.0, &mut out);
        assert_eq!(director.elapsed_time(), 10.0);
        assert!(!director.resume(&mut out));
        assert_eq!(director.end(&mut out), None);

        assert!(director.start(&mut out));
        assert_eq!(director.elapsed_time(), 0.0);
        assert_eq!(director.kill_count(), 0);
    }

    #[test]
    fn test_start_ignored_while_running() {
        let (mut director, mut out) = running();
        director.tick(5.0, &mut out);
        assert!(!director.start(&mut out));
        assert_eq!(director.elapsed_time(), 5.0);
    }

    proptest! {
        #[test]
        fn prop_difficulty_monotonic_while_running(
            steps in proptest::collection::vec(0.0f32..5.0, 1..200)
        ) {
            let (mut director, mut out) = running();
            let mut last = director.current_difficulty();
            for dt in steps {
                director.tick(dt, &mut out);
                let now = director.current_difficulty();
                prop_assert!(now >= last);
                last = now;
            }
        }
    }
}
