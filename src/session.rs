//! A run wired to its collaborators
//!
//! [`Session`] owns the [`GameState`], the injected [`ProgressStore`] and the
//! [`EventBus`]. After every tick it drains the state's events, folds checkpoints and
//! game-over into the progress snapshot, saves, then dispatches to observers.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::persistence::{ProgressStore, ProgressionSnapshot};
use crate::settings::Settings;
use crate::sim::attribute::AttributeKind;
use crate::sim::events::{EventBus, GameEvent, SubscriptionId, Topic};
use crate::sim::progression::UpgradeError;
use crate::sim::state::{GameState, Loadout};
use crate::sim::stats::StatKind;
use crate::sim::tick::{TickInput, tick};
use crate::sim::wave::GamePhase;
use crate::tuning::Tuning;

pub struct Session {
    state: GameState,
    store: Box<dyn ProgressStore>,
    bus: EventBus,
    snapshot: ProgressionSnapshot,
    settings: Settings,
    accumulator: f32,
    /// Running time of the current run already folded into the snapshot
    recorded_time: f32,
    /// Kills of the current run already folded into the snapshot
    recorded_kills: u32,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.state.phase())
            .field("snapshot", &self.snapshot)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Restore progress and settings from `store` and build an idle run.
    ///
    /// Unreadable records fall back to defaults with a warning.
    pub fn new(tuning: Tuning, seed: u64, store: Box<dyn ProgressStore>) -> Self {
        let snapshot = store.load_progress().unwrap_or_else(|e| {
            log::warn!("Could not load progress, starting fresh: {e}");
            ProgressionSnapshot::default()
        });
        let settings = Settings::load(store.as_ref());

        let loadout = Loadout {
            stat_levels: snapshot.stat_levels,
            attribute: snapshot.attribute,
            gold: snapshot.gold,
        };
        let state = GameState::new(tuning, seed, &loadout);

        Self {
            state,
            store,
            bus: EventBus::new(),
            snapshot,
            settings,
            accumulator: 0.0,
            recorded_time: 0.0,
            recorded_kills: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn snapshot(&self) -> &ProgressionSnapshot {
        &self.snapshot
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase()
    }

    pub fn subscribe(
        &mut self,
        topic: Topic,
        handler: impl FnMut(&GameEvent) + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(topic, handler)
    }

    pub fn subscribe_all(&mut self, handler: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.bus.subscribe_all(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn start(&mut self) -> bool {
        let started = self.state.start();
        if started {
            self.accumulator = 0.0;
            self.recorded_time = 0.0;
            self.recorded_kills = 0;
        }
        self.pump();
        started
    }

    pub fn pause(&mut self) -> bool {
        let paused = self.state.pause();
        self.pump();
        paused
    }

    pub fn resume(&mut self) -> bool {
        let resumed = self.state.resume();
        self.pump();
        resumed
    }

    /// End the run, recording its play time
    pub fn end(&mut self) -> Option<f32> {
        let elapsed = self.state.end();
        self.pump();
        elapsed
    }

    /// Run exactly one fixed tick
    pub fn step(&mut self, input: &TickInput) {
        tick(&mut self.state, input, SIM_DT);
        self.pump();
    }

    /// Feed a variable frame time into the fixed-step accumulator.
    ///
    /// One-shot inputs (pause) apply to the first substep only. Non-finite frame times
    /// count as zero. Returns the number of ticks run.
    pub fn advance(&mut self, frame_dt: f32, input: &TickInput) -> u32 {
        if frame_dt.is_finite() {
            self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);
        }

        let mut input = *input;
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
            input.pause = false;
            input.movement.jump = false;
        }
        self.pump();
        substeps
    }

    /// Buy a stat upgrade and persist the new loadout
    pub fn upgrade_stat(&mut self, stat: StatKind) -> Result<f32, UpgradeError> {
        let result = self.state.upgrade_stat(stat);
        if result.is_ok() {
            self.save();
        }
        self.pump();
        result
    }

    pub fn set_attribute(&mut self, attribute: AttributeKind) {
        self.state.set_attribute(attribute);
        self.save();
        self.pump();
    }

    /// Change settings and persist them
    pub fn update_settings(&mut self, change: impl FnOnce(&mut Settings)) {
        change(&mut self.settings);
        if let Err(e) = self.settings.save(self.store.as_mut()) {
            log::warn!("Failed to save settings: {e}");
        }
    }

    /// Fold the run into the snapshot and write it out
    pub fn save(&mut self) {
        self.record_progress();
        match self.store.save_progress(&self.snapshot) {
            Ok(()) => log::info!(
                "Progress saved ({:.0}s played, {} kills)",
                self.snapshot.play_time,
                self.snapshot.total_kills
            ),
            Err(e) => log::warn!("Failed to save progress: {e}"),
        }
    }

    fn record_progress(&mut self) {
        let director = &self.state.director;
        let elapsed = director.elapsed_time();
        let kills = director.kill_count();

        self.snapshot.play_time += (elapsed - self.recorded_time).max(0.0);
        self.snapshot.total_kills += u64::from(kills.saturating_sub(self.recorded_kills));
        self.recorded_time = elapsed;
        self.recorded_kills = kills;

        self.snapshot.highest_wave = self.snapshot.highest_wave.max(director.current_wave());
        self.snapshot.best_level = self.snapshot.best_level.max(self.state.player.level());

        let loadout = self.state.loadout();
        self.snapshot.stat_levels = loadout.stat_levels;
        self.snapshot.attribute = loadout.attribute;
        self.snapshot.gold = loadout.gold;
    }

    /// Drain state events, persist where needed, then notify observers
    fn pump(&mut self) {
        let events = self.state.take_events();
        if events.is_empty() {
            return;
        }

        let mut needs_save = false;
        for event in &events {
            match event {
                GameEvent::Checkpoint { .. } | GameEvent::GameOver { .. } => needs_save = true,
                GameEvent::EvolutionComplete { stage } => {
                    if self.snapshot.unlock_cube(&stage.name, stage.attribute) {
                        log::info!("Unlocked {}", stage.name);
                        needs_save = true;
                    }
                }
                _ => {}
            }
        }
        if needs_save {
            self.save();
        }

        self.bus.publish(events);
        self.bus.dispatch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, PROGRESS_KEY};
    use crate::sim::progression;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn quiet_tuning() -> Tuning {
        let mut tuning = Tuning::default();
        tuning.spawn.rules.clear();
        tuning
    }

    fn run_seconds(session: &mut Session, seconds: u32) {
        for _ in 0..seconds * 60 {
            session.step(&TickInput::default());
        }
    }

    #[test]
    fn test_restores_loadout_from_store() {
        let mut store = MemoryStore::new();
        let mut saved = ProgressionSnapshot {
            gold: 500,
            attribute: AttributeKind::Fire,
            ..Default::default()
        };
        saved.stat_levels.attack = 3;
        store.save_progress(&saved).unwrap();

        let session = Session::new(quiet_tuning(), 1, Box::new(store));
        let player = &session.state().player;
        assert_eq!(player.gold(), 500);
        assert_eq!(player.attribute(), AttributeKind::Fire);
        assert_eq!(player.stats().attack.level, 3);
    }

    #[test]
    fn test_corrupt_progress_starts_fresh() {
        let mut store = MemoryStore::new();
        store.write_record(PROGRESS_KEY, "garbage").unwrap();
        let session = Session::new(quiet_tuning(), 1, Box::new(store));
        assert_eq!(*session.snapshot(), ProgressionSnapshot::default());
    }

    #[test]
    fn test_autosave_checkpoints_play_time() {
        let store = MemoryStore::new();
        let mut session = Session::new(quiet_tuning(), 2, Box::new(store.clone()));
        session.start();
        assert!(store.raw(PROGRESS_KEY).is_none());

        run_seconds(&mut session, 31);
        let saved = store.load_progress().unwrap();
        assert!((saved.play_time - 30.0).abs() < 0.05, "play time {}", saved.play_time);
    }

    #[test]
    fn test_end_records_total_play_time() {
        let store = MemoryStore::new();
        let mut session = Session::new(quiet_tuning(), 3, Box::new(store.clone()));
        session.start();
        run_seconds(&mut session, 10);
        session.end();

        session.start();
        run_seconds(&mut session, 5);
        session.end();

        let saved = store.load_progress().unwrap();
        assert!((saved.play_time - 15.0).abs() < 0.05, "play time {}", saved.play_time);
    }

    #[test]
    fn test_death_saves_and_ends() {
        let store = MemoryStore::new();
        let mut session = Session::new(quiet_tuning(), 4, Box::new(store.clone()));
        session.start();
        run_seconds(&mut session, 2);

        let state = session.state_mut();
        progression::take_damage(&mut state.player, 1e6, &mut state.events);
        session.step(&TickInput::default());

        assert_eq!(session.phase(), GamePhase::Ended);
        assert!(store.load_progress().unwrap().play_time > 1.9);
    }

    #[test]
    fn test_upgrade_persists_loadout() {
        let mut store = MemoryStore::new();
        store
            .save_progress(&ProgressionSnapshot {
                gold: 300,
                ..Default::default()
            })
            .unwrap();
        let mut session = Session::new(quiet_tuning(), 5, Box::new(store.clone()));

        session.upgrade_stat(StatKind::Defense).unwrap();
        let saved = store.load_progress().unwrap();
        assert_eq!(saved.stat_levels.defense, 2);
        assert_eq!(saved.gold, 190);

        // 100 * 1.1^2
        session.upgrade_stat(StatKind::Defense).unwrap();
        assert_eq!(session.state().player.gold(), 69);
        assert!(session.upgrade_stat(StatKind::Defense).is_err());
    }

    #[test]
    fn test_observers_receive_and_unsubscribe() {
        let mut session = Session::new(quiet_tuning(), 6, Box::new(MemoryStore::new()));
        let phases = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&phases);
        let id = session.subscribe(Topic::Session, move |e| {
            if let GameEvent::PhaseChanged { phase } = e {
                sink.borrow_mut().push(*phase);
            }
        });

        session.start();
        session.pause();
        assert!(session.unsubscribe(id));
        session.resume();

        assert_eq!(*phases.borrow(), vec![GamePhase::Running, GamePhase::Paused]);
    }

    #[test]
    fn test_advance_runs_fixed_substeps() {
        let mut session = Session::new(quiet_tuning(), 7, Box::new(MemoryStore::new()));
        session.start();
        let input = TickInput::default();
        assert_eq!(session.advance(SIM_DT, &input), 1);
        assert_eq!(session.advance(SIM_DT * 0.5, &input), 0);
        assert_eq!(session.advance(SIM_DT * 0.5, &input), 1);
        assert_eq!(session.state().time_ticks, 2);

        // long frames are capped
        assert!(session.advance(5.0, &input) <= MAX_SUBSTEPS);
    }

    #[test]
    fn test_bad_frame_time_does_not_stall() {
        let mut session = Session::new(quiet_tuning(), 9, Box::new(MemoryStore::new()));
        session.start();
        let input = TickInput::default();
        assert_eq!(session.advance(f32::NAN, &input), 0);
        assert_eq!(session.advance(f32::INFINITY, &input), 0);
        assert_eq!(session.advance(-1.0, &input), 0);
        assert_eq!(session.advance(SIM_DT, &input), 1);
        assert_eq!(session.state().time_ticks, 1);
    }

    #[test]
    fn test_settings_changes_persist() {
        let store = MemoryStore::new();
        let mut session = Session::new(quiet_tuning(), 8, Box::new(store.clone()));
        session.update_settings(|s| s.set_bgm_volume(0.3));
        assert!((Settings::load(&store).bgm_volume - 0.3).abs() < 1e-6);
    }
}
