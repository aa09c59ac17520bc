//! Change notifications emitted by the simulation
//!
//! Components push [`GameEvent`]s into an out-queue while they run; the driving loop
//! hands the queue to an [`EventBus`], which delivers each event to the observers
//! registered for its [`Topic`]. Observers are removed by the exact
//! [`SubscriptionId`] they were registered with.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::attribute::AttributeKind;
use super::stats::StatKind;
use super::wave::GamePhase;
use crate::pool::InstanceId;

/// Reference to an evolution stage as seen by listeners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageInfo {
    /// Attribute whose path the stage belongs to
    pub attribute: AttributeKind,
    /// Index of the stage inside its path
    pub index: usize,
    pub name: String,
    pub stat_multiplier: f32,
}

/// Everything the presentation/persistence collaborators can observe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    HealthChanged { current: f32, max: f32 },
    ExperienceGained { amount: f32 },
    LevelUp { level: u32 },
    StatUpgraded { stat: StatKind, value: f32 },
    AttributeChanged { attribute: AttributeKind },
    AttributeEffectTriggered { attribute: AttributeKind, position: Vec3 },
    EvolutionStarted { stage: StageInfo },
    EvolutionComplete { stage: StageInfo },
    PlayerDied,
    WaveChanged { wave: u32 },
    DifficultyIncreased { factor: f32 },
    KillCountChanged { count: u32 },
    PhaseChanged { phase: GamePhase },
    EnemySpawned { tag: String, id: InstanceId },
    EnemyDefeated { tag: String, id: InstanceId },
    /// Periodic play-time checkpoint (elapsed seconds of running time)
    Checkpoint { elapsed: f32 },
    GameOver { elapsed: f32, wave: u32, kills: u32 },
}

/// Coarse event categories observers subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Health,
    Experience,
    Level,
    Stats,
    Attribute,
    Evolution,
    Wave,
    Kills,
    Session,
    Enemies,
}

impl GameEvent {
    pub fn topic(&self) -> Topic {
        match self {
            GameEvent::HealthChanged { .. } | GameEvent::PlayerDied => Topic::Health,
            GameEvent::ExperienceGained { .. } => Topic::Experience,
            GameEvent::LevelUp { .. } => Topic::Level,
            GameEvent::StatUpgraded { .. } => Topic::Stats,
            GameEvent::AttributeChanged { .. } | GameEvent::AttributeEffectTriggered { .. } => {
                Topic::Attribute
            }
            GameEvent::EvolutionStarted { .. } | GameEvent::EvolutionComplete { .. } => {
                Topic::Evolution
            }
            GameEvent::WaveChanged { .. } | GameEvent::DifficultyIncreased { .. } => Topic::Wave,
            GameEvent::KillCountChanged { .. } => Topic::Kills,
            GameEvent::PhaseChanged { .. }
            | GameEvent::Checkpoint { .. }
            | GameEvent::GameOver { .. } => Topic::Session,
            GameEvent::EnemySpawned { .. } | GameEvent::EnemyDefeated { .. } => Topic::Enemies,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&GameEvent)>;

struct Observer {
    id: SubscriptionId,
    topic: Option<Topic>,
    handler: Handler,
}

/// Observer registry with typed topics
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Observer>,
    pending: Vec<GameEvent>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one topic
    pub fn subscribe(
        &mut self,
        topic: Topic,
        handler: impl FnMut(&GameEvent) + 'static,
    ) -> SubscriptionId {
        self.register(Some(topic), Box::new(handler))
    }

    /// Register a handler that sees every event
    pub fn subscribe_all(&mut self, handler: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.register(None, Box::new(handler))
    }

    /// Remove exactly the handler registered under `id`
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| o.id != id);
        before != self.observers.len()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Queue events for the next [`dispatch`](Self::dispatch)
    pub fn publish(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        self.pending.extend(events);
    }

    /// Deliver queued events in emission order and return them
    pub fn dispatch(&mut self) -> Vec<GameEvent> {
        let events = std::mem::take(&mut self.pending);
        for event in &events {
            let topic = event.topic();
            for observer in self.observers.iter_mut() {
                if observer.topic.is_none_or(|t| t == topic) {
                    (observer.handler)(event);
                }
            }
        }
        events
    }

    fn register(&mut self, topic: Option<Topic>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push(Observer { id, topic, handler });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_dispatch_filters_by_topic() {
        let mut bus = EventBus::new();
        let waves = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&waves);
        bus.subscribe(Topic::Wave, move |e| sink.borrow_mut().push(e.clone()));

        bus.publish([
            GameEvent::LevelUp { level: 2 },
            GameEvent::WaveChanged { wave: 1 },
        ]);
        let delivered = bus.dispatch();

        assert_eq!(delivered.len(), 2);
        assert_eq!(*waves.borrow(), vec![GameEvent::WaveChanged { wave: 1 }]);
    }

    #[test]
    fn test_unsubscribe_removes_only_that_handler() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0u32));
        let a = Rc::clone(&count);
        let b = Rc::clone(&count);
        let first = bus.subscribe_all(move |_| *a.borrow_mut() += 1);
        bus.subscribe_all(move |_| *b.borrow_mut() += 10);

        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        assert_eq!(bus.observer_count(), 1);

        bus.publish([GameEvent::PlayerDied]);
        bus.dispatch();
        assert_eq!(*count.borrow(), 10);
    }
}
