//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by instance ID)
//! - No rendering, storage or platform dependencies

pub mod attribute;
pub mod enemy;
pub mod events;
pub mod evolution;
pub mod player;
pub mod progression;
pub mod spawn;
pub mod state;
pub mod stats;
pub mod tick;
pub mod timer;
pub mod wave;

pub use attribute::{AreaEffect, AttributeEffect, AttributeKind, PulseConfig};
pub use enemy::{Enemy, EnemyArchetype, EnemyStats, EnemyTemplate};
pub use events::{EventBus, GameEvent, StageInfo, SubscriptionId, Topic};
pub use evolution::{EvolutionPath, EvolutionStage};
pub use player::{ForceMode, MoveInput, Player, PlayerConfig, ProgressionState};
pub use progression::{ProgressionConfig, UpgradeError};
pub use spawn::{SpawnConfig, SpawnController, SpawnRule};
pub use state::{GameState, Loadout, SessionTimer};
pub use stats::{Stat, StatBlock, StatDefaults, StatKind, StatLevels, StatTemplate};
pub use tick::{TickInput, tick};
pub use timer::{Countdown, TimerQueue};
pub use wave::{GamePhase, WaveConfig, WaveDirector, WaveState};
