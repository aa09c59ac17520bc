//! Cube Survivor - wave-survival progression and spawning engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (waves, spawning, enemies, player progression)
//! - `pool`: Category-keyed pool of reusable instances
//! - `session`: A run wired to persistence and event observers
//! - `persistence`: Progress/settings storage collaborators
//! - `tuning`: Data-driven game balance

pub mod persistence;
pub mod pool;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use persistence::{MemoryStore, PersistenceError, ProgressStore, ProgressionSnapshot};
pub use session::Session;
pub use settings::Settings;
pub use tuning::{ConfigError, Tuning};

use glam::Vec3;

/// Simulation constants that are not balance data
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame fed into the accumulator
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Downward acceleration on the player body (units/s²)
    pub const GRAVITY: f32 = 9.81;
    /// Height of the ground plane
    pub const GROUND_HEIGHT: f32 = 0.0;
}

/// Project onto the ground plane
#[inline]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Point at `radius` from `center` in direction `angle` (radians from +Z), on the ground
#[inline]
pub fn ground_ring_point(center: Vec3, radius: f32, angle: f32) -> Vec3 {
    Vec3::new(
        center.x + angle.sin() * radius,
        consts::GROUND_HEIGHT,
        center.z + angle.cos() * radius,
    )
}

/// Install the platform log backend (`RUST_LOG` on native, the browser console on wasm)
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_ring_point() {
        let center = Vec3::new(2.0, 5.0, -1.0);
        let p = ground_ring_point(center, 15.0, 0.0);
        assert_eq!(p, Vec3::new(2.0, 0.0, 14.0));

        let p = ground_ring_point(center, 15.0, std::f32::consts::FRAC_PI_2);
        assert!((p.x - 17.0).abs() < 1e-4);
        assert!((p.z + 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_flatten_drops_height() {
        assert_eq!(flatten(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 0.0, 3.0));
    }
}
