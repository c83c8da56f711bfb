//! Harbor Lines - a shipping-route arcade game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (ports, routes, ships, storms, upgrades)
//! - `platform`: Interfaces to the host (clock, randomness, textures, callbacks)
//! - `config`: Data-driven game balance
//! - `highscores`: In-memory leaderboard used as the final score sink

pub mod config;
pub mod error;
pub mod highscores;
pub mod platform;
pub mod sim;

pub use config::GameConfig;
pub use error::{ConfigError, DrawRejection};
pub use highscores::{HighScores, ScoreSink};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz is plenty for waypoint movement)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta accepted from the host clock
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Seconds an overloaded port survives before the run ends
    pub const OVERLOAD_SECONDS: f32 = 30.0;
    /// Delay between the fatal countdown expiring and the game-over signal
    pub const GAME_OVER_GRACE_SECONDS: f32 = 1.5;
    /// Granularity of the overload countdown
    pub const OVERLOAD_TICK_SECONDS: f32 = 1.0;

    /// Shortest leg a ship will ever be scheduled for (coincident waypoints)
    pub const MIN_LEG_SECONDS: f32 = 0.01;

    /// Playfield defaults (portrait phone in points)
    pub const PLAYFIELD_WIDTH: f32 = 390.0;
    pub const PLAYFIELD_HEIGHT: f32 = 844.0;
}

/// Whether `a` lies within `radius` of `b` (inclusive)
#[inline]
pub fn within_radius(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) <= radius * radius
}

/// Position along the segment `from -> to` at parameter `t` (clamped to [0, 1])
#[inline]
pub fn lerp_clamped(from: Vec2, to: Vec2, t: f32) -> Vec2 {
    from.lerp(to, t.clamp(0.0, 1.0))
}
