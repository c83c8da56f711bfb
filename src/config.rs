//! Game balance configuration
//!
//! Every tunable the simulation reads lives here. Defaults reproduce the
//! shipped balance; hosts may override any subset from JSON.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::{LineColor, Rect};

/// A score threshold at which another route line becomes available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineUnlock {
    pub score: u64,
    pub color: LineColor,
}

/// Tunable simulation constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Ships ===
    /// Base ship speed along a route (points/s)
    pub ship_speed: f32,
    /// Speed while a departing ship is still within the port's detection radius
    pub in_port_speed: f32,
    /// Multiplier applied to ship speed inside the active storm
    pub storm_slowdown: f32,
    /// Starting hold size for every new ship
    pub ship_capacity: usize,

    // === Ports ===
    /// Soft buffer cap; exceeding it starts the overload countdown
    pub max_buffer: usize,
    /// Overload countdown length (seconds)
    pub overload_seconds: f32,
    /// Delay between countdown expiry and the game-over signal
    pub game_over_grace_seconds: f32,
    /// Distance at which a waypoint counts as "at" a port
    pub port_detection_radius: f32,
    /// Distance at which a stroke endpoint snaps onto a port
    pub port_snap_radius: f32,

    // === Drawing ===
    /// Distance from a line's free end at which a touch extends that end
    pub end_pick_radius: f32,
    /// Max gap between first and last point for a line to close into a loop
    pub loop_close_tolerance: f32,

    // === Spawning ===
    pub port_spawn_interval: f32,
    pub storm_spawn_interval: f32,
    pub upgrade_interval: f32,
    /// How long each upgrade prompt step stays open
    pub upgrade_prompt_seconds: f32,
    /// Upgrade kinds offered per prompt
    pub upgrade_choice_count: usize,
    /// Cargo production interval at score 0
    pub cargo_interval_start: f32,
    /// Cargo production interval once the ramp completes
    pub cargo_interval_floor: f32,
    /// Score at which the cargo interval reaches its floor
    pub cargo_ramp_score: u64,
    pub port_spawn_attempts: u32,
    /// Minimum distance between two port centers
    pub port_min_spacing: f32,
    /// Extra clearance kept between a new port and any island edge
    pub island_clearance: f32,
    pub storm_radius: f32,
    pub initial_ports: usize,
    pub island_count: usize,
    pub island_radius: f32,

    // === Upgrades ===
    /// Compounding multiplier applied by a speed upgrade
    pub speed_upgrade_factor: f32,
    /// Hold slots added by a capacity upgrade
    pub capacity_upgrade_amount: usize,

    // === Playfield ===
    pub playfield: Rect,
    /// Inset from the playfield edge for any spawn
    pub spawn_margin: f32,
    /// Screen regions covered by HUD chrome where nothing may spawn
    pub occluded_regions: Vec<Rect>,
    /// Score thresholds unlocking each line color (0 = available at start)
    pub line_unlocks: Vec<LineUnlock>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ship_speed: 90.0,
            in_port_speed: 35.0,
            storm_slowdown: 0.5,
            ship_capacity: 6,

            max_buffer: 6,
            overload_seconds: OVERLOAD_SECONDS,
            game_over_grace_seconds: GAME_OVER_GRACE_SECONDS,
            port_detection_radius: 20.0,
            port_snap_radius: 32.0,

            end_pick_radius: 40.0,
            loop_close_tolerance: 12.0,

            port_spawn_interval: 30.0,
            storm_spawn_interval: 60.0,
            upgrade_interval: 90.0,
            upgrade_prompt_seconds: 15.0,
            upgrade_choice_count: 2,
            cargo_interval_start: 2.5,
            cargo_interval_floor: 0.05,
            cargo_ramp_score: 500,
            port_spawn_attempts: 50,
            port_min_spacing: 90.0,
            island_clearance: 30.0,
            storm_radius: 110.0,
            initial_ports: 3,
            island_count: 3,
            island_radius: 40.0,

            speed_upgrade_factor: 1.25,
            capacity_upgrade_amount: 1,

            playfield: Rect::new(Vec2::ZERO, Vec2::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT)),
            spawn_margin: 40.0,
            occluded_regions: vec![
                // Score / pause bar
                Rect::new(Vec2::ZERO, Vec2::new(PLAYFIELD_WIDTH, 100.0)),
                // Line color picker
                Rect::new(
                    Vec2::new(0.0, PLAYFIELD_HEIGHT - 110.0),
                    Vec2::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT),
                ),
            ],
            line_unlocks: vec![
                LineUnlock { score: 0, color: LineColor::Red },
                LineUnlock { score: 0, color: LineColor::Blue },
                LineUnlock { score: 50, color: LineColor::Green },
                LineUnlock { score: 150, color: LineColor::Yellow },
                LineUnlock { score: 300, color: LineColor::Purple },
            ],
        }
    }
}

impl GameConfig {
    /// Parse a config from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON (for dumping the active balance)
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("ship_speed", self.ship_speed),
            ("in_port_speed", self.in_port_speed),
            ("storm_slowdown", self.storm_slowdown),
            ("overload_seconds", self.overload_seconds),
            ("port_spawn_interval", self.port_spawn_interval),
            ("storm_spawn_interval", self.storm_spawn_interval),
            ("upgrade_interval", self.upgrade_interval),
            ("upgrade_prompt_seconds", self.upgrade_prompt_seconds),
            ("cargo_interval_start", self.cargo_interval_start),
            ("cargo_interval_floor", self.cargo_interval_floor),
            ("speed_upgrade_factor", self.speed_upgrade_factor),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        if self.game_over_grace_seconds < 0.0 {
            return Err(ConfigError::Invalid("game_over_grace_seconds must not be negative".into()));
        }
        if self.cargo_interval_floor > self.cargo_interval_start {
            return Err(ConfigError::Invalid(
                "cargo_interval_floor exceeds cargo_interval_start".into(),
            ));
        }
        if self.ship_capacity == 0 {
            return Err(ConfigError::Invalid("ship_capacity must be at least 1".into()));
        }
        if self.line_unlocks.is_empty() {
            return Err(ConfigError::Invalid("line_unlocks is empty".into()));
        }
        if self.spawn_area().is_empty() {
            return Err(ConfigError::Invalid("spawn_margin leaves no playfield".into()));
        }
        Ok(())
    }

    /// Playfield shrunk by the spawn margin
    pub fn spawn_area(&self) -> Rect {
        self.playfield.shrink(self.spawn_margin)
    }

    /// Line colors unlocked at the start of a run, in table order
    pub fn starting_colors(&self) -> Vec<LineColor> {
        self.line_unlocks
            .iter()
            .filter(|u| u.score == 0)
            .map(|u| u.color)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
        assert_eq!(
            GameConfig::default().starting_colors(),
            vec![LineColor::Red, LineColor::Blue]
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GameConfig::from_json(r#"{ "max_buffer": 3, "ship_speed": 120.0 }"#).unwrap();
        assert_eq!(config.max_buffer, 3);
        assert_eq!(config.ship_speed, 120.0);
        assert_eq!(config.overload_seconds, OVERLOAD_SECONDS);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = GameConfig::from_json(r#"{ "ship_speed": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = GameConfig::from_json(r#"{ "cargo_interval_floor": 9.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = GameConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_json_roundtrip_preserves_unlocks() {
        let config = GameConfig::default();
        let json = config.to_json().unwrap();
        let parsed = GameConfig::from_json(&json).unwrap();
        assert_eq!(parsed.line_unlocks, config.line_unlocks);
    }
}
