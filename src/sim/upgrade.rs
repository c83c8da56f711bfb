//! Line upgrades and the two-step upgrade prompt
//!
//! Upgrades are one-shot commands applied to a single line. The prompt asks
//! for an upgrade kind first, then a target line; dismissing or letting
//! either step time out applies nothing.

use serde::{Deserialize, Serialize};

use super::route::RouteLine;
use crate::config::GameConfig;
use crate::platform::{TextureHandle, TextureLookup};

/// Upgrade kinds offered to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    AddShip,
    SpeedBoost,
    CapacityBoost,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 3] = [
        UpgradeKind::AddShip,
        UpgradeKind::SpeedBoost,
        UpgradeKind::CapacityBoost,
    ];

    pub fn index(self) -> usize {
        match self {
            UpgradeKind::AddShip => 0,
            UpgradeKind::SpeedBoost => 1,
            UpgradeKind::CapacityBoost => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeKind::AddShip => "Add Ship",
            UpgradeKind::SpeedBoost => "Speed",
            UpgradeKind::CapacityBoost => "Capacity",
        }
    }
}

/// A ready-to-apply upgrade command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Upgrade {
    AddShip { capacity: usize },
    SpeedBoost { factor: f32 },
    CapacityBoost { amount: usize },
}

/// Effect of applying an upgrade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpgradeEffect {
    /// Ship added by `AddShip`; the caller schedules its first departure
    pub new_ship: Option<u32>,
    pub ships_affected: usize,
}

impl Upgrade {
    pub fn kind(&self) -> UpgradeKind {
        match self {
            Upgrade::AddShip { .. } => UpgradeKind::AddShip,
            Upgrade::SpeedBoost { .. } => UpgradeKind::SpeedBoost,
            Upgrade::CapacityBoost { .. } => UpgradeKind::CapacityBoost,
        }
    }

    pub fn apply<F>(&self, line: &mut RouteLine, next_ship_id: F) -> UpgradeEffect
    where
        F: FnOnce() -> u32,
    {
        match *self {
            Upgrade::AddShip { capacity } => {
                if line.permanent_points.is_empty() {
                    return UpgradeEffect::default();
                }
                let new_ship = line.add_ship(next_ship_id(), capacity);
                UpgradeEffect {
                    new_ship,
                    ships_affected: usize::from(new_ship.is_some()),
                }
            }
            Upgrade::SpeedBoost { factor } => {
                for ship in &mut line.ships {
                    ship.speed_boost *= factor;
                }
                UpgradeEffect {
                    new_ship: None,
                    ships_affected: line.ships.len(),
                }
            }
            Upgrade::CapacityBoost { amount } => {
                for ship in &mut line.ships {
                    ship.max_capacity += amount;
                }
                UpgradeEffect {
                    new_ship: None,
                    ships_affected: line.ships.len(),
                }
            }
        }
    }
}

type UpgradeBuilder = fn(&GameConfig) -> Upgrade;

fn build_add_ship(config: &GameConfig) -> Upgrade {
    Upgrade::AddShip {
        capacity: config.ship_capacity,
    }
}

fn build_speed(config: &GameConfig) -> Upgrade {
    Upgrade::SpeedBoost {
        factor: config.speed_upgrade_factor,
    }
}

fn build_capacity(config: &GameConfig) -> Upgrade {
    Upgrade::CapacityBoost {
        amount: config.capacity_upgrade_amount,
    }
}

/// Builder table keyed by [`UpgradeKind::index`]
#[derive(Clone, Copy)]
pub struct UpgradeFactory {
    builders: [UpgradeBuilder; 3],
}

impl std::fmt::Debug for UpgradeFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpgradeFactory").finish_non_exhaustive()
    }
}

impl Default for UpgradeFactory {
    fn default() -> Self {
        Self {
            builders: [build_add_ship, build_speed, build_capacity],
        }
    }
}

impl UpgradeFactory {
    pub fn make(&self, kind: UpgradeKind, config: &GameConfig) -> Upgrade {
        (self.builders[kind.index()])(config)
    }
}

/// One choice shown in the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeOffer {
    pub kind: UpgradeKind,
    pub icon: TextureHandle,
}

impl UpgradeOffer {
    pub fn new(kind: UpgradeKind, textures: &dyn TextureLookup) -> Self {
        Self {
            kind,
            icon: textures.upgrade_texture(kind),
        }
    }
}

/// Upgrade prompt state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum UpgradePrompt {
    #[default]
    Idle,
    ChoosingUpgrade {
        choices: Vec<UpgradeOffer>,
        expires_at: f64,
    },
    ChoosingLine {
        kind: UpgradeKind,
        expires_at: f64,
    },
}

impl UpgradePrompt {
    pub fn is_open(&self) -> bool {
        !matches!(self, UpgradePrompt::Idle)
    }

    /// Accept `kind` if it was offered; moves on to line selection
    pub fn pick(&mut self, kind: UpgradeKind, expires_at: f64) -> bool {
        let offered = matches!(
            self,
            UpgradePrompt::ChoosingUpgrade { choices, .. } if choices.iter().any(|c| c.kind == kind)
        );
        if offered {
            *self = UpgradePrompt::ChoosingLine { kind, expires_at };
        }
        offered
    }

    /// Take the chosen kind once a line was picked; resets to idle
    pub fn take_for_line(&mut self) -> Option<UpgradeKind> {
        match *self {
            UpgradePrompt::ChoosingLine { kind, .. } => {
                *self = UpgradePrompt::Idle;
                Some(kind)
            }
            _ => None,
        }
    }

    /// Close the prompt; true if anything was open
    pub fn dismiss(&mut self) -> bool {
        let was_open = self.is_open();
        *self = UpgradePrompt::Idle;
        was_open
    }
}
