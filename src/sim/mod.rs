//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through `tick`
//! - Randomness only through the state's `RandomSource`
//! - Timers fire in (time, scheduling order)
//! - No rendering or audio dependencies

pub mod cargo;
pub mod collision;
pub mod obstacles;
pub mod port;
pub mod route;
pub mod ship;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod timers;
pub mod upgrade;

pub use cargo::{Cargo, CargoFactory, CargoType};
pub use collision::{Rect, nearest_within, point_in_circle};
pub use obstacles::{Island, Storm};
pub use port::{AlarmState, CountdownOutcome, OverloadTransition, Port};
pub use route::{DrawEnd, DrawSession, LineColor, PortPair, RouteLine};
pub use ship::{MovementStrategy, Ship, Transit, Undock, Waypoint};
pub use state::{GameEvent, GamePhase, GameState};
pub use tick::{TickInput, TouchEvent, UpgradeChoice, tick};
pub use timers::{Scheduler, TimerEvent};
pub use upgrade::{Upgrade, UpgradeKind, UpgradeOffer, UpgradePrompt};
