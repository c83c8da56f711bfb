//! Ports: cargo buffers and the overload failure state machine
//!
//! A port produces cargo it cannot use itself and accepts exactly one type.
//! When its buffer grows past `max_buffer` it enters the overloaded state and
//! a countdown starts; the orchestrator drives that countdown from scheduled
//! timer events and ends the run if it expires.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::cargo::{Cargo, CargoFactory, CargoType};
use crate::config::GameConfig;
use crate::platform::{RandomSource, TextureHandle, TextureLookup};

/// Result of re-evaluating a port after a buffer mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverloadTransition {
    /// State unchanged
    None,
    /// Normal -> Overloaded; a countdown must be scheduled
    Entered,
    /// Overloaded -> Normal; the pending countdown is now stale
    Cleared,
}

/// Outcome of one countdown step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountdownOutcome {
    /// Event belonged to a cancelled countdown
    Stale,
    /// Countdown continues with this many seconds left
    Running(f32),
    /// Countdown hit zero while still over capacity
    Expired,
}

/// Shared count of overloaded ports, driving the alarm cue
///
/// Owned by the game state and lent to port operations so separate
/// simulations never share it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmState {
    overloaded_ports: u32,
}

impl AlarmState {
    pub fn overloaded_ports(&self) -> u32 {
        self.overloaded_ports
    }

    /// The alarm plays while any port is overloaded
    pub fn is_sounding(&self) -> bool {
        self.overloaded_ports > 0
    }

    fn raise(&mut self) {
        self.overloaded_ports += 1;
    }

    fn lower(&mut self) {
        self.overloaded_ports = self.overloaded_ports.saturating_sub(1);
    }
}

/// A port entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    pub id: u32,
    pub pos: Vec2,
    /// The one cargo type this port consumes
    pub accepted: CargoType,
    /// Light variant of the accepted cargo symbol, drawn on the port
    pub icon: TextureHandle,
    /// Waiting cargo, oldest first
    pub buffer: Vec<Cargo>,
    pub max_buffer: usize,
    pub overloaded: bool,
    pub overload_remaining: f32,
    overload_seconds: f32,
    /// Held only during one ship's unload + load exchange
    pub occupied: bool,
    /// Countdown expired; the run is ending
    pub failed: bool,
    /// Bumped on every overload transition so stale countdown events are ignored
    pub countdown_generation: u32,
}

impl Port {
    pub fn new(
        id: u32,
        pos: Vec2,
        accepted: CargoType,
        config: &GameConfig,
        textures: &dyn TextureLookup,
    ) -> Self {
        Self {
            id,
            pos,
            accepted,
            icon: textures.cargo_texture(accepted, true),
            buffer: Vec::new(),
            max_buffer: config.max_buffer,
            overloaded: false,
            overload_remaining: 0.0,
            overload_seconds: config.overload_seconds,
            occupied: false,
            failed: false,
            countdown_generation: 0,
        }
    }

    #[inline]
    pub fn is_overloaded(&self) -> bool {
        self.overloaded
    }

    /// Produce one unit of a type this port does not accept
    pub fn produce_cargo(
        &mut self,
        rng: &mut dyn RandomSource,
        factory: &CargoFactory,
        textures: &dyn TextureLookup,
        alarm: &mut AlarmState,
    ) -> (Cargo, OverloadTransition) {
        let kind = rng.pick_cargo_except(self.accepted);
        let cargo = factory.make(kind, textures);
        self.buffer.push(cargo);
        (cargo, self.reevaluate(alarm))
    }

    /// Take up to `max_count` collectible units, oldest first
    ///
    /// Only units whose type differs from both `excluding` and the port's own
    /// accepted type are taken. Untaken units keep their relative order.
    pub fn remove_cargo(
        &mut self,
        excluding: CargoType,
        max_count: usize,
        alarm: &mut AlarmState,
    ) -> (Vec<Cargo>, OverloadTransition) {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.buffer.len());
        for cargo in self.buffer.drain(..) {
            let collectible = cargo.kind != excluding && cargo.kind != self.accepted;
            if collectible && taken.len() < max_count {
                taken.push(cargo);
            } else {
                kept.push(cargo);
            }
        }
        self.buffer = kept;
        (taken, self.reevaluate(alarm))
    }

    /// Units a visiting ship could collect
    pub fn collectible_count(&self) -> usize {
        self.buffer.iter().filter(|c| c.kind != self.accepted).count()
    }

    /// Deliver every unit in `hold` this port accepts
    ///
    /// Returns the delivered units; the caller scores one point per unit.
    pub fn unload(&self, hold: &mut Vec<Cargo>) -> Vec<Cargo> {
        let (delivered, remaining): (Vec<Cargo>, Vec<Cargo>) =
            hold.drain(..).partition(|c| c.kind == self.accepted);
        *hold = remaining;
        delivered
    }

    /// Sync overload state with the buffer size
    pub fn reevaluate(&mut self, alarm: &mut AlarmState) -> OverloadTransition {
        let over = self.buffer.len() > self.max_buffer;
        match (self.overloaded, over) {
            (false, true) => {
                self.overloaded = true;
                self.overload_remaining = self.overload_seconds;
                self.countdown_generation = self.countdown_generation.wrapping_add(1);
                alarm.raise();
                OverloadTransition::Entered
            }
            (true, false) => {
                self.overloaded = false;
                self.overload_remaining = 0.0;
                self.countdown_generation = self.countdown_generation.wrapping_add(1);
                alarm.lower();
                OverloadTransition::Cleared
            }
            _ => OverloadTransition::None,
        }
    }

    /// Advance the countdown by `step` seconds if `generation` is current
    pub fn countdown_tick(&mut self, generation: u32, step: f32) -> CountdownOutcome {
        if !self.overloaded || generation != self.countdown_generation || self.failed {
            return CountdownOutcome::Stale;
        }
        self.overload_remaining = (self.overload_remaining - step).max(0.0);
        if self.overload_remaining <= 0.0 && self.buffer.len() > self.max_buffer {
            self.failed = true;
            CountdownOutcome::Expired
        } else {
            CountdownOutcome::Running(self.overload_remaining)
        }
    }

    /// Fraction of the countdown left, for the overload ring (1.0 when calm)
    pub fn overload_progress(&self) -> f32 {
        if !self.overloaded {
            return 1.0;
        }
        (self.overload_remaining / self.overload_seconds).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{SeededRandom, SymbolTextures};

    fn port(accepted: CargoType, max_buffer: usize) -> Port {
        let config = GameConfig {
            max_buffer,
            ..Default::default()
        };
        Port::new(1, Vec2::ZERO, accepted, &config, &SymbolTextures)
    }

    fn cargo(kind: CargoType) -> Cargo {
        CargoFactory::default().make(kind, &SymbolTextures)
    }

    #[test]
    fn test_overload_enter_and_recover() {
        let mut rng = SeededRandom::new(1);
        let factory = CargoFactory::default();
        let mut alarm = AlarmState::default();
        let mut p = port(CargoType::Oil, 5);

        for i in 0..6 {
            let (c, transition) = p.produce_cargo(&mut rng, &factory, &SymbolTextures, &mut alarm);
            assert_ne!(c.kind, CargoType::Oil);
            let expected = if i == 5 {
                OverloadTransition::Entered
            } else {
                OverloadTransition::None
            };
            assert_eq!(transition, expected);
        }
        assert!(p.is_overloaded());
        assert_eq!(alarm.overloaded_ports(), 1);

        let (taken, transition) = p.remove_cargo(CargoType::Oil, 6, &mut alarm);
        assert_eq!(taken.len(), 6);
        assert_eq!(transition, OverloadTransition::Cleared);
        assert!(!p.is_overloaded());
        assert_eq!(alarm.overloaded_ports(), 0);
    }

    #[test]
    fn test_remove_preserves_order_of_untaken() {
        let mut alarm = AlarmState::default();
        let mut p = port(CargoType::Oil, 10);
        p.buffer = vec![
            cargo(CargoType::Gas),
            cargo(CargoType::Food),
            cargo(CargoType::Gas),
            cargo(CargoType::Food),
        ];
        let (taken, _) = p.remove_cargo(CargoType::Food, 1, &mut alarm);
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].kind, CargoType::Gas);
        let left: Vec<_> = p.buffer.iter().map(|c| c.kind).collect();
        assert_eq!(left, vec![CargoType::Food, CargoType::Gas, CargoType::Food]);
    }

    #[test]
    fn test_remove_from_empty_is_noop() {
        let mut alarm = AlarmState::default();
        let mut p = port(CargoType::Gas, 3);
        let (taken, transition) = p.remove_cargo(CargoType::Gas, 4, &mut alarm);
        assert!(taken.is_empty());
        assert_eq!(transition, OverloadTransition::None);
    }

    #[test]
    fn test_unload_delivers_only_accepted() {
        let p = port(CargoType::Oil, 5);
        let mut hold = vec![cargo(CargoType::Oil), cargo(CargoType::Gas)];
        let delivered = p.unload(&mut hold);
        assert_eq!(delivered.len(), 1);
        assert_eq!(hold.len(), 1);
        assert_eq!(hold[0].kind, CargoType::Gas);
    }

    #[test]
    fn test_countdown_expires_and_ignores_stale() {
        let mut alarm = AlarmState::default();
        let mut p = port(CargoType::Food, 0);
        p.buffer.push(cargo(CargoType::Oil));
        assert_eq!(p.reevaluate(&mut alarm), OverloadTransition::Entered);
        let generation = p.countdown_generation;

        assert_eq!(p.countdown_tick(generation.wrapping_add(7), 1.0), CountdownOutcome::Stale);
        assert_eq!(p.countdown_tick(generation, 10.0), CountdownOutcome::Running(20.0));
        assert!((p.overload_progress() - 20.0 / 30.0).abs() < 1e-5);
        assert_eq!(p.countdown_tick(generation, 20.0), CountdownOutcome::Expired);
        assert!(p.failed);
        assert_eq!(p.countdown_tick(generation, 1.0), CountdownOutcome::Stale);
    }

    #[test]
    fn test_recovery_invalidates_countdown() {
        let mut alarm = AlarmState::default();
        let mut p = port(CargoType::Food, 0);
        p.buffer.push(cargo(CargoType::Oil));
        p.reevaluate(&mut alarm);
        let generation = p.countdown_generation;
        let (_, transition) = p.remove_cargo(CargoType::Food, 1, &mut alarm);
        assert_eq!(transition, OverloadTransition::Cleared);
        assert_eq!(p.countdown_tick(generation, 1.0), CountdownOutcome::Stale);
        assert_eq!(p.overload_progress(), 1.0);
    }
}
