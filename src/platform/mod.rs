//! Platform abstraction layer
//!
//! The simulation only talks to its host through these seams:
//! - Time (frame deltas)
//! - Randomness (seedable, substitutable in tests)
//! - Visual handles for cargo and upgrades
//! - Gameplay callbacks (deliveries, game over)

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_FRAME_DT;
use crate::sim::{CargoType, LineColor, Rect, UpgradeKind};

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Source of per-frame delta time in seconds
pub trait ClockSource {
    fn delta_seconds(&mut self) -> f32;
}

/// Clock that always reports the same step (headless runs, tests)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub step: f32,
}

impl FixedClock {
    pub fn new(step: f32) -> Self {
        Self { step }
    }
}

impl ClockSource for FixedClock {
    fn delta_seconds(&mut self) -> f32 {
        self.step
    }
}

/// Converts absolute frame timestamps (ms, as delivered by a display link)
/// into clamped deltas
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
    pending_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the timestamp of the frame about to be simulated
    pub fn frame(&mut self, now_ms: f64) {
        self.pending_ms = now_ms;
    }
}

impl ClockSource for FrameClock {
    fn delta_seconds(&mut self) -> f32 {
        let dt = match self.last_ms {
            Some(last) => ((self.pending_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(self.pending_ms);
        // Backgrounded apps deliver huge gaps; never simulate them in one go
        dt.clamp(0.0, MAX_FRAME_DT)
    }
}

// ---------------------------------------------------------------------------
// Randomness
// ---------------------------------------------------------------------------

/// Uniform random choices used by spawners and ports
pub trait RandomSource: std::fmt::Debug {
    /// Uniform index in `0..len` (`len` must be non-zero)
    fn next_index(&mut self, len: usize) -> usize;
    /// Uniform float in `[0, 1)`
    fn next_unit(&mut self) -> f32;

    /// Uniform point inside `rect`
    fn point_in_rect(&mut self, rect: Rect) -> Vec2 {
        let size = rect.size();
        rect.min + Vec2::new(self.next_unit() * size.x, self.next_unit() * size.y)
    }

    /// Uniform cargo type other than `excluded`
    fn pick_cargo_except(&mut self, excluded: CargoType) -> CargoType {
        let options: Vec<CargoType> = CargoType::ALL
            .iter()
            .copied()
            .filter(|&t| t != excluded)
            .collect();
        options[self.next_index(options.len())]
    }
}

/// Fisher-Yates shuffle driven by any [`RandomSource`]
pub fn shuffle<T>(rng: &mut dyn RandomSource, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.next_index(i + 1);
        items.swap(i, j);
    }
}

/// Default PCG-backed random source
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: Pcg32,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len.max(1))
    }

    fn next_unit(&mut self) -> f32 {
        self.rng.random::<f32>()
    }
}

// ---------------------------------------------------------------------------
// Textures
// ---------------------------------------------------------------------------

/// Opaque visual handle resolved by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

/// Maps logical cargo/upgrade kinds to visual handles
pub trait TextureLookup: std::fmt::Debug {
    fn cargo_texture(&self, kind: CargoType, light: bool) -> TextureHandle;
    fn upgrade_texture(&self, kind: UpgradeKind) -> TextureHandle;
}

/// Fixed symbol atlas: cargo icons first (dark, light), then upgrades
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolTextures;

impl TextureLookup for SymbolTextures {
    fn cargo_texture(&self, kind: CargoType, light: bool) -> TextureHandle {
        let base = kind.index() as u32 * 2;
        TextureHandle(base + u32::from(light))
    }

    fn upgrade_texture(&self, kind: UpgradeKind) -> TextureHandle {
        TextureHandle(CargoType::ALL.len() as u32 * 2 + kind.index() as u32)
    }
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

/// Host hooks fed from the simulation event queue
pub trait GameObserver {
    /// One cargo unit reached a port that accepts it
    fn on_delivery_success(&mut self);
    /// A port stayed overloaded past its countdown; fired once per run
    fn on_game_over(&mut self, final_score: u64);

    fn on_alarm_started(&mut self) {}
    fn on_alarm_stopped(&mut self) {}
    fn on_line_unlocked(&mut self, _color: LineColor) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_cargo_never_returns_excluded() {
        let mut rng = SeededRandom::new(7);
        for _ in 0..200 {
            assert_ne!(rng.pick_cargo_except(CargoType::Gas), CargoType::Gas);
        }
    }

    #[test]
    fn test_point_in_rect_bounds() {
        let mut rng = SeededRandom::new(3);
        let rect = Rect::new(Vec2::new(10.0, 20.0), Vec2::new(30.0, 25.0));
        for _ in 0..200 {
            assert!(rect.contains(rng.point_in_rect(rect)));
        }
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = SeededRandom::new(11);
        let mut items = [0, 1, 2, 3, 4, 5];
        shuffle(&mut rng, &mut items);
        let mut sorted = items;
        sorted.sort_unstable();
        assert_eq!(sorted, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_frame_clock_clamps() {
        let mut clock = FrameClock::new();
        clock.frame(1000.0);
        assert_eq!(clock.delta_seconds(), 0.0);
        clock.frame(1016.0);
        assert!((clock.delta_seconds() - 0.016).abs() < 1e-4);
        clock.frame(9000.0);
        assert_eq!(clock.delta_seconds(), MAX_FRAME_DT);
    }

    #[test]
    fn test_symbol_textures_distinct() {
        let textures = SymbolTextures;
        let oil = textures.cargo_texture(CargoType::Oil, false);
        let oil_light = textures.cargo_texture(CargoType::Oil, true);
        let gas = textures.cargo_texture(CargoType::Gas, false);
        assert_ne!(oil, oil_light);
        assert_ne!(oil, gas);
        assert_ne!(textures.upgrade_texture(UpgradeKind::AddShip), oil);
    }
}
