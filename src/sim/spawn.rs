//! Spawn placement and pacing
//!
//! Pure functions: they read the current world and a random source and return
//! what should appear. The game state decides when to call them.

use glam::Vec2;

use super::cargo::CargoType;
use super::collision::circle_clear_of_rects;
use super::obstacles::Island;
use super::port::Port;
use super::upgrade::UpgradeKind;
use crate::config::GameConfig;
use crate::platform::{RandomSource, shuffle};
use crate::within_radius;

/// Seconds between cargo productions at `score`
///
/// Linear ramp from `cargo_interval_start` at score 0 down to
/// `cargo_interval_floor` at `cargo_ramp_score`, flat afterwards.
pub fn cargo_interval(score: u64, config: &GameConfig) -> f32 {
    let ramp = config.cargo_ramp_score.max(1) as f32;
    let t = (score as f32 / ramp).min(1.0);
    let interval = config.cargo_interval_start + (config.cargo_interval_floor - config.cargo_interval_start) * t;
    interval.max(config.cargo_interval_floor)
}

/// Rejection-sample a free spot for a new port
///
/// Returns `None` when the attempt budget runs out; the caller skips this
/// spawn cycle.
pub fn find_port_position(
    rng: &mut dyn RandomSource,
    config: &GameConfig,
    ports: &[Port],
    islands: &[Island],
) -> Option<Vec2> {
    let area = config.spawn_area();
    for _ in 0..config.port_spawn_attempts {
        let candidate = rng.point_in_rect(area);
        let spaced = ports
            .iter()
            .all(|p| !within_radius(candidate, p.pos, config.port_min_spacing));
        let dry = islands
            .iter()
            .all(|i| !within_radius(candidate, i.pos, i.radius + config.island_clearance));
        let visible = circle_clear_of_rects(candidate, config.port_snap_radius, &config.occluded_regions);
        if spaced && dry && visible {
            return Some(candidate);
        }
    }
    None
}

/// Rejection-sample a spot for an island at run start
pub fn find_island_position(
    rng: &mut dyn RandomSource,
    config: &GameConfig,
    ports: &[Port],
    islands: &[Island],
) -> Option<Vec2> {
    let area = config.spawn_area();
    let radius = config.island_radius;
    for _ in 0..config.port_spawn_attempts {
        let candidate = rng.point_in_rect(area);
        let clear_of_ports = ports
            .iter()
            .all(|p| !within_radius(candidate, p.pos, radius + config.island_clearance));
        let clear_of_islands = islands
            .iter()
            .all(|i| !within_radius(candidate, i.pos, i.radius + radius + config.island_clearance));
        let visible = circle_clear_of_rects(candidate, radius, &config.occluded_regions);
        if clear_of_ports && clear_of_islands && visible {
            return Some(candidate);
        }
    }
    None
}

/// Storm center; storms may cover anything, so placement always succeeds
pub fn storm_position(rng: &mut dyn RandomSource, config: &GameConfig) -> Vec2 {
    rng.point_in_rect(config.spawn_area())
}

/// Accepted type for a new port: uniform among the least represented types
pub fn accepted_type_for(rng: &mut dyn RandomSource, ports: &[Port]) -> CargoType {
    let mut counts = [0usize; 3];
    for port in ports {
        counts[port.accepted.index()] += 1;
    }
    let fewest = counts.iter().copied().min().unwrap_or(0);
    let candidates: Vec<CargoType> = CargoType::ALL
        .iter()
        .copied()
        .filter(|t| counts[t.index()] == fewest)
        .collect();
    candidates[rng.next_index(candidates.len())]
}

/// Port that produces the next cargo unit
pub fn pick_producer(rng: &mut dyn RandomSource, ports: &[Port]) -> Option<usize> {
    if ports.is_empty() {
        None
    } else {
        Some(rng.next_index(ports.len()))
    }
}

/// Shuffled upgrade kinds for one prompt
pub fn upgrade_offers(rng: &mut dyn RandomSource, count: usize) -> Vec<UpgradeKind> {
    let mut kinds = UpgradeKind::ALL.to_vec();
    shuffle(rng, &mut kinds);
    kinds.truncate(count.clamp(1, UpgradeKind::ALL.len()));
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{SeededRandom, SymbolTextures};
    use crate::sim::collision::Rect;

    #[test]
    fn test_cargo_interval_ramp() {
        let config = GameConfig::default();
        assert!((cargo_interval(0, &config) - 2.5).abs() < 1e-6);
        let mid = cargo_interval(250, &config);
        assert!((mid - 1.275).abs() < 1e-4);
        assert!((cargo_interval(500, &config) - 0.05).abs() < 1e-6);
        assert!((cargo_interval(10_000, &config) - 0.05).abs() < 1e-6);
        assert!(cargo_interval(100, &config) > cargo_interval(200, &config));
    }

    #[test]
    fn test_port_position_respects_constraints() {
        let config = GameConfig::default();
        let mut rng = SeededRandom::new(42);
        let mut ports = Vec::new();
        let islands = vec![Island::new(Vec2::new(200.0, 400.0), 40.0)];
        for id in 0..4 {
            let Some(pos) = find_port_position(&mut rng, &config, &ports, &islands) else {
                continue;
            };
            assert!(config.spawn_area().contains(pos));
            assert!(pos.distance(islands[0].pos) >= 40.0 + config.island_clearance);
            for other in &ports {
                assert!(pos.distance(other.pos) >= config.port_min_spacing);
            }
            for region in &config.occluded_regions {
                assert!(region.distance_to(pos) >= config.port_snap_radius);
            }
            ports.push(Port::new(id, pos, CargoType::Oil, &config, &SymbolTextures));
        }
        assert!(!ports.is_empty());
    }

    #[test]
    fn test_port_position_gives_up() {
        let config = GameConfig {
            occluded_regions: vec![Rect::new(Vec2::splat(-1000.0), Vec2::splat(5000.0))],
            ..Default::default()
        };
        let mut rng = SeededRandom::new(1);
        assert_eq!(find_port_position(&mut rng, &config, &[], &[]), None);
    }

    #[test]
    fn test_accepted_type_balances() {
        let config = GameConfig::default();
        let mut rng = SeededRandom::new(5);
        let mut ports = Vec::new();
        for id in 0..3 {
            let kind = accepted_type_for(&mut rng, &ports);
            ports.push(Port::new(id, Vec2::ZERO, kind, &config, &SymbolTextures));
        }
        let mut kinds: Vec<_> = ports.iter().map(|p| p.accepted).collect();
        kinds.sort();
        assert_eq!(kinds, CargoType::ALL.to_vec());
    }

    #[test]
    fn test_upgrade_offers_distinct() {
        let mut rng = SeededRandom::new(9);
        let offers = upgrade_offers(&mut rng, 2);
        assert_eq!(offers.len(), 2);
        assert_ne!(offers[0], offers[1]);
        assert_eq!(upgrade_offers(&mut rng, 10).len(), 3);
    }
}
