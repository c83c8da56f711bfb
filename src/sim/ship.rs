//! Ships and their movement strategies
//!
//! A ship hops waypoint to waypoint along its line's permanent points. Each
//! hop is a timed transit; on arrival the strategy picks the next waypoint and
//! the ship trades cargo with any port sitting on the waypoint it reached.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::cargo::Cargo;
use super::obstacles::Storm;
use super::port::{AlarmState, OverloadTransition, Port};
use crate::config::GameConfig;
use crate::consts::MIN_LEG_SECONDS;
use crate::lerp_clamped;

/// How a ship picks its next waypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MovementStrategy {
    /// Ping-pong between the two ends of an open line
    #[default]
    BackAndForth,
    /// Wrap around a closed line
    Loop,
}

/// Next stop chosen by a strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub index: usize,
    pub point: Vec2,
    pub going_forward: bool,
}

impl MovementStrategy {
    /// Pick the waypoint after `index`; `None` when the line has no segment
    pub fn next_index(self, index: usize, going_forward: bool, len: usize) -> Option<(usize, bool)> {
        if len < 2 {
            return None;
        }
        let index = index.min(len - 1);
        let next = match self {
            MovementStrategy::BackAndForth => {
                if going_forward {
                    if index + 1 < len {
                        (index + 1, true)
                    } else {
                        // Reached the far end: turn around
                        (index - 1, false)
                    }
                } else if index > 0 {
                    (index - 1, false)
                } else {
                    (1, true)
                }
            }
            MovementStrategy::Loop => {
                if going_forward {
                    ((index + 1) % len, true)
                } else {
                    ((index + len - 1) % len, false)
                }
            }
        };
        Some(next)
    }

    /// Resolve the next waypoint for `ship` on a line with `points`
    pub fn compute_next_waypoint(self, ship: &Ship, points: &[Vec2]) -> Option<Waypoint> {
        let (index, going_forward) = self.next_index(ship.current_index, ship.going_forward, points.len())?;
        Some(Waypoint {
            index,
            point: points[index],
            going_forward,
        })
    }
}

/// Where a hop leaving a port clears the port, and when
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Undock {
    pub point: Vec2,
    pub at: f64,
}

/// An in-flight hop between two waypoints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transit {
    pub from: Vec2,
    pub to: Vec2,
    pub target_index: usize,
    pub depart_at: f64,
    pub arrive_at: f64,
    /// Set when the hop starts at a port; the stretch before it runs at
    /// in-port speed
    #[serde(default)]
    pub undock: Option<Undock>,
}

/// What happened during one port call
#[derive(Debug, Clone, PartialEq)]
pub struct PortVisit {
    pub delivered: Vec<Cargo>,
    pub loaded: usize,
    pub transition: OverloadTransition,
}

/// A ship entity, owned by its route line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub id: u32,
    pub pos: Vec2,
    /// Waypoint most recently reached (the hop origin while in transit)
    pub current_index: usize,
    pub going_forward: bool,
    pub hold: Vec<Cargo>,
    pub max_capacity: usize,
    /// Compounding multiplier from speed upgrades
    pub speed_boost: f32,
    pub strategy: MovementStrategy,
    pub transit: Option<Transit>,
}

impl Ship {
    pub fn new(id: u32, pos: Vec2, max_capacity: usize) -> Self {
        Self {
            id,
            pos,
            current_index: 0,
            going_forward: true,
            hold: Vec::with_capacity(max_capacity),
            max_capacity,
            speed_boost: 1.0,
            strategy: MovementStrategy::BackAndForth,
            transit: None,
        }
    }

    /// Free slots in the hold
    #[inline]
    pub fn free_capacity(&self) -> usize {
        self.max_capacity.saturating_sub(self.hold.len())
    }

    /// Fill remaining hold space with cargo the port cannot use
    pub fn load_from(&mut self, port: &mut Port, alarm: &mut AlarmState) -> (usize, OverloadTransition) {
        let room = self.free_capacity();
        let (taken, transition) = port.remove_cargo(port.accepted, room, alarm);
        let loaded = taken.len();
        self.hold.extend(taken);
        (loaded, transition)
    }

    /// Unload then load at `port` as a single exchange
    ///
    /// Returns `None` when another ship holds the port; the caller simply
    /// skips the exchange this arrival.
    pub fn visit_port(&mut self, port: &mut Port, alarm: &mut AlarmState) -> Option<PortVisit> {
        if port.occupied {
            return None;
        }
        port.occupied = true;
        let delivered = port.unload(&mut self.hold);
        let (loaded, transition) = self.load_from(port, alarm);
        port.occupied = false;
        Some(PortVisit {
            delivered,
            loaded,
            transition,
        })
    }

    /// Sea speed for a ship at `at`: the boosted base speed, slowed inside
    /// the storm
    pub fn effective_speed(&self, config: &GameConfig, storm: Option<&Storm>, at: Vec2) -> f32 {
        let speed = config.ship_speed * self.speed_boost;
        match storm {
            Some(storm) if storm.contains(at) => speed * config.storm_slowdown,
            _ => speed,
        }
    }

    /// Start the hop to `next` at `now` and return the arrival time
    ///
    /// Leaving a port, the ship crawls at the in-port speed until it is
    /// `port_detection_radius` out, then continues at sea speed. The storm is
    /// checked where the sea stretch begins.
    pub fn depart(
        &mut self,
        next: Waypoint,
        now: f64,
        config: &GameConfig,
        storm: Option<&Storm>,
        from_port: bool,
    ) -> f64 {
        let from = self.pos;
        let distance = from.distance(next.point);

        let (undock_point, dock_seconds) = if from_port && distance > 0.0 {
            let dock_len = config.port_detection_radius.clamp(0.0, distance);
            let point = from.lerp(next.point, dock_len / distance);
            (Some(point), dock_len / config.in_port_speed.max(f32::EPSILON))
        } else {
            (None, 0.0)
        };
        let sea_start = undock_point.unwrap_or(from);
        let speed = self.effective_speed(config, storm, sea_start).max(f32::EPSILON);
        let sea_seconds = sea_start.distance(next.point) / speed;

        let arrive_at = now + f64::from((dock_seconds + sea_seconds).max(MIN_LEG_SECONDS));
        self.going_forward = next.going_forward;
        self.transit = Some(Transit {
            from,
            to: next.point,
            target_index: next.index,
            depart_at: now,
            arrive_at,
            undock: undock_point.map(|point| Undock {
                point,
                at: now + f64::from(dock_seconds),
            }),
        });
        arrive_at
    }

    /// Interpolated position at simulated time `now`
    pub fn position_at(&self, now: f64) -> Vec2 {
        let Some(t) = &self.transit else {
            return self.pos;
        };
        match t.undock {
            Some(u) if now < u.at => lerp_span(t.from, u.point, t.depart_at, u.at, now),
            Some(u) => lerp_span(u.point, t.to, u.at, t.arrive_at, now),
            None => lerp_span(t.from, t.to, t.depart_at, t.arrive_at, now),
        }
    }

    /// Keep indices pointing at the same physical waypoints after `count`
    /// points were prepended to the line
    pub fn shift_indices(&mut self, count: usize) {
        self.current_index += count;
        if let Some(t) = self.transit.as_mut() {
            t.target_index += count;
        }
    }

    /// Remap indices at or past `removed` onto the first waypoint, after the
    /// line dropped its closing point
    pub fn wrap_indices(&mut self, removed: usize) {
        if self.current_index >= removed {
            self.current_index = 0;
        }
        if let Some(t) = self.transit.as_mut() {
            if t.target_index >= removed {
                t.target_index = 0;
            }
        }
    }
}

fn lerp_span(from: Vec2, to: Vec2, start: f64, end: f64, now: f64) -> Vec2 {
    let span = end - start;
    if span <= 0.0 {
        return to;
    }
    lerp_clamped(from, to, ((now - start) / span) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::SymbolTextures;
    use crate::sim::cargo::{CargoFactory, CargoType};

    fn cargo(kind: CargoType) -> Cargo {
        CargoFactory::default().make(kind, &SymbolTextures)
    }

    #[test]
    fn test_back_and_forth_flips_at_end() {
        let points = [Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0)];
        let mut ship = Ship::new(1, points[2], 4);
        ship.current_index = 2;
        ship.going_forward = true;

        let next = MovementStrategy::BackAndForth
            .compute_next_waypoint(&ship, &points)
            .unwrap();
        assert_eq!(next.index, 1);
        assert!(!next.going_forward);
        assert_eq!(next.point, points[1]);
    }

    #[test]
    fn test_back_and_forth_flips_at_start() {
        assert_eq!(
            MovementStrategy::BackAndForth.next_index(0, false, 3),
            Some((1, true))
        );
        assert_eq!(
            MovementStrategy::BackAndForth.next_index(1, false, 3),
            Some((0, false))
        );
    }

    #[test]
    fn test_loop_wraps_both_ways() {
        assert_eq!(MovementStrategy::Loop.next_index(3, true, 4), Some((0, true)));
        assert_eq!(MovementStrategy::Loop.next_index(0, false, 4), Some((3, false)));
    }

    #[test]
    fn test_no_motion_on_short_line() {
        assert_eq!(MovementStrategy::BackAndForth.next_index(0, true, 1), None);
        assert_eq!(MovementStrategy::Loop.next_index(0, true, 0), None);
    }

    #[test]
    fn test_visit_unloads_then_loads() {
        let config = GameConfig::default();
        let mut alarm = AlarmState::default();
        let mut port = Port::new(1, Vec2::ZERO, CargoType::Oil, &config, &SymbolTextures);
        port.buffer = vec![cargo(CargoType::Gas), cargo(CargoType::Food), cargo(CargoType::Gas)];

        let mut ship = Ship::new(1, Vec2::ZERO, 3);
        ship.hold = vec![cargo(CargoType::Oil), cargo(CargoType::Gas)];

        let visit = ship.visit_port(&mut port, &mut alarm).unwrap();
        assert_eq!(visit.delivered.len(), 1);
        // One slot was already used by the Gas left after unloading
        assert_eq!(visit.loaded, 2);
        assert_eq!(ship.hold.len(), 3);
        assert_eq!(port.buffer.len(), 1);
        assert!(!port.occupied);
    }

    #[test]
    fn test_occupied_port_is_skipped() {
        let config = GameConfig::default();
        let mut alarm = AlarmState::default();
        let mut port = Port::new(1, Vec2::ZERO, CargoType::Oil, &config, &SymbolTextures);
        port.occupied = true;
        let mut ship = Ship::new(1, Vec2::ZERO, 3);
        ship.hold = vec![cargo(CargoType::Oil)];
        assert!(ship.visit_port(&mut port, &mut alarm).is_none());
        assert_eq!(ship.hold.len(), 1);
    }

    #[test]
    fn test_full_hold_loads_nothing() {
        let config = GameConfig::default();
        let mut alarm = AlarmState::default();
        let mut port = Port::new(1, Vec2::ZERO, CargoType::Oil, &config, &SymbolTextures);
        port.buffer = vec![cargo(CargoType::Gas)];
        let mut ship = Ship::new(1, Vec2::ZERO, 1);
        ship.hold = vec![cargo(CargoType::Food)];
        let (loaded, _) = ship.load_from(&mut port, &mut alarm);
        assert_eq!(loaded, 0);
        assert_eq!(port.buffer.len(), 1);
    }

    #[test]
    fn test_effective_speed_modifiers() {
        let config = GameConfig::default();
        let mut ship = Ship::new(1, Vec2::new(50.0, 50.0), 3);
        ship.speed_boost = 2.0;
        assert_eq!(ship.effective_speed(&config, None, ship.pos), config.ship_speed * 2.0);

        let storm = Storm::new(Vec2::new(60.0, 50.0), 30.0);
        assert_eq!(
            ship.effective_speed(&config, Some(&storm), ship.pos),
            config.ship_speed * 2.0 * config.storm_slowdown
        );
        assert_eq!(
            ship.effective_speed(&config, Some(&storm), Vec2::new(200.0, 50.0)),
            config.ship_speed * 2.0
        );
    }

    #[test]
    fn test_departure_from_port_crawls_then_sails() {
        let config = GameConfig::default();
        let mut ship = Ship::new(1, Vec2::ZERO, 3);
        ship.speed_boost = 2.0;
        let next = Waypoint {
            index: 1,
            point: Vec2::new(200.0, 0.0),
            going_forward: true,
        };
        let arrive_at = ship.depart(next, 10.0, &config, None, true);

        let radius = config.port_detection_radius;
        let dock = radius / config.in_port_speed;
        let sea = (200.0 - radius) / (config.ship_speed * 2.0);
        assert!((arrive_at - 10.0 - f64::from(dock + sea)).abs() < 1e-4);

        let undock = ship.transit.unwrap().undock.unwrap();
        assert_eq!(undock.point, Vec2::new(radius, 0.0));
        let halfway_out = ship.position_at(10.0 + f64::from(dock) / 2.0);
        assert!((halfway_out.x - radius / 2.0).abs() < 1e-3);
        assert_eq!(ship.position_at(arrive_at), next.point);
    }

    #[test]
    fn test_departure_at_sea_uses_sea_speed() {
        let config = GameConfig::default();
        let mut ship = Ship::new(1, Vec2::ZERO, 3);
        let next = Waypoint {
            index: 1,
            point: Vec2::new(90.0, 0.0),
            going_forward: true,
        };
        let arrive_at = ship.depart(next, 0.0, &config, None, false);
        assert!((arrive_at - f64::from(90.0 / config.ship_speed)).abs() < 1e-4);
        assert_eq!(ship.transit.unwrap().undock, None);
    }

    #[test]
    fn test_position_interpolates_transit() {
        let mut ship = Ship::new(1, Vec2::ZERO, 3);
        ship.transit = Some(Transit {
            from: Vec2::ZERO,
            to: Vec2::new(100.0, 0.0),
            target_index: 1,
            depart_at: 10.0,
            arrive_at: 12.0,
            undock: None,
        });
        assert_eq!(ship.position_at(11.0), Vec2::new(50.0, 0.0));
        assert_eq!(ship.position_at(20.0), Vec2::new(100.0, 0.0));
    }
}
