//! Route lines and the stroke-drawing state machine
//!
//! A line's permanent points grow at either free end until the line closes
//! into a loop. The player draws a stroke (start, extend, end); the stroke is
//! validated as a whole and either committed or discarded without touching
//! the line.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::nearest_within;
use super::obstacles::{Island, hits_island};
use super::port::Port;
use super::ship::{MovementStrategy, Ship};
use crate::error::DrawRejection;
use crate::within_radius;

/// Line identity; one line per color slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LineColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
}

impl LineColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineColor::Red => "Red",
            LineColor::Blue => "Blue",
            LineColor::Green => "Green",
            LineColor::Yellow => "Yellow",
            LineColor::Purple => "Purple",
        }
    }
}

/// Which part of the line a stroke grows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawEnd {
    /// Line had no points yet
    Fresh,
    /// Extends before the first permanent point
    Front,
    /// Extends after the last permanent point
    Back,
}

/// Uncommitted stroke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawSession {
    pub end: DrawEnd,
    /// The free end the stroke grows from (extensions only)
    pub anchor: Option<Vec2>,
    pub points: Vec<Vec2>,
    /// Set once the stroke touched an island; nothing commits until restart
    pub invalidated: bool,
}

/// Unordered pair of port ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortPair(u32, u32);

impl PortPair {
    pub fn new(a: u32, b: u32) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    pub fn ids(&self) -> (u32, u32) {
        (self.0, self.1)
    }
}

/// Stroke endpoints resolved against ports
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub from: usize,
    pub to: usize,
    pub pair: PortPair,
}

/// What a commit changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Points appended or prepended
    pub added: usize,
    /// Ship created by the line's first commit
    pub new_ship: Option<u32>,
    /// The commit closed the line into a loop
    pub loop_closed: bool,
}

/// A player-drawn route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteLine {
    pub color: LineColor,
    pub permanent_points: Vec<Vec2>,
    pub is_loop: bool,
    pub ships: Vec<Ship>,
    pub existing_connections: BTreeSet<PortPair>,
    pub draw: Option<DrawSession>,
}

impl RouteLine {
    pub fn new(color: LineColor) -> Self {
        Self {
            color,
            permanent_points: Vec::new(),
            is_loop: false,
            ships: Vec::new(),
            existing_connections: BTreeSet::new(),
            draw: None,
        }
    }

    /// Begin a stroke at `at`
    ///
    /// An empty line starts fresh; otherwise the touch must land within
    /// `pick_radius` of a free end, and the closer end wins.
    pub fn start_draw(&mut self, at: Vec2, pick_radius: f32) -> Result<(), DrawRejection> {
        self.draw = None;
        if self.is_loop {
            return Err(DrawRejection::LineClosed);
        }
        let (first, last) = match (self.permanent_points.first(), self.permanent_points.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => {
                self.draw = Some(DrawSession {
                    end: DrawEnd::Fresh,
                    anchor: None,
                    points: vec![at],
                    invalidated: false,
                });
                return Ok(());
            }
        };

        let near_front = within_radius(at, first, pick_radius);
        let near_back = within_radius(at, last, pick_radius);
        let end = match (near_front, near_back) {
            (true, true) => {
                if at.distance_squared(first) < at.distance_squared(last) {
                    DrawEnd::Front
                } else {
                    DrawEnd::Back
                }
            }
            (true, false) => DrawEnd::Front,
            (false, true) => DrawEnd::Back,
            (false, false) => return Err(DrawRejection::NotAtLineEnd),
        };
        let anchor = if end == DrawEnd::Front { first } else { last };
        self.draw = Some(DrawSession {
            end,
            anchor: Some(anchor),
            points: Vec::new(),
            invalidated: false,
        });
        Ok(())
    }

    /// Add a point to the current stroke
    ///
    /// A point inside an island throws the whole stroke away. Points arriving
    /// after that (or with no stroke in progress) are ignored.
    pub fn extend_draw(&mut self, to: Vec2, islands: &[Island]) -> Result<(), DrawRejection> {
        let Some(session) = self.draw.as_mut() else {
            return Ok(());
        };
        if session.invalidated {
            return Ok(());
        }
        if hits_island(islands, to) {
            session.points.clear();
            session.invalidated = true;
            return Err(DrawRejection::CrossesIsland);
        }
        if session.points.last() != Some(&to) {
            session.points.push(to);
        }
        Ok(())
    }

    /// Discard the current stroke
    pub fn cancel_draw(&mut self) {
        self.draw = None;
    }

    /// First and last point of the stroke as it would join the line
    pub fn stroke_endpoints(&self) -> Option<(Vec2, Vec2)> {
        let session = self.draw.as_ref()?;
        let last = *session.points.last()?;
        let start = match session.anchor {
            Some(anchor) => anchor,
            None if session.points.len() >= 2 => session.points[0],
            None => return None,
        };
        Some((start, last))
    }

    /// Check that the stroke joins two distinct, not-yet-connected ports
    pub fn validate_connection(&self, ports: &[Port], snap_radius: f32) -> Result<Connection, DrawRejection> {
        if self.draw.as_ref().is_some_and(|s| s.invalidated) {
            return Err(DrawRejection::CrossesIsland);
        }
        let (start, end) = self.stroke_endpoints().ok_or(DrawRejection::TooShort)?;
        let positions = || ports.iter().map(|p| p.pos);
        let from = nearest_within(positions(), start, snap_radius).ok_or(DrawRejection::NoPortAtStart)?;
        let to = nearest_within(positions(), end, snap_radius).ok_or(DrawRejection::NoPortAtEnd)?;
        if from == to {
            return Err(DrawRejection::SamePort);
        }
        let pair = PortPair::new(ports[from].id, ports[to].id);
        if self.existing_connections.contains(&pair) {
            return Err(DrawRejection::AlreadyConnected);
        }
        Ok(Connection { from, to, pair })
    }

    /// Move stroke endpoints onto the port centers they were validated against
    pub fn snap_stroke(&mut self, start: Vec2, end: Vec2) {
        if let Some(session) = self.draw.as_mut() {
            if session.anchor.is_none() {
                if let Some(first) = session.points.first_mut() {
                    *first = start;
                }
            }
            if let Some(last) = session.points.last_mut() {
                *last = end;
            }
        }
    }

    pub fn record_connection(&mut self, pair: PortPair) {
        self.existing_connections.insert(pair);
    }

    /// Commit the current stroke into the permanent points
    ///
    /// The first commit that leaves the line with a segment creates its
    /// first ship (id from `next_ship_id`) at the first point.
    pub fn finalize_current_line<F>(&mut self, ship_capacity: usize, loop_tolerance: f32, next_ship_id: F) -> CommitOutcome
    where
        F: FnOnce() -> u32,
    {
        let mut outcome = CommitOutcome::default();
        let Some(session) = self.draw.take() else {
            return outcome;
        };
        if session.invalidated || session.points.is_empty() {
            return outcome;
        }

        let first_commit = self.permanent_points.is_empty();
        outcome.added = session.points.len();
        match session.end {
            DrawEnd::Front => {
                let mut prefix: Vec<Vec2> = session.points.into_iter().rev().collect();
                prefix.append(&mut self.permanent_points);
                self.permanent_points = prefix;
                for ship in &mut self.ships {
                    ship.shift_indices(outcome.added);
                }
            }
            DrawEnd::Back | DrawEnd::Fresh => {
                self.permanent_points.extend(session.points);
            }
        }

        if first_commit && self.ships.is_empty() && self.permanent_points.len() >= 2 {
            let id = next_ship_id();
            self.ships.push(Ship::new(id, self.permanent_points[0], ship_capacity));
            outcome.new_ship = Some(id);
        }

        outcome.loop_closed = self.check_loop_closed(loop_tolerance);
        outcome
    }

    /// Close the line if its ends meet; returns true only on the closing call
    ///
    /// The closing point is dropped since it duplicates the first one; ships
    /// cover that segment by wrapping from the last index to 0.
    pub fn check_loop_closed(&mut self, tolerance: f32) -> bool {
        if self.is_loop {
            return false;
        }
        let n = self.permanent_points.len();
        if n >= 3 && self.permanent_points[0].distance(self.permanent_points[n - 1]) < tolerance {
            self.permanent_points.pop();
            for ship in &mut self.ships {
                ship.wrap_indices(n - 1);
            }
            self.is_loop = true;
            self.draw = None;
            return true;
        }
        false
    }

    /// Add a fresh ship at the first waypoint (no-op on an empty line)
    pub fn add_ship(&mut self, id: u32, capacity: usize) -> Option<u32> {
        let &first = self.permanent_points.first()?;
        let mut ship = Ship::new(id, first, capacity);
        ship.strategy = MovementStrategy::BackAndForth;
        self.ships.push(ship);
        Some(id)
    }

    pub fn ship_mut(&mut self, id: u32) -> Option<&mut Ship> {
        self.ships.iter_mut().find(|s| s.id == id)
    }

    /// Whether the line has any committed geometry
    pub fn is_drawn(&self) -> bool {
        self.permanent_points.len() >= 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::platform::SymbolTextures;
    use crate::sim::cargo::CargoType;
    use crate::sim::ship::Waypoint;

    fn port_at(id: u32, pos: Vec2) -> Port {
        Port::new(id, pos, CargoType::Oil, &GameConfig::default(), &SymbolTextures)
    }

    fn commit(line: &mut RouteLine, next_id: u32) -> CommitOutcome {
        line.finalize_current_line(6, 12.0, || next_id)
    }

    #[test]
    fn test_first_commit_spawns_ship() {
        let mut line = RouteLine::new(LineColor::Red);
        line.draw = Some(DrawSession {
            end: DrawEnd::Fresh,
            anchor: None,
            points: vec![Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)],
            invalidated: false,
        });
        let outcome = commit(&mut line, 9);
        assert_eq!(line.permanent_points.len(), 2);
        assert_eq!(line.ships.len(), 1);
        assert_eq!(line.ships[0].pos, Vec2::ZERO);
        assert_eq!(outcome.new_ship, Some(9));
        assert_eq!(line.ships[0].strategy, MovementStrategy::BackAndForth);
    }

    #[test]
    fn test_island_discards_stroke() {
        let islands = [Island::new(Vec2::new(50.0, 0.0), 10.0)];
        let mut line = RouteLine::new(LineColor::Red);
        line.start_draw(Vec2::ZERO, 40.0).unwrap();
        line.extend_draw(Vec2::new(20.0, 0.0), &islands).unwrap();
        assert_eq!(
            line.extend_draw(Vec2::new(50.0, 2.0), &islands),
            Err(DrawRejection::CrossesIsland)
        );
        // Later points are ignored
        line.extend_draw(Vec2::new(100.0, 0.0), &islands).unwrap();
        let outcome = commit(&mut line, 1);
        assert_eq!(outcome.added, 0);
        assert!(line.permanent_points.is_empty());
        assert!(line.ships.is_empty());
    }

    #[test]
    fn test_front_extension_shifts_ship_indices() {
        let mut line = RouteLine::new(LineColor::Blue);
        line.start_draw(Vec2::new(100.0, 0.0), 40.0).unwrap();
        line.extend_draw(Vec2::new(200.0, 0.0), &[]).unwrap();
        commit(&mut line, 1);
        line.ships[0].current_index = 1;

        line.start_draw(Vec2::new(105.0, 0.0), 40.0).unwrap();
        assert_eq!(line.draw.as_ref().unwrap().end, DrawEnd::Front);
        line.extend_draw(Vec2::new(50.0, 0.0), &[]).unwrap();
        line.extend_draw(Vec2::new(0.0, 0.0), &[]).unwrap();
        let outcome = commit(&mut line, 2);

        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.new_ship, None);
        assert_eq!(
            line.permanent_points,
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(50.0, 0.0),
                Vec2::new(100.0, 0.0),
                Vec2::new(200.0, 0.0)
            ]
        );
        let ship = &line.ships[0];
        assert_eq!(line.permanent_points[ship.current_index], Vec2::new(200.0, 0.0));
    }

    #[test]
    fn test_start_away_from_ends_rejected() {
        let mut line = RouteLine::new(LineColor::Red);
        line.permanent_points = vec![Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(200.0, 0.0)];
        assert_eq!(
            line.start_draw(Vec2::new(100.0, 0.0), 40.0),
            Err(DrawRejection::NotAtLineEnd)
        );
        assert!(line.draw.is_none());
    }

    #[test]
    fn test_loop_closure_is_sticky() {
        let mut line = RouteLine::new(LineColor::Green);
        line.permanent_points = vec![Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(50.0, 80.0)];
        line.start_draw(Vec2::new(50.0, 80.0), 40.0).unwrap();
        line.extend_draw(Vec2::new(2.0, 3.0), &[]).unwrap();
        let outcome = commit(&mut line, 1);
        assert!(outcome.loop_closed);
        assert!(line.is_loop);
        assert_eq!(
            line.permanent_points,
            vec![Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(50.0, 80.0)]
        );
        for _ in 0..3 {
            assert!(!line.check_loop_closed(12.0));
            assert!(line.is_loop);
        }
        assert_eq!(line.start_draw(Vec2::ZERO, 40.0), Err(DrawRejection::LineClosed));
    }

    #[test]
    fn test_closing_point_maps_ships_to_start() {
        let mut line = RouteLine::new(LineColor::Green);
        line.permanent_points = vec![
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
            Vec2::new(50.0, 80.0),
            Vec2::ZERO,
        ];
        line.add_ship(1, 6);
        line.add_ship(2, 6);
        line.ships[0].current_index = 3;
        line.ships[1].current_index = 2;
        line.ships[1].depart(
            Waypoint {
                index: 3,
                point: Vec2::ZERO,
                going_forward: true,
            },
            0.0,
            &GameConfig::default(),
            None,
            false,
        );

        assert!(line.check_loop_closed(12.0));
        assert_eq!(line.permanent_points.len(), 3);
        assert_eq!(line.ships[0].current_index, 0);
        assert_eq!(line.ships[1].current_index, 2);
        assert_eq!(line.ships[1].transit.unwrap().target_index, 0);
    }

    #[test]
    fn test_validate_connection_rules() {
        let ports = vec![
            port_at(1, Vec2::new(0.0, 0.0)),
            port_at(2, Vec2::new(200.0, 0.0)),
        ];
        let mut line = RouteLine::new(LineColor::Red);

        // Ends nowhere near a port
        line.start_draw(Vec2::new(5.0, 0.0), 40.0).unwrap();
        line.extend_draw(Vec2::new(120.0, 0.0), &[]).unwrap();
        assert_eq!(line.validate_connection(&ports, 30.0), Err(DrawRejection::NoPortAtEnd));

        // Same port at both ends
        line.start_draw(Vec2::new(5.0, 0.0), 40.0).unwrap();
        line.extend_draw(Vec2::new(60.0, 0.0), &[]).unwrap();
        line.extend_draw(Vec2::new(3.0, 4.0), &[]).unwrap();
        assert_eq!(line.validate_connection(&ports, 30.0), Err(DrawRejection::SamePort));

        // Valid, then duplicate
        line.start_draw(Vec2::new(5.0, 0.0), 40.0).unwrap();
        line.extend_draw(Vec2::new(195.0, 0.0), &[]).unwrap();
        let connection = line.validate_connection(&ports, 30.0).unwrap();
        assert_eq!((connection.from, connection.to), (0, 1));
        line.record_connection(connection.pair);
        assert_eq!(
            line.validate_connection(&ports, 30.0),
            Err(DrawRejection::AlreadyConnected)
        );
    }

    #[test]
    fn test_port_pair_is_unordered() {
        assert_eq!(PortPair::new(3, 1), PortPair::new(1, 3));
        assert_eq!(PortPair::new(3, 1).ids(), (1, 3));
    }
}
