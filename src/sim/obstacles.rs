//! Static islands and the transient storm

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::point_in_circle;

/// Circular landmass routes may not be drawn through
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Island {
    pub pos: Vec2,
    pub radius: f32,
}

impl Island {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self { pos, radius }
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        point_in_circle(p, self.pos, self.radius)
    }
}

/// Slowdown zone; a new storm replaces the previous one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Storm {
    pub pos: Vec2,
    pub radius: f32,
}

impl Storm {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self { pos, radius }
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        point_in_circle(p, self.pos, self.radius)
    }
}

/// True if `p` falls inside any island
pub fn hits_island(islands: &[Island], p: Vec2) -> bool {
    islands.iter().any(|i| i.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_island() {
        let islands = [Island::new(Vec2::new(100.0, 100.0), 30.0)];
        assert!(hits_island(&islands, Vec2::new(110.0, 95.0)));
        assert!(!hits_island(&islands, Vec2::new(140.0, 100.0)));
        assert!(!hits_island(&[], Vec2::ZERO));
    }
}
