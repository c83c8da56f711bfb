//! Collision and proximity tests
//!
//! Everything in the playfield that can be hit is a circle (ports, islands,
//! storms) or an axis-aligned rectangle (playfield, HUD regions), so the
//! whole module is point/circle/rect arithmetic.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in playfield coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        (self.max - self.min).max(Vec2::ZERO)
    }

    /// True when the rectangle has no area
    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    /// Inclusive point containment
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Inset every edge by `margin`
    pub fn shrink(&self, margin: f32) -> Self {
        Self::new(self.min + Vec2::splat(margin), self.max - Vec2::splat(margin))
    }

    /// Distance from `p` to the rectangle (0 inside)
    pub fn distance_to(&self, p: Vec2) -> f32 {
        let clamped = p.clamp(self.min, self.max);
        p.distance(clamped)
    }
}

/// Strict point-in-circle test (the rim itself is outside)
#[inline]
pub fn point_in_circle(p: Vec2, center: Vec2, radius: f32) -> bool {
    p.distance_squared(center) < radius * radius
}

/// Index of the closest point within `radius` of `target`
pub fn nearest_within<I>(points: I, target: Vec2, radius: f32) -> Option<usize>
where
    I: IntoIterator<Item = Vec2>,
{
    let limit = radius * radius;
    let mut best: Option<(usize, f32)> = None;
    for (i, p) in points.into_iter().enumerate() {
        let d = p.distance_squared(target);
        if d > limit {
            continue;
        }
        match best {
            Some((_, best_d)) if best_d <= d => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Whether a circle keeps at least `clearance` away from every rectangle
pub fn circle_clear_of_rects(center: Vec2, clearance: f32, rects: &[Rect]) -> bool {
    rects.iter().all(|r| r.distance_to(center) >= clearance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_in_circle_rim_is_outside() {
        let c = Vec2::new(10.0, 10.0);
        assert!(point_in_circle(Vec2::new(12.0, 10.0), c, 5.0));
        assert!(!point_in_circle(Vec2::new(15.0, 10.0), c, 5.0));
        assert!(!point_in_circle(Vec2::new(30.0, 10.0), c, 5.0));
    }

    #[test]
    fn test_nearest_within_picks_closest() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(8.0, 0.0), Vec2::new(4.0, 0.0)];
        assert_eq!(nearest_within(points, Vec2::new(5.0, 0.0), 10.0), Some(2));
        assert_eq!(nearest_within(points, Vec2::new(50.0, 0.0), 10.0), None);
    }

    #[test]
    fn test_rect_shrink_and_distance() {
        let r = Rect::new(Vec2::ZERO, Vec2::new(100.0, 50.0));
        let inner = r.shrink(10.0);
        assert_eq!(inner.min, Vec2::new(10.0, 10.0));
        assert_eq!(inner.max, Vec2::new(90.0, 40.0));
        assert!(r.shrink(30.0).is_empty());
        assert_eq!(r.distance_to(Vec2::new(50.0, 25.0)), 0.0);
        assert!((r.distance_to(Vec2::new(110.0, 25.0)) - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_circle_clear_of_rects() {
        let hud = [Rect::new(Vec2::ZERO, Vec2::new(100.0, 20.0))];
        assert!(circle_clear_of_rects(Vec2::new(50.0, 60.0), 30.0, &hud));
        assert!(!circle_clear_of_rects(Vec2::new(50.0, 30.0), 30.0, &hud));
    }
}
