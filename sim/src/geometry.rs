//! Geometry primitives used by target acquisition.
//!
//! Everything here works in world space with Z up. Capsules approximate agent
//! bodies and firing lines; `Rect` is the axis-aligned footprint used to query
//! the spatial grid; `SearchArea` is the oriented sub-cell picked each phase.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

const EPSILON: f32 = 1.0e-6;

/// A line segment swept by a sphere.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Capsule {
    pub a: Vec3,
    pub b: Vec3,
    pub radius: f32,
}

impl Capsule {
    pub fn new(a: Vec3, b: Vec3, radius: f32) -> Self {
        Self { a, b, radius }
    }

    /// True if the two capsules overlap (touching counts).
    pub fn intersects(&self, other: &Capsule) -> bool {
        let reach = self.radius + other.radius;
        segment_distance_sq(self.a, self.b, other.a, other.b) <= reach * reach
    }
}

/// Squared distance between the closest points of segments `p1q1` and `p2q2`.
pub fn segment_distance_sq(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> f32 {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    // Both segments degenerate into points
    if a <= EPSILON && e <= EPSILON {
        return r.length_squared();
    }

    let (s, t) = if a <= EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            // Parallel segments: pick an arbitrary s and let t follow
            let s = if denom > EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let t = (b * s + f) / e;
            if t < 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else if t > 1.0 {
                (((b - c) / a).clamp(0.0, 1.0), 1.0)
            } else {
                (s, t)
            }
        }
    };

    let closest_1 = p1 + d1 * s;
    let closest_2 = p2 + d2 * t;
    (closest_1 - closest_2).length_squared()
}

/// Axis-aligned rectangle on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Smallest rectangle containing all `points` (projected onto XY).
    pub fn enclosing(points: &[Vec3]) -> Self {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for p in points {
            min = min.min(p.truncate());
            max = max.max(p.truncate());
        }
        Self { min, max }
    }

}

/// One oriented sub-cell of an agent's search grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchArea {
    pub center: Vec3,
    /// Unit vector of the searching agent's forward direction.
    pub forward: Vec3,
    /// Unit vector of the searching agent's right direction.
    pub right: Vec3,
    /// Half the side length of the square sub-cell.
    pub half_extent: f32,
}

impl SearchArea {
    pub fn corners(&self) -> [Vec3; 4] {
        let f = self.forward * self.half_extent;
        let r = self.right * self.half_extent;
        [
            self.center - f - r,
            self.center - f + r,
            self.center + f + r,
            self.center + f - r,
        ]
    }

    /// Axis-aligned footprint, used for grid cell enumeration.
    pub fn bounds(&self) -> Rect {
        Rect::enclosing(&self.corners())
    }

    /// True if `point` lies inside the oriented square (height ignored).
    pub fn contains(&self, point: Vec3) -> bool {
        let offset = point - self.center;
        let along_forward = offset.dot(self.forward);
        let along_right = offset.dot(self.right);
        along_forward.abs() <= self.half_extent + EPSILON
            && along_right.abs() <= self.half_extent + EPSILON
    }
}
