#![warn(missing_docs)]

//! Math types for the gradient slicer kernel.
//!
//! Thin wrappers around nalgebra providing the planar types used for
//! toolpath work: points, vectors, axis-aligned bounds, translations and
//! tolerance constants.

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// A point in the XY plane.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in the XY plane.
pub type Vec2 = Vector2<f64>;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// Straight-line distance between two planar points.
pub fn distance(a: &Point2, b: &Point2) -> f64 {
    (b - a).norm()
}

/// Point at parameter `t` along the segment `a -> b`.
pub fn lerp(a: &Point2, b: &Point2, t: f64) -> Point2 {
    a + (b - a) * t
}

/// Total length of an open chain of points.
pub fn chain_length(points: &[Point2]) -> f64 {
    points.windows(2).map(|w| distance(&w[0], &w[1])).sum()
}

/// A planar translation combined with a Z shift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Translation {
    /// XY offset.
    pub xy: Vec2,
    /// Z offset.
    pub z: f64,
}

impl Translation {
    /// Identity translation.
    pub fn identity() -> Self {
        Self {
            xy: Vec2::zeros(),
            z: 0.0,
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn new(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            xy: Vec2::new(dx, dy),
            z: dz,
        }
    }

    /// Apply the XY part to a point.
    pub fn apply(&self, p: &Point2) -> Point2 {
        p + self.xy
    }
}

impl Default for Translation {
    fn default() -> Self {
        Self::identity()
    }
}

/// Axis-aligned bounding rectangle in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2 {
    /// Minimum corner.
    pub min: [f64; 2],
    /// Maximum corner.
    pub max: [f64; 2],
}

impl Bounds2 {
    /// An empty box that any included point will replace.
    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY, f64::INFINITY],
            max: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }

    /// Bounds of a set of points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.include(p);
        }
        bounds
    }

    /// True if no point has been included.
    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    /// Grow to contain `p`.
    pub fn include(&mut self, p: &Point2) {
        self.min[0] = self.min[0].min(p.x);
        self.min[1] = self.min[1].min(p.y);
        self.max[0] = self.max[0].max(p.x);
        self.max[1] = self.max[1].max(p.y);
    }

    /// Grow to contain another box.
    pub fn merge(&mut self, other: &Bounds2) {
        if other.is_empty() {
            return;
        }
        self.include(&Point2::new(other.min[0], other.min[1]));
        self.include(&Point2::new(other.max[0], other.max[1]));
    }

    /// Center of the box.
    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        )
    }

    /// Width and height.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.max[0] - self.min[0], self.max[1] - self.min[1])
    }

    /// The four corners, counter-clockwise from the minimum corner.
    pub fn corners(&self) -> [Point2; 4] {
        [
            Point2::new(self.min[0], self.min[1]),
            Point2::new(self.max[0], self.min[1]),
            Point2::new(self.max[0], self.max[1]),
            Point2::new(self.min[0], self.max[1]),
        ]
    }
}

impl Default for Bounds2 {
    fn default() -> Self {
        Self::empty()
    }
}

/// Axis-aligned bounding box of a solid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds3 {
    /// Minimum corner.
    pub min: [f64; 3],
    /// Maximum corner.
    pub max: [f64; 3],
}

impl Bounds3 {
    /// Projection onto the XY plane.
    pub fn xy(&self) -> Bounds2 {
        Bounds2 {
            min: [self.min[0], self.min[1]],
            max: [self.max[0], self.max[1]],
        }
    }
}

/// Tolerance constants for planar toolpath comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance below which coordinates are considered identical (mm).
    pub linear: f64,
    /// Endpoint proximity used when joining or stitching paths (mm).
    pub join: f64,
    /// Area below which a polygon is considered collapsed (mm²).
    pub area: f64,
}

impl Tolerance {
    /// Default toolpath tolerances.
    pub const DEFAULT: Self = Self {
        linear: 1e-9,
        join: 0.05,
        area: 1e-6,
    };

    /// Check if two points are coincident within the linear tolerance.
    pub fn points_equal(&self, a: &Point2, b: &Point2) -> bool {
        distance(a, b) < self.linear
    }

    /// Check if two points are close enough to be joined.
    pub fn points_joinable(&self, a: &Point2, b: &Point2) -> bool {
        distance(a, b) <= self.join
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_and_lerp() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(3.0, 4.0);
        assert_relative_eq!(distance(&a, &b), 5.0);
        let mid = lerp(&a, &b, 0.5);
        assert_relative_eq!(mid.x, 1.5);
        assert_relative_eq!(mid.y, 2.0);
    }

    #[test]
    fn test_chain_length() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 2.0),
        ];
        assert_relative_eq!(chain_length(&pts), 3.0);
        assert_relative_eq!(chain_length(&pts[..1]), 0.0);
    }

    #[test]
    fn test_translation() {
        let t = Translation::new(10.0, -5.0, 0.2);
        let p = t.apply(&Point2::new(1.0, 1.0));
        assert_relative_eq!(p.x, 11.0);
        assert_relative_eq!(p.y, -4.0);
        assert_relative_eq!(t.z, 0.2);
    }

    #[test]
    fn test_bounds() {
        let mut b = Bounds2::empty();
        assert!(b.is_empty());
        b.include(&Point2::new(-1.0, 2.0));
        b.include(&Point2::new(3.0, -2.0));
        assert!(!b.is_empty());
        assert_relative_eq!(b.center().x, 1.0);
        assert_relative_eq!(b.center().y, 0.0);
        assert_relative_eq!(b.size().x, 4.0);

        let mut other = Bounds2::empty();
        other.merge(&b);
        assert_eq!(other, b);
    }

    #[test]
    fn test_tolerance() {
        let tol = Tolerance::DEFAULT;
        let a = Point2::new(1.0, 1.0);
        assert!(tol.points_joinable(&a, &Point2::new(1.04, 1.0)));
        assert!(!tol.points_joinable(&a, &Point2::new(1.06, 1.0)));
        assert!(tol.points_equal(&a, &Point2::new(1.0 + 1e-12, 1.0)));
        assert!(tol.is_zero(1e-12));
    }
}
