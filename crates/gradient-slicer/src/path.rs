//! Printable paths: a point chain tagged as extrusion or travel and with
//! the material range it is printed in.

use gradient_kernel::{MaterialRange, Polyline};
use gradient_kernel_math::{chain_length, Bounds2, Point2, Vec2};
use serde::{Deserialize, Serialize};

/// Whether a path deposits material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    /// Material is extruded along the path.
    Extrusion,
    /// Non-printing move.
    Travel,
}

/// A single printable curve.
///
/// Travel paths always carry [`MaterialRange::TRAVEL`].
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Points in print order (at least two).
    pub points: Vec<Point2>,
    /// Extrusion or travel.
    pub kind: PathKind,
    /// Material range the path is printed in.
    pub range: MaterialRange,
}

impl Path {
    /// Create an extrusion path.
    pub fn extrusion(points: Vec<Point2>, range: MaterialRange) -> Self {
        Self {
            points,
            kind: PathKind::Extrusion,
            range,
        }
    }

    /// Create a straight travel move.
    pub fn travel(from: Point2, to: Point2) -> Self {
        Self {
            points: vec![from, to],
            kind: PathKind::Travel,
            range: MaterialRange::TRAVEL,
        }
    }

    /// Wrap a polyline as an extrusion in `range`.
    pub fn from_polyline(polyline: Polyline, range: MaterialRange) -> Self {
        Self::extrusion(polyline.points, range)
    }

    /// True if the path deposits material.
    pub fn is_extrusion(&self) -> bool {
        self.kind == PathKind::Extrusion
    }

    /// True for non-printing moves.
    pub fn is_travel(&self) -> bool {
        self.kind == PathKind::Travel
    }

    /// Total length.
    pub fn length(&self) -> f64 {
        chain_length(&self.points)
    }

    /// First point.
    pub fn start(&self) -> Option<&Point2> {
        self.points.first()
    }

    /// Last point.
    pub fn end(&self) -> Option<&Point2> {
        self.points.last()
    }

    /// Reverse the print direction.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Shift every point by `offset`.
    pub fn translate(&mut self, offset: &Vec2) {
        for p in &mut self.points {
            *p += offset;
        }
    }

    /// Consecutive point pairs.
    pub fn segments(&self) -> impl Iterator<Item = (&Point2, &Point2)> {
        self.points.windows(2).map(|w| (&w[0], &w[1]))
    }

    /// Bounds of the points.
    pub fn bounds(&self) -> Bounds2 {
        Bounds2::from_points(&self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_travel_carries_travel_range() {
        let t = Path::travel(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0));
        assert!(t.is_travel());
        assert_eq!(t.range, MaterialRange::TRAVEL);
        assert_relative_eq!(t.length(), 5.0);
    }

    #[test]
    fn test_reverse_and_translate() {
        let mut p = Path::extrusion(
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)],
            MaterialRange::new(0.0, 0.5),
        );
        p.reverse();
        assert_eq!(p.start(), Some(&Point2::new(1.0, 1.0)));
        p.translate(&Vec2::new(10.0, -1.0));
        assert_eq!(p.end(), Some(&Point2::new(10.0, -1.0)));
        assert_eq!(p.segments().count(), 2);
        assert_relative_eq!(p.length(), 2.0);
    }
}
