//! Planar geometry types: polylines, polygons with holes, layer outlines.

use gradient_kernel_math::{chain_length, Bounds2, Point2, Tolerance, Vec2};

/// An open (or explicitly closed) chain of points.
///
/// A closed loop repeats its first point at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    /// Points along the path.
    pub points: Vec<Point2>,
}

impl Polyline {
    /// Create a new polyline.
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Total length of the polyline.
    pub fn length(&self) -> f64 {
        chain_length(&self.points)
    }

    /// Starting point.
    pub fn start(&self) -> Option<&Point2> {
        self.points.first()
    }

    /// Ending point.
    pub fn end(&self) -> Option<&Point2> {
        self.points.last()
    }

    /// True if the last point coincides with the first.
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) if self.points.len() > 2 => Tolerance::DEFAULT.points_equal(a, b),
            _ => false,
        }
    }

    /// Reverse the direction of travel.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Shift every point by `offset`.
    pub fn translate(&mut self, offset: &Vec2) {
        for p in &mut self.points {
            *p += offset;
        }
    }

    /// Mean Y coordinate of the points.
    pub fn average_y(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.iter().map(|p| p.y).sum::<f64>() / self.points.len() as f64
    }

    /// Consecutive point pairs.
    pub fn segments(&self) -> impl Iterator<Item = (&Point2, &Point2)> {
        self.points.windows(2).map(|w| (&w[0], &w[1]))
    }
}

/// Signed area of a ring (positive when counter-clockwise).
pub fn ring_signed_area(ring: &[Point2]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += ring[i].x * ring[j].y;
        area -= ring[j].x * ring[i].y;
    }
    area / 2.0
}

/// Even-odd point-in-ring test.
pub fn point_in_ring(point: &Point2, ring: &[Point2]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let pi = &ring[i];
        let pj = &ring[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// A polygon with an outer ring and zero or more hole rings.
///
/// Rings are stored open (no repeated closing point).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Outer boundary.
    pub exterior: Vec<Point2>,
    /// Hole boundaries.
    pub holes: Vec<Vec<Point2>>,
}

impl Polygon {
    /// Polygon without holes.
    pub fn new(exterior: Vec<Point2>) -> Self {
        Self {
            exterior,
            holes: Vec::new(),
        }
    }

    /// Polygon with holes.
    pub fn with_holes(exterior: Vec<Point2>, holes: Vec<Vec<Point2>>) -> Self {
        Self { exterior, holes }
    }

    /// Axis-aligned rectangle around `center`, counter-clockwise.
    pub fn rectangle(center: Point2, width: f64, height: f64) -> Self {
        let hx = width / 2.0;
        let hy = height / 2.0;
        Self::new(vec![
            Point2::new(center.x - hx, center.y - hy),
            Point2::new(center.x + hx, center.y - hy),
            Point2::new(center.x + hx, center.y + hy),
            Point2::new(center.x - hx, center.y + hy),
        ])
    }

    /// Net enclosed area (outer minus holes).
    pub fn area(&self) -> f64 {
        let outer = ring_signed_area(&self.exterior).abs();
        let holes: f64 = self.holes.iter().map(|h| ring_signed_area(h).abs()).sum();
        outer - holes
    }

    /// True if the point lies inside the outer ring and outside every hole.
    pub fn contains(&self, point: &Point2) -> bool {
        point_in_ring(point, &self.exterior) && !self.holes.iter().any(|h| point_in_ring(point, h))
    }

    /// All rings, outer first.
    pub fn rings(&self) -> impl Iterator<Item = &Vec<Point2>> {
        std::iter::once(&self.exterior).chain(self.holes.iter())
    }

    /// Bounding box of the outer ring.
    pub fn bounds(&self) -> Bounds2 {
        Bounds2::from_points(&self.exterior)
    }

    /// Shift every ring by `offset`.
    pub fn translate(&mut self, offset: &Vec2) {
        for ring in std::iter::once(&mut self.exterior).chain(self.holes.iter_mut()) {
            for p in ring.iter_mut() {
                *p += offset;
            }
        }
    }

    /// Convert each ring into a closed polyline, outer ring first.
    pub fn to_polylines(&self) -> Vec<Polyline> {
        self.rings()
            .filter(|ring| ring.len() >= 3)
            .map(|ring| {
                let mut points = ring.clone();
                points.push(ring[0]);
                Polyline::new(points)
            })
            .collect()
    }
}

/// True if the point is inside any polygon of the set.
pub fn polygons_contain(polygons: &[Polygon], point: &Point2) -> bool {
    polygons.iter().any(|p| p.contains(point))
}

/// Bounds of a polygon set.
pub fn polygons_bounds(polygons: &[Polygon]) -> Bounds2 {
    let mut bounds = Bounds2::empty();
    for poly in polygons {
        bounds.merge(&poly.bounds());
    }
    bounds
}

/// One layer's boundary: the polygons of a horizontal cross-section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    /// Cross-section polygons (with holes).
    pub polygons: Vec<Polygon>,
}

impl Outline {
    /// Wrap a polygon set.
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    /// True if the cross-section holds no material.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Bounds of all polygons.
    pub fn bounds(&self) -> Bounds2 {
        polygons_bounds(&self.polygons)
    }

    /// Total enclosed area.
    pub fn area(&self) -> f64 {
        self.polygons.iter().map(Polygon::area).sum()
    }

    /// Shift every polygon by `offset`.
    pub fn translate(&mut self, offset: &Vec2) {
        for poly in &mut self.polygons {
            poly.translate(offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(size: f64) -> Polygon {
        Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
        ])
    }

    #[test]
    fn test_polygon_area_with_hole() {
        let mut poly = square(10.0);
        poly.holes.push(vec![
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 4.0),
            Point2::new(4.0, 4.0),
            Point2::new(4.0, 2.0),
        ]);
        assert_relative_eq!(poly.area(), 96.0);
        assert!(poly.contains(&Point2::new(5.0, 5.0)));
        assert!(!poly.contains(&Point2::new(3.0, 3.0)));
        assert!(!poly.contains(&Point2::new(11.0, 3.0)));
    }

    #[test]
    fn test_to_polylines_closes_rings() {
        let lines = square(2.0).to_polylines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 5);
        assert!(lines[0].is_closed());
        assert_relative_eq!(lines[0].length(), 8.0);
    }

    #[test]
    fn test_polyline_reverse_and_translate() {
        let mut line = Polyline::new(vec![Point2::new(0.0, 0.0), Point2::new(2.0, 1.0)]);
        line.reverse();
        assert_eq!(line.start(), Some(&Point2::new(2.0, 1.0)));
        line.translate(&Vec2::new(1.0, 1.0));
        assert_eq!(line.end(), Some(&Point2::new(1.0, 1.0)));
        assert_relative_eq!(line.average_y(), 1.5);
        assert!(!line.is_closed());
    }

    #[test]
    fn test_rectangle_is_ccw() {
        let rect = Polygon::rectangle(Point2::new(5.0, 5.0), 4.0, 2.0);
        assert!(ring_signed_area(&rect.exterior) > 0.0);
        assert_relative_eq!(rect.area(), 8.0);
        let b = rect.bounds();
        assert_relative_eq!(b.min[0], 3.0);
        assert_relative_eq!(b.max[1], 6.0);
    }
}
