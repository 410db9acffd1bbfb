//! Polygon offset and boolean operations through geo-clipper.

use geo::{Area, Coord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, EndType, JoinType};
use gradient_kernel_math::{Point2, Tolerance};

use crate::geometry::Polygon;

/// Fixed-point scale handed to Clipper (1e-4 mm resolution).
const CLIPPER_FACTOR: f64 = 1.0e4;

/// Miter limit for offset corners.
const MITER_LIMIT: f64 = 2.0;

fn ring_to_geo(ring: &[Point2]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = ring.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last()) {
        if first != *last {
            coords.push(first);
        }
    }
    LineString::new(coords)
}

fn ring_from_geo(ring: &LineString<f64>) -> Vec<Point2> {
    let mut points: Vec<Point2> = ring.coords().map(|c| Point2::new(c.x, c.y)).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn to_geo(poly: &Polygon) -> GeoPolygon<f64> {
    GeoPolygon::new(
        ring_to_geo(&poly.exterior),
        poly.holes.iter().map(|h| ring_to_geo(h)).collect(),
    )
}

fn to_geo_multi(polys: &[Polygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(polys.iter().map(to_geo).collect())
}

fn from_geo_multi(multi: &MultiPolygon<f64>) -> Vec<Polygon> {
    multi
        .0
        .iter()
        .filter(|p| p.unsigned_area() > Tolerance::DEFAULT.area)
        .map(|p| {
            Polygon::with_holes(
                ring_from_geo(p.exterior()),
                p.interiors()
                    .iter()
                    .map(ring_from_geo)
                    .filter(|h| h.len() >= 3)
                    .collect(),
            )
        })
        .filter(|p| p.exterior.len() >= 3)
        .collect()
}

/// Offset a polygon set. Negative distances shrink.
///
/// The result may hold more polygons than the input (necking splits a
/// region) or none at all (the region collapsed).
pub fn offset_polygons(polygons: &[Polygon], distance: f64) -> Vec<Polygon> {
    if polygons.is_empty() {
        return Vec::new();
    }
    let result = to_geo_multi(polygons).offset(
        distance,
        JoinType::Miter(MITER_LIMIT),
        EndType::ClosedPolygon,
        CLIPPER_FACTOR,
    );
    from_geo_multi(&result)
}

/// Intersection of two polygon sets.
pub fn intersect_polygons(subject: &[Polygon], clip: &[Polygon]) -> Vec<Polygon> {
    if subject.is_empty() || clip.is_empty() {
        return Vec::new();
    }
    let result = to_geo_multi(subject).intersection(&to_geo_multi(clip), CLIPPER_FACTOR);
    from_geo_multi(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square(size: f64) -> Polygon {
        Polygon::rectangle(Point2::new(size / 2.0, size / 2.0), size, size)
    }

    #[test]
    fn test_inward_offset() {
        let result = offset_polygons(&[square(10.0)], -1.0);
        assert_eq!(result.len(), 1);
        assert_abs_diff_eq!(result[0].area(), 64.0, epsilon = 1e-3);
    }

    #[test]
    fn test_offset_collapses_to_nothing() {
        let result = offset_polygons(&[square(2.0)], -1.5);
        assert!(result.is_empty());
    }

    #[test]
    fn test_offset_keeps_holes() {
        let mut poly = square(20.0);
        poly.holes.push(vec![
            Point2::new(8.0, 8.0),
            Point2::new(8.0, 12.0),
            Point2::new(12.0, 12.0),
            Point2::new(12.0, 8.0),
        ]);
        let result = offset_polygons(&[poly], -1.0);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].holes.len(), 1);
        // 18x18 outer minus a 6x6 hole
        assert_abs_diff_eq!(result[0].area(), 324.0 - 36.0, epsilon = 1e-2);
    }

    #[test]
    fn test_intersection() {
        let a = square(10.0);
        let b = Polygon::rectangle(Point2::new(10.0, 5.0), 10.0, 20.0);
        let result = intersect_polygons(&[a], &[b]);
        assert_eq!(result.len(), 1);
        assert_abs_diff_eq!(result[0].area(), 50.0, epsilon = 1e-3);
        assert!(intersect_polygons(&[], &[square(1.0)]).is_empty());
    }
}
