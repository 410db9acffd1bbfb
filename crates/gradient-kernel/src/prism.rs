//! Reference kernel: a planar footprint extruded between two heights with a
//! material field defined over it.

use gradient_kernel_math::{Bounds2, Bounds3, Point2, Point3, Vec2};
use serde::{Deserialize, Serialize};

use crate::clip::clip_polylines;
use crate::clipper::{intersect_polygons, offset_polygons};
use crate::error::{KernelError, Result};
use crate::field::{FieldSpec, MaterialField, PlanarField};
use crate::geometry::{polygons_bounds, ring_signed_area, Outline, Polygon, Polyline};
use crate::range::{MaterialRange, RegionBoundary};
use crate::GeometryKernel;

/// Extra margin around the footprint when building band polygons (mm).
const BAND_MARGIN: f64 = 1.0;

/// Serializable description of one footprint polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonSpec {
    /// Outer ring as `[x, y]` pairs.
    pub exterior: Vec<[f64; 2]>,
    /// Hole rings.
    #[serde(default)]
    pub holes: Vec<Vec<[f64; 2]>>,
}

/// Serializable description of a prism solid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrismSpec {
    /// Footprint polygons.
    pub footprint: Vec<PolygonSpec>,
    /// Bottom of the solid (mm).
    pub z_min: f64,
    /// Top of the solid (mm).
    pub z_max: f64,
    /// Material distribution.
    #[serde(default)]
    pub field: FieldSpec,
}

fn ring_from_spec(ring: &[[f64; 2]]) -> Vec<Point2> {
    ring.iter().map(|p| Point2::new(p[0], p[1])).collect()
}

fn check_ring(ring: &[Point2], what: &str) -> Result<()> {
    if ring.len() < 3 {
        return Err(KernelError::InvalidGeometry(format!(
            "{what} ring has {} points, need at least 3",
            ring.len()
        )));
    }
    if ring.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(KernelError::InvalidGeometry(format!(
            "{what} ring has non-finite coordinates"
        )));
    }
    if ring_signed_area(ring).abs() < 1e-12 {
        return Err(KernelError::InvalidGeometry(format!("{what} ring has zero area")));
    }
    Ok(())
}

/// A footprint extruded from `z_min` to `z_max`.
#[derive(Debug, Clone)]
pub struct PrismKernel {
    footprint: Vec<Polygon>,
    z_min: f64,
    z_max: f64,
    field: FieldSpec,
}

impl PrismKernel {
    /// Build a kernel, validating the footprint and field.
    pub fn new(footprint: Vec<Polygon>, z_min: f64, z_max: f64, field: FieldSpec) -> Result<Self> {
        if footprint.is_empty() {
            return Err(KernelError::InvalidGeometry("footprint is empty".into()));
        }
        for poly in &footprint {
            check_ring(&poly.exterior, "outer")?;
            for hole in &poly.holes {
                check_ring(hole, "hole")?;
            }
        }
        if !(z_min.is_finite() && z_max.is_finite()) || z_max <= z_min {
            return Err(KernelError::InvalidGeometry(format!(
                "z range [{z_min}, {z_max}] is empty"
            )));
        }
        field.validate()?;
        Ok(Self {
            footprint,
            z_min,
            z_max,
            field,
        })
    }

    /// Build a kernel from its serialized description.
    pub fn from_spec(spec: &PrismSpec) -> Result<Self> {
        let footprint = spec
            .footprint
            .iter()
            .map(|p| {
                Polygon::with_holes(
                    ring_from_spec(&p.exterior),
                    p.holes.iter().map(|h| ring_from_spec(h)).collect(),
                )
            })
            .collect();
        Self::new(footprint, spec.z_min, spec.z_max, spec.field.clone())
    }

    /// A `width` x `depth` bar centered on the origin, standing on z = 0.
    pub fn bar(width: f64, depth: f64, height: f64, field: FieldSpec) -> Result<Self> {
        Self::new(
            vec![Polygon::rectangle(Point2::origin(), width, depth)],
            0.0,
            height,
            field,
        )
    }

    /// The material field.
    pub fn field(&self) -> &FieldSpec {
        &self.field
    }

    /// Band polygon covering `bounds` where the affine field lies in `range`.
    ///
    /// Bounds at or beyond 0 and 1 are left open, since the field is clamped.
    fn band_polygon(gradient: &Vec2, offset: f64, range: &MaterialRange, bounds: &Bounds2) -> Option<Polygon> {
        let norm = gradient.norm();
        let u = gradient.normalize();
        let v = Vec2::new(-u.y, u.x);

        let (mut s_min, mut s_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut t_min, mut t_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for corner in bounds.corners() {
            let s = corner.coords.dot(&u);
            let t = corner.coords.dot(&v);
            s_min = s_min.min(s);
            s_max = s_max.max(s);
            t_min = t_min.min(t);
            t_max = t_max.max(t);
        }
        s_min -= BAND_MARGIN;
        s_max += BAND_MARGIN;
        t_min -= BAND_MARGIN;
        t_max += BAND_MARGIN;

        let s_lo = if range.lower > 0.0 {
            s_min.max((range.lower - offset) / norm)
        } else {
            s_min
        };
        let s_hi = if range.higher < 1.0 {
            s_max.min((range.higher - offset) / norm)
        } else {
            s_max
        };
        if s_hi - s_lo <= 1e-12 {
            return None;
        }

        let at = |s: f64, t: f64| Point2::from(u * s + v * t);
        Some(Polygon::new(vec![
            at(s_lo, t_min),
            at(s_hi, t_min),
            at(s_hi, t_max),
            at(s_lo, t_max),
        ]))
    }
}

impl MaterialField for PrismKernel {
    fn fraction(&self, p: &Point3) -> f64 {
        self.field.fraction(p)
    }
}

impl GeometryKernel for PrismKernel {
    fn bounds(&self) -> Bounds3 {
        let xy = polygons_bounds(&self.footprint);
        Bounds3 {
            min: [xy.min[0], xy.min[1], self.z_min],
            max: [xy.max[0], xy.max[1], self.z_max],
        }
    }

    fn cross_section(&self, z: f64) -> Result<Outline> {
        if !z.is_finite() {
            return Err(KernelError::InvalidGeometry(format!("cannot slice at z = {z}")));
        }
        if z < self.z_min || z > self.z_max {
            return Ok(Outline::default());
        }
        Ok(Outline::new(self.footprint.clone()))
    }

    fn offset(&self, polygons: &[Polygon], distance: f64) -> Vec<Polygon> {
        offset_polygons(polygons, distance)
    }

    fn material_regions(&self, z: f64, ranges: &[MaterialRange]) -> Result<Vec<RegionBoundary>> {
        let outline = self.cross_section(z)?;
        if outline.is_empty() {
            return Ok(ranges
                .iter()
                .map(|range| RegionBoundary {
                    range: *range,
                    polygons: Vec::new(),
                })
                .collect());
        }

        let bounds = outline.bounds();
        log::trace!("partitioning layer at z={z:.3} into {} ranges", ranges.len());
        let regions = ranges
            .iter()
            .map(|range| {
                let polygons = match self.field.at_height(z) {
                    PlanarField::Uniform(value) => {
                        if range.contains(value) {
                            outline.polygons.clone()
                        } else {
                            Vec::new()
                        }
                    }
                    PlanarField::Affine { gradient, offset } => {
                        match Self::band_polygon(&gradient, offset, range, &bounds) {
                            Some(band) => intersect_polygons(&outline.polygons, &[band]),
                            None => Vec::new(),
                        }
                    }
                };
                RegionBoundary {
                    range: *range,
                    polygons,
                }
            })
            .collect();
        Ok(regions)
    }

    fn clip(&self, boundary: &[Polygon], subjects: &[Polyline]) -> Vec<Polyline> {
        clip_polylines(boundary, subjects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn x_gradient_bar() -> PrismKernel {
        // Fraction runs from 0 at x = -50 to 1 at x = 50.
        PrismKernel::bar(
            100.0,
            20.0,
            5.0,
            FieldSpec::Linear {
                gradient: [0.01, 0.0, 0.0],
                offset: 0.5,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_cross_section_outside_height_is_empty() {
        let kernel = x_gradient_bar();
        assert!(kernel.cross_section(-0.1).unwrap().is_empty());
        assert!(kernel.cross_section(5.1).unwrap().is_empty());
        assert_eq!(kernel.cross_section(2.0).unwrap().polygons.len(), 1);
    }

    #[test]
    fn test_regions_split_footprint_by_fraction() {
        let kernel = x_gradient_bar();
        let ranges = [MaterialRange::new(0.0, 0.5), MaterialRange::new(0.5, 1.0)];
        let regions = kernel.material_regions(1.0, &ranges).unwrap();
        assert_eq!(regions.len(), 2);
        for region in &regions {
            let area: f64 = region.polygons.iter().map(Polygon::area).sum();
            assert_abs_diff_eq!(area, 1000.0, epsilon = 1e-2);
        }
        // The lower band is the half with negative x.
        assert!(regions[0].polygons[0].bounds().max[0] <= 1e-3);
    }

    #[test]
    fn test_nudged_ranges_cover_clamped_ends() {
        let kernel = PrismKernel::bar(
            100.0,
            20.0,
            5.0,
            FieldSpec::Linear {
                gradient: [0.02, 0.0, 0.0],
                offset: 0.5,
            },
        )
        .unwrap();
        // The field saturates for |x| > 25; the outer bands must still own those parts.
        let ranges = [MaterialRange::new(-1.0, 0.5), MaterialRange::new(0.5, 2.0)];
        let regions = kernel.material_regions(1.0, &ranges).unwrap();
        let total: f64 = regions
            .iter()
            .flat_map(|r| r.polygons.iter())
            .map(Polygon::area)
            .sum();
        assert_abs_diff_eq!(total, 2000.0, epsilon = 1e-2);
    }

    #[test]
    fn test_uniform_field_assigns_whole_layer() {
        let kernel = PrismKernel::bar(10.0, 10.0, 1.0, FieldSpec::Constant { value: 0.5 }).unwrap();
        let ranges = [MaterialRange::new(0.0, 0.5), MaterialRange::new(0.5, 1.0)];
        let regions = kernel.material_regions(0.5, &ranges).unwrap();
        assert!(regions[0].polygons.is_empty());
        assert_eq!(regions[1].polygons.len(), 1);
    }

    #[test]
    fn test_invalid_geometry_is_rejected() {
        let degenerate = Polygon::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert!(PrismKernel::new(vec![degenerate], 0.0, 1.0, FieldSpec::default()).is_err());
        assert!(PrismKernel::bar(1.0, 1.0, 0.0, FieldSpec::default()).is_err());
        assert!(PrismKernel::bar(1.0, 1.0, 1.0, FieldSpec::Constant { value: 2.0 }).is_err());
    }

    #[test]
    fn test_from_spec() {
        let spec: PrismSpec = serde_json::from_str(
            r#"{
                "footprint": [{ "exterior": [[0,0],[10,0],[10,10],[0,10]] }],
                "z_min": 0.0,
                "z_max": 2.0,
                "field": { "type": "linear", "gradient": [0.1, 0.0, 0.0], "offset": 0.0 }
            }"#,
        )
        .unwrap();
        let kernel = PrismKernel::from_spec(&spec).unwrap();
        let b = kernel.bounds();
        assert_abs_diff_eq!(b.max[0], 10.0);
        assert_abs_diff_eq!(b.max[2], 2.0);
        assert_abs_diff_eq!(kernel.fraction(&Point3::new(5.0, 0.0, 0.0)), 0.5);
    }
}
