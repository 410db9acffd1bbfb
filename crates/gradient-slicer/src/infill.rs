//! Rectilinear infill.

use gradient_kernel::{polygons_bounds, GeometryKernel, Polygon, Polyline};
use gradient_kernel_math::{Bounds2, Point2};

/// Line spacing that yields `density` coverage with beads of `bead_width`.
pub fn infill_spacing(bead_width: f64, density: f64) -> f64 {
    bead_width / density
}

/// Horizontal scan lines across `bounds`, `spacing` apart.
///
/// Lines start half a spacing above the bottom edge so none runs along it.
pub fn scan_lines(bounds: &Bounds2, spacing: f64) -> Vec<Polyline> {
    if bounds.is_empty() || !(spacing.is_finite() && spacing > 0.0) {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut y = bounds.min[1] + spacing / 2.0;
    while y < bounds.max[1] {
        lines.push(Polyline::new(vec![
            Point2::new(bounds.min[0], y),
            Point2::new(bounds.max[0], y),
        ]));
        y += spacing;
    }
    lines
}

/// Fill `boundary` with horizontal lines clipped to it.
pub fn generate_rectilinear_infill<K>(kernel: &K, boundary: &[Polygon], spacing: f64) -> Vec<Polyline>
where
    K: GeometryKernel + ?Sized,
{
    if boundary.is_empty() {
        return Vec::new();
    }
    let lines = scan_lines(&polygons_bounds(boundary), spacing);
    kernel.clip(boundary, &lines)
}

/// Area left for infill: the innermost wall (or the outline when there are
/// no walls) inset by one bead width.
pub fn infill_boundary<K>(
    kernel: &K,
    walls: &[Vec<Polygon>],
    outline: &[Polygon],
    bead_width: f64,
) -> Vec<Polygon>
where
    K: GeometryKernel + ?Sized,
{
    let innermost = walls.last().map(Vec::as_slice).unwrap_or(outline);
    kernel.offset(innermost, -bead_width)
}
