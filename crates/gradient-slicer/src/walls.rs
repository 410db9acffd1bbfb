//! Wall (perimeter) generation by repeated inward offset of an outline.

use gradient_kernel::{GeometryKernel, Polygon, Polyline};

/// Upper bound on offset passes when walls are generated until collapse.
pub const MAX_WALL_ATTEMPTS: u32 = 100;

/// Fraction of the bead width the first wall is pulled in from the outline
/// when walls are later clipped into regions, so clipped walls of adjacent
/// regions never touch.
pub const CUTTING_UNDERSIZE: f64 = 0.02;

/// How to offset an outline into nested walls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallPlan {
    /// Inset of the first wall from the outline (mm).
    pub first_inset: f64,
    /// Spacing between consecutive walls (mm).
    pub bead_width: f64,
    /// Number of walls, or `None` to keep going until the offset collapses.
    pub max_walls: Option<u32>,
}

impl WallPlan {
    /// Walls generated on the whole outline before clipping into regions.
    pub fn cutting(bead_width: f64, max_walls: Option<u32>) -> Self {
        Self {
            first_inset: bead_width * CUTTING_UNDERSIZE,
            bead_width,
            max_walls,
        }
    }

    /// Walls generated inside an already-partitioned region.
    pub fn region(bead_width: f64, max_walls: Option<u32>) -> Self {
        Self {
            first_inset: bead_width / 2.0,
            bead_width,
            max_walls,
        }
    }

    fn limit(&self) -> u32 {
        self.max_walls.unwrap_or(MAX_WALL_ATTEMPTS).min(MAX_WALL_ATTEMPTS)
    }
}

/// Generate nested walls, outermost first.
///
/// Each entry holds the polygons of one wall index: an inset can split a
/// region in two or open holes, so a wall is a polygon set. Iteration stops
/// as soon as an offset comes back empty. If the first inset is already
/// empty the outline gets no walls at all.
pub fn generate_walls<K>(kernel: &K, outline: &[Polygon], plan: &WallPlan) -> Vec<Vec<Polygon>>
where
    K: GeometryKernel + ?Sized,
{
    let limit = plan.limit();
    if limit == 0 || outline.is_empty() {
        return Vec::new();
    }

    let base = kernel.offset(outline, -plan.first_inset);
    if base.is_empty() {
        return Vec::new();
    }

    let mut walls = Vec::new();
    for i in 1..limit {
        let inner = kernel.offset(&base, -plan.bead_width * f64::from(i));
        if inner.is_empty() {
            break;
        }
        walls.push(inner);
    }
    walls.insert(0, base);

    if plan.max_walls.is_none() && walls.len() as u32 == MAX_WALL_ATTEMPTS {
        log::warn!(
            "wall generation stopped after {MAX_WALL_ATTEMPTS} passes without the offset collapsing"
        );
    }
    walls
}

/// Flatten walls into closed polylines (outer loops before their holes).
pub fn wall_polylines(walls: &[Vec<Polygon>]) -> Vec<Polyline> {
    walls
        .iter()
        .flatten()
        .flat_map(Polygon::to_polylines)
        .filter(|p| p.len() >= 2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use gradient_kernel::{FieldSpec, PrismKernel};
    use gradient_kernel_math::Point2;

    fn square_kernel() -> PrismKernel {
        PrismKernel::bar(10.0, 10.0, 1.0, FieldSpec::default()).unwrap()
    }

    fn square() -> Vec<Polygon> {
        vec![Polygon::rectangle(Point2::origin(), 10.0, 10.0)]
    }

    #[test]
    fn test_fixed_wall_count() {
        let kernel = square_kernel();
        let walls = generate_walls(&kernel, &square(), &WallPlan::region(0.4, Some(3)));
        assert_eq!(walls.len(), 3);
        // Inset 0.2, 0.6, 1.0 from each side.
        assert_abs_diff_eq!(walls[0][0].area(), 9.6 * 9.6, epsilon = 1e-3);
        assert_abs_diff_eq!(walls[1][0].area(), 8.8 * 8.8, epsilon = 1e-3);
        assert_abs_diff_eq!(walls[2][0].area(), 8.0 * 8.0, epsilon = 1e-3);
    }

    #[test]
    fn test_walls_until_collapse() {
        let kernel = square_kernel();
        let walls = generate_walls(&kernel, &square(), &WallPlan::region(1.0, None));
        // Insets 0.5, 1.5, 2.5, 3.5, 4.5 leave a positive area; 5.5 collapses.
        assert_eq!(walls.len(), 5);
    }

    #[test]
    fn test_cutting_first_wall_is_undersized() {
        let kernel = square_kernel();
        let walls = generate_walls(&kernel, &square(), &WallPlan::cutting(0.5, Some(2)));
        let inset = 0.5 * CUTTING_UNDERSIZE;
        let side = 10.0 - 2.0 * inset;
        assert_abs_diff_eq!(walls[0][0].area(), side * side, epsilon = 1e-3);
        assert_abs_diff_eq!(walls[1][0].area(), (side - 1.0) * (side - 1.0), epsilon = 1e-3);
    }

    #[test]
    fn test_too_small_outline_has_no_walls() {
        let kernel = square_kernel();
        let tiny = vec![Polygon::rectangle(Point2::origin(), 0.3, 0.3)];
        assert!(generate_walls(&kernel, &tiny, &WallPlan::region(0.4, Some(3))).is_empty());
    }

    #[test]
    fn test_wall_polylines_are_closed() {
        let kernel = square_kernel();
        let walls = generate_walls(&kernel, &square(), &WallPlan::region(0.4, Some(2)));
        let loops = wall_polylines(&walls);
        assert_eq!(loops.len(), 2);
        assert!(loops.iter().all(Polyline::is_closed));
    }
}
