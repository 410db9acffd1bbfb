//! Region partitioning: cut a layer's walls and infill into material-range
//! regions, optionally interdigitating neighbouring regions across each
//! shared boundary.
//!
//! With interdigitation, every boundary between two ranges gets an overlap
//! band. Paths clipped into the band are stitched onto the left or right
//! neighbour by endpoint proximity, and the band itself is dropped. The
//! result has continuous chains across the boundary, but which material a
//! point within the overlap width is printed in is only approximate.

use gradient_kernel::{GeometryKernel, MaterialRange, Polygon, Polyline};
use gradient_kernel_math::{Point2, Tolerance};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::infill::generate_rectilinear_infill;
use crate::layer::Region;
use crate::walls::{generate_walls, wall_polylines, WallPlan};

/// Fraction bound used in place of 0 when querying the kernel.
const NUDGED_LOWER: f64 = -1.0;

/// Fraction bound used in place of 1 when querying the kernel.
const NUDGED_HIGHER: f64 = 2.0;

/// Overlap band configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterdigitationSettings {
    /// Width of the band centered on each range boundary, in fraction units.
    pub overlap_width: f64,
}

impl Default for InterdigitationSettings {
    fn default() -> Self {
        Self {
            overlap_width: 0.05,
        }
    }
}

/// Push bounds touching 0 or 1 outward so geometry exactly at the ends of the
/// fraction interval is never lost on a clipping edge.
pub fn nudge_edges(ranges: &[MaterialRange]) -> Vec<MaterialRange> {
    ranges
        .iter()
        .map(|r| MaterialRange {
            lower: if r.lower <= 0.0 { NUDGED_LOWER } else { r.lower },
            higher: if r.higher >= 1.0 { NUDGED_HIGHER } else { r.higher },
        })
        .collect()
}

/// Clip walls and infill into each of `ranges`, in order.
fn clip_into<K>(
    kernel: &K,
    z: f64,
    ranges: &[MaterialRange],
    walls: &[Polyline],
    infill: &[Polyline],
) -> Result<Vec<(Vec<Polyline>, Vec<Polyline>)>>
where
    K: GeometryKernel + ?Sized,
{
    let boundaries = kernel.material_regions(z, &nudge_edges(ranges))?;
    Ok(boundaries
        .iter()
        .map(|b| (kernel.clip(&b.polygons, walls), kernel.clip(&b.polygons, infill)))
        .collect())
}

/// Partition a layer's geometry into one region per range.
///
/// Regions come back in `ranges` order, reversed when `reverse` is set.
/// `reverse` also flips which side the first overlap path of each boundary
/// is stitched to.
pub fn partition_layer<K>(
    kernel: &K,
    z: f64,
    walls: &[Polyline],
    infill: &[Polyline],
    ranges: &[MaterialRange],
    reverse: bool,
    interdigitation: Option<&InterdigitationSettings>,
) -> Result<Vec<Region>>
where
    K: GeometryKernel + ?Sized,
{
    let mut regions = match interdigitation {
        Some(settings) if ranges.len() > 1 => {
            interdigitate(kernel, z, walls, infill, ranges, reverse, settings)?
        }
        _ => clip_into(kernel, z, ranges, walls, infill)?
            .into_iter()
            .zip(ranges)
            .map(|((walls, infill), range)| Region {
                range: *range,
                walls,
                infill,
            })
            .collect(),
    };
    if reverse {
        regions.reverse();
    }
    Ok(regions)
}

/// Split sorted ranges into cores and overlap bands:
/// `core0, band01, core1, band12, ..., coreN`.
fn split_with_overlap(sorted: &[MaterialRange], width: f64) -> Vec<MaterialRange> {
    let half = width / 2.0;
    let n = sorted.len();
    let mut fine = Vec::with_capacity(2 * n);
    for (i, r) in sorted.iter().enumerate() {
        let lower = if i > 0 { r.lower + half } else { r.lower };
        let higher = if i + 1 < n { r.higher - half } else { r.higher };
        fine.push(MaterialRange::new(lower, higher));
        if i + 1 < n {
            fine.push(MaterialRange::new(r.higher - half, r.higher + half));
        }
    }
    fine
}

fn interdigitate<K>(
    kernel: &K,
    z: f64,
    walls: &[Polyline],
    infill: &[Polyline],
    ranges: &[MaterialRange],
    reverse: bool,
    settings: &InterdigitationSettings,
) -> Result<Vec<Region>>
where
    K: GeometryKernel + ?Sized,
{
    let mut sorted = ranges.to_vec();
    sorted.sort_by(|a, b| a.lower.total_cmp(&b.lower));
    let fine = split_with_overlap(&sorted, settings.overlap_width);

    let mut cores: Vec<Region> = Vec::with_capacity(sorted.len());
    let mut bands = Vec::with_capacity(sorted.len().saturating_sub(1));
    for (i, (walls, infill)) in clip_into(kernel, z, &fine, walls, infill)?
        .into_iter()
        .enumerate()
    {
        if i % 2 == 0 {
            cores.push(Region {
                range: sorted[i / 2],
                walls,
                infill,
            });
        } else {
            bands.push((walls, infill));
        }
    }

    let tol = Tolerance::DEFAULT;
    let mut stitched = 0usize;
    let mut loose = 0usize;
    for (k, (band_walls, band_infill)) in bands.into_iter().enumerate() {
        let (head, tail) = cores.split_at_mut(k + 1);
        let (left, right) = (&mut head[k], &mut tail[0]);

        // Wall pieces alternate sides round-robin.
        for (j, piece) in band_walls.into_iter().enumerate() {
            let target = if (j % 2 == 0) != reverse {
                &mut left.walls
            } else {
                &mut right.walls
            };
            if stitch_into(target, piece, &tol) {
                stitched += 1;
            } else {
                loose += 1;
            }
        }

        // Infill pieces switch sides whenever the scan line changes.
        let mut to_left = !reverse;
        let mut previous_y: Option<f64> = None;
        for piece in band_infill {
            let y = piece.average_y();
            if previous_y.is_some_and(|prev| (y - prev).abs() > tol.linear) {
                to_left = !to_left;
            }
            previous_y = Some(y);
            let target = if to_left {
                &mut left.infill
            } else {
                &mut right.infill
            };
            if stitch_into(target, piece, &tol) {
                stitched += 1;
            } else {
                loose += 1;
            }
        }
    }
    log::debug!("z={z:.3}: stitched {stitched} overlap paths, {loose} left unjoined");

    // Back to the caller's range order.
    let mut ordered = Vec::with_capacity(cores.len());
    for range in ranges {
        if let Some(i) = cores.iter().position(|r| r.range == *range) {
            ordered.push(cores.swap_remove(i));
        }
    }
    Ok(ordered)
}

/// Append `b` to the chain `a` if an endpoint of one lies within the join
/// tolerance of an endpoint of the other.
fn join_chains(a: &mut Vec<Point2>, b: &[Point2], tol: &Tolerance) -> bool {
    let (Some(&a0), Some(&a1), Some(&b0), Some(&b1)) = (a.first(), a.last(), b.first(), b.last())
    else {
        return false;
    };
    if tol.points_joinable(&a1, &b0) {
        a.extend_from_slice(&b[1..]);
    } else if tol.points_joinable(&a1, &b1) {
        a.extend(b.iter().rev().skip(1));
    } else if tol.points_joinable(&a0, &b1) {
        let mut joined = b.to_vec();
        joined.extend_from_slice(&a[1..]);
        *a = joined;
    } else if tol.points_joinable(&a0, &b0) {
        let mut joined: Vec<Point2> = b.iter().rev().copied().collect();
        joined.extend_from_slice(&a[1..]);
        *a = joined;
    } else {
        return false;
    }
    true
}

/// Stitch `piece` onto the first open chain in `chains` it touches, then
/// let the grown chain absorb one more chain its new end touches. Pieces
/// that touch nothing are kept as chains of their own.
fn stitch_into(chains: &mut Vec<Polyline>, piece: Polyline, tol: &Tolerance) -> bool {
    if piece.len() < 2 {
        return false;
    }
    if piece.is_closed() {
        chains.push(piece);
        return false;
    }

    let mut joined = None;
    for (i, chain) in chains.iter_mut().enumerate() {
        if chain.len() >= 2 && !chain.is_closed() && join_chains(&mut chain.points, &piece.points, tol) {
            joined = Some(i);
            break;
        }
    }
    let Some(i) = joined else {
        chains.push(piece);
        return false;
    };

    if let Some(j) = (0..chains.len()).find(|&j| {
        j != i && chains[j].len() >= 2 && !chains[j].is_closed() && {
            let (a, b) = (&chains[i].points, &chains[j].points);
            endpoints_touch(a, b, tol)
        }
    }) {
        let other = chains.remove(j);
        let i = if j < i { i - 1 } else { i };
        join_chains(&mut chains[i].points, &other.points, tol);
        close_if_touching(&mut chains[i], tol);
    } else {
        close_if_touching(&mut chains[i], tol);
    }
    true
}

fn endpoints_touch(a: &[Point2], b: &[Point2], tol: &Tolerance) -> bool {
    match (a.first(), a.last(), b.first(), b.last()) {
        (Some(a0), Some(a1), Some(b0), Some(b1)) => {
            tol.points_joinable(a1, b0)
                || tol.points_joinable(a1, b1)
                || tol.points_joinable(a0, b1)
                || tol.points_joinable(a0, b0)
        }
        _ => false,
    }
}

/// Snap a chain whose ends meet into an exactly closed loop.
fn close_if_touching(chain: &mut Polyline, tol: &Tolerance) {
    if chain.len() <= 3 || chain.is_closed() {
        return;
    }
    let first = chain.points[0];
    if let Some(last) = chain.points.last_mut() {
        if tol.points_joinable(&first, last) {
            *last = first;
        }
    }
}

/// Regions for the outline strategy: each range's polygons are inset by
/// half a bead and walled inward on their own.
///
/// With `infill_spacing` set, each region gets a single wall and the rest
/// is filled with rectilinear lines at that spacing.
pub fn outline_regions<K>(
    kernel: &K,
    z: f64,
    ranges: &[MaterialRange],
    reverse: bool,
    bead_width: f64,
    max_walls: Option<u32>,
    infill_spacing: Option<f64>,
) -> Result<Vec<Region>>
where
    K: GeometryKernel + ?Sized,
{
    let boundaries = kernel.material_regions(z, &nudge_edges(ranges))?;
    let mut regions: Vec<Region> = boundaries
        .iter()
        .zip(ranges)
        .map(|(boundary, range)| match infill_spacing {
            Some(spacing) => {
                let walls = generate_walls(kernel, &boundary.polygons, &WallPlan::region(bead_width, Some(1)));
                let area: Vec<Polygon> = walls
                    .first()
                    .map(|base| kernel.offset(base, -bead_width / 2.0))
                    .unwrap_or_default();
                Region {
                    range: *range,
                    walls: wall_polylines(&walls),
                    infill: generate_rectilinear_infill(kernel, &area, spacing),
                }
            }
            None => {
                let walls = generate_walls(kernel, &boundary.polygons, &WallPlan::region(bead_width, max_walls));
                Region {
                    range: *range,
                    walls: wall_polylines(&walls),
                    infill: Vec::new(),
                }
            }
        })
        .collect();
    if reverse {
        regions.reverse();
    }
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gradient_kernel::{generate_linear_ranges, FieldSpec, PrismKernel};

    /// 20 x 10 bar whose fraction runs 0 -> 1 along X (0.5 at x = 0).
    fn kernel() -> PrismKernel {
        PrismKernel::bar(
            20.0,
            10.0,
            1.0,
            FieldSpec::Linear {
                gradient: [0.05, 0.0, 0.0],
                offset: 0.5,
            },
        )
        .unwrap()
    }

    fn wall_loop() -> Vec<Polyline> {
        Polygon::rectangle(Point2::origin(), 19.0, 9.0).to_polylines()
    }

    fn scan_lines() -> Vec<Polyline> {
        [-3.0, -1.0, 1.0, 3.0]
            .iter()
            .map(|&y| Polyline::new(vec![Point2::new(-9.5, y), Point2::new(9.5, y)]))
            .collect()
    }

    fn total_length(regions: &[Region]) -> f64 {
        regions
            .iter()
            .flat_map(|r| r.walls.iter().chain(&r.infill))
            .map(Polyline::length)
            .sum()
    }

    #[test]
    fn test_nudge_edges() {
        let nudged = nudge_edges(&generate_linear_ranges(3, 0.0, 1.0));
        assert_relative_eq!(nudged[0].lower, -1.0);
        assert_relative_eq!(nudged[0].higher, 1.0 / 3.0);
        assert_relative_eq!(nudged[1].lower, 1.0 / 3.0);
        assert_relative_eq!(nudged[2].higher, 2.0);
        let single = nudge_edges(&[MaterialRange::FULL]);
        assert_eq!(single[0], MaterialRange::new(-1.0, 2.0));
    }

    #[test]
    fn test_plain_partition_reconstructs_geometry() {
        let ranges = generate_linear_ranges(2, 0.0, 1.0);
        let regions =
            partition_layer(&kernel(), 0.5, &wall_loop(), &scan_lines(), &ranges, false, None).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].range, ranges[0]);
        assert_relative_eq!(total_length(&regions), 56.0 + 4.0 * 19.0, epsilon = 1e-6);
        // Lower range owns the negative-X half only.
        for line in regions[0].walls.iter().chain(&regions[0].infill) {
            assert!(line.points.iter().all(|p| p.x <= 1e-3));
        }
    }

    #[test]
    fn test_reverse_flips_region_order() {
        let ranges = generate_linear_ranges(3, 0.0, 1.0);
        let regions = partition_layer(&kernel(), 0.5, &wall_loop(), &[], &ranges, true, None).unwrap();
        let order: Vec<MaterialRange> = regions.iter().map(|r| r.range).collect();
        assert_eq!(order, vec![ranges[2], ranges[1], ranges[0]]);
    }

    #[test]
    fn test_interdigitated_walls_stay_continuous() {
        let ranges = generate_linear_ranges(2, 0.0, 1.0);
        let settings = InterdigitationSettings { overlap_width: 0.2 };
        let regions = partition_layer(
            &kernel(),
            0.5,
            &wall_loop(),
            &[],
            &ranges,
            false,
            Some(&settings),
        )
        .unwrap();

        // Only the two original ranges survive, with their original bounds.
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].range, ranges[0]);
        assert_eq!(regions[1].range, ranges[1]);
        assert_relative_eq!(total_length(&regions), 56.0, epsilon = 1e-6);

        // The overlap band spans x in [-2, 2]; its bottom piece went left and
        // its top piece went right, each joined into one chain.
        assert_eq!(regions[0].walls.len(), 1);
        assert_eq!(regions[1].walls.len(), 1);
        let left_max_x = regions[0].walls[0].points.iter().map(|p| p.x).fold(f64::MIN, f64::max);
        let right_min_x = regions[1].walls[0].points.iter().map(|p| p.x).fold(f64::MAX, f64::min);
        assert_relative_eq!(left_max_x, 2.0, epsilon = 1e-3);
        assert_relative_eq!(right_min_x, -2.0, epsilon = 1e-3);
    }

    /// The infill side toggles on every change of average Y. This is a
    /// heuristic tuned for horizontal scan lines; the alternation pattern is
    /// pinned here so changes to it are deliberate.
    #[test]
    fn test_interdigitated_infill_alternates_by_scan_line() {
        let ranges = generate_linear_ranges(2, 0.0, 1.0);
        let settings = InterdigitationSettings { overlap_width: 0.2 };
        let lengths = |reverse: bool| -> Vec<f64> {
            let regions = partition_layer(
                &kernel(),
                0.5,
                &[],
                &scan_lines(),
                &ranges,
                reverse,
                Some(&settings),
            )
            .unwrap();
            let lower = regions.iter().find(|r| r.range == ranges[0]).unwrap();
            assert_relative_eq!(total_length(&regions), 4.0 * 19.0, epsilon = 1e-6);
            lower.infill.iter().map(Polyline::length).collect()
        };

        let forward = lengths(false);
        assert_eq!(forward.len(), 4);
        for (got, want) in forward.iter().zip([11.5, 7.5, 11.5, 7.5]) {
            assert_relative_eq!(*got, want, epsilon = 1e-6);
        }
        let reversed = lengths(true);
        for (got, want) in reversed.iter().zip([7.5, 11.5, 7.5, 11.5]) {
            assert_relative_eq!(*got, want, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_unmatched_piece_is_kept() {
        let mut chains = vec![Polyline::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)])];
        let far = Polyline::new(vec![Point2::new(5.0, 5.0), Point2::new(6.0, 5.0)]);
        assert!(!stitch_into(&mut chains, far, &Tolerance::DEFAULT));
        assert_eq!(chains.len(), 2);
    }

    #[test]
    fn test_bridge_piece_merges_two_chains() {
        let mut chains = vec![
            Polyline::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]),
            Polyline::new(vec![Point2::new(2.0, 0.0), Point2::new(3.0, 0.0)]),
        ];
        let bridge = Polyline::new(vec![Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)]);
        assert!(stitch_into(&mut chains, bridge, &Tolerance::DEFAULT));
        assert_eq!(chains.len(), 1);
        assert_relative_eq!(chains[0].length(), 3.0);
        assert_eq!(chains[0].points.len(), 4);
    }

    #[test]
    fn test_outline_regions_wall_each_range() {
        let ranges = generate_linear_ranges(2, 0.0, 1.0);
        let regions = outline_regions(&kernel(), 0.5, &ranges, false, 1.0, None, None).unwrap();
        assert_eq!(regions.len(), 2);
        // Each half is 10 x 10: insets 0.5..4.5 give five loops.
        assert_eq!(regions[0].walls.len(), 5);
        assert_eq!(regions[1].walls.len(), 5);
        assert!(regions[0].infill.is_empty());

        let filled = outline_regions(&kernel(), 0.5, &ranges, true, 1.0, None, Some(1.0)).unwrap();
        assert_eq!(filled[0].range, ranges[1]);
        assert_eq!(filled[0].walls.len(), 1);
        assert!(!filled[0].infill.is_empty());
    }
}
