//! Purge towers: sacrificial columns printed in each material range so the
//! mix settles before the range's real paths.

use gradient_kernel::{MaterialRange, Polygon};
use gradient_kernel_math::{Point2, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlicerError};
use crate::path::Path;
use crate::route::Tour;

/// Purge tower placement and shape, in bed coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurgeSettings {
    /// Lower-left corner of the zone reserved for towers.
    pub zone_min: [f64; 2],
    /// Upper-right corner of the zone.
    pub zone_max: [f64; 2],
    /// Tower footprint in X and Y (mm).
    pub tower_size: [f64; 2],
    /// Center-to-center spacing in X and Y (mm).
    pub spacing: [f64; 2],
    /// Concentric loops per tower and layer.
    pub wall_count: u32,
}

impl Default for PurgeSettings {
    fn default() -> Self {
        Self {
            zone_min: [0.0, 0.0],
            zone_max: [260.0, 260.0],
            tower_size: [12.0, 12.0],
            spacing: [12.0, 12.0],
            wall_count: 56,
        }
    }
}

impl PurgeSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        for axis in 0..2 {
            if !(self.tower_size[axis] > 0.0) {
                return Err(SlicerError::InvalidSettings(
                    "purge tower_size must be positive".into(),
                ));
            }
            if self.spacing[axis] < self.tower_size[axis] {
                return Err(SlicerError::InvalidSettings(
                    "purge spacing must be at least the tower size so towers don't overlap".into(),
                ));
            }
            if !(self.zone_max[axis] > self.zone_min[axis]) {
                return Err(SlicerError::InvalidSettings(
                    "purge zone_max must lie above zone_min".into(),
                ));
            }
        }
        if self.wall_count == 0 {
            return Err(SlicerError::InvalidSettings(
                "purge wall_count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// The anchor reserved for one material range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PurgeTowerCenter {
    /// Range printed on this tower.
    pub range: MaterialRange,
    /// Tower center.
    pub center: Point2,
}

impl PurgeTowerCenter {
    /// Shift the center by `offset`.
    pub fn translate(&mut self, offset: &Vec2) {
        self.center += offset;
    }
}

/// Grid-aligned tower positions filling the zone, row-major from the
/// lower-left corner.
pub fn candidate_centers(settings: &PurgeSettings) -> Vec<Point2> {
    let [sx, sy] = settings.spacing;
    if !(sx > 0.0 && sy > 0.0) {
        return Vec::new();
    }
    let mut centers = Vec::new();
    let mut y = settings.zone_min[1] + sy / 2.0;
    while y < settings.zone_max[1] {
        let mut x = settings.zone_min[0] + sx / 2.0;
        while x < settings.zone_max[0] {
            centers.push(Point2::new(x, y));
            x += sx;
        }
        y += sy;
    }
    centers
}

/// Assign one candidate position per range, in range order.
pub fn plan_purge_towers(
    settings: &PurgeSettings,
    ranges: &[MaterialRange],
) -> Result<Vec<PurgeTowerCenter>> {
    settings.validate()?;
    let candidates = candidate_centers(settings);
    if candidates.len() < ranges.len() {
        return Err(SlicerError::InsufficientPurgeCenters {
            available: candidates.len(),
            required: ranges.len(),
        });
    }
    Ok(ranges
        .iter()
        .zip(candidates)
        .map(|(range, center)| PurgeTowerCenter {
            range: *range,
            center,
        })
        .collect())
}

/// One layer of a tower: concentric loops shrinking by a bead each, every
/// loop preceded by a travel from the previous position.
pub fn tower_paths(
    tower: &PurgeTowerCenter,
    settings: &PurgeSettings,
    bead_width: f64,
    start: Point2,
) -> Tour {
    let [width, depth] = settings.tower_size;
    let mut paths = Vec::new();
    let mut current = start;

    for i in 0..settings.wall_count {
        let inset = 2.0 * bead_width * f64::from(i);
        if width - inset <= 0.0 || depth - inset <= 0.0 {
            break;
        }
        let rect = Polygon::rectangle(tower.center, width - inset, depth - inset);
        for ring in rect.to_polylines() {
            let loop_path = Path::from_polyline(ring, tower.range);
            let (Some(entry), Some(exit)) = (loop_path.start().copied(), loop_path.end().copied())
            else {
                continue;
            };
            paths.push(Path::travel(current, entry));
            paths.push(loop_path);
            current = exit;
        }
    }

    Tour {
        paths,
        end: current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gradient_kernel::generate_linear_ranges;

    fn small_zone() -> PurgeSettings {
        PurgeSettings {
            zone_min: [0.0, 0.0],
            zone_max: [30.0, 20.0],
            tower_size: [8.0, 8.0],
            spacing: [10.0, 10.0],
            wall_count: 3,
        }
    }

    #[test]
    fn test_candidates_are_row_major() {
        let centers = candidate_centers(&small_zone());
        assert_eq!(centers.len(), 6);
        assert_eq!(centers[0], Point2::new(5.0, 5.0));
        assert_eq!(centers[1], Point2::new(15.0, 5.0));
        assert_eq!(centers[3], Point2::new(5.0, 15.0));
    }

    #[test]
    fn test_one_center_per_range_in_order() {
        let ranges = generate_linear_ranges(4, 0.0, 1.0);
        let towers = plan_purge_towers(&small_zone(), &ranges).unwrap();
        assert_eq!(towers.len(), 4);
        for (tower, range) in towers.iter().zip(&ranges) {
            assert_eq!(tower.range, *range);
        }
        assert_eq!(towers[3].center, Point2::new(5.0, 15.0));
    }

    #[test]
    fn test_too_few_centers_is_fatal() {
        let ranges = generate_linear_ranges(7, 0.0, 1.0);
        match plan_purge_towers(&small_zone(), &ranges) {
            Err(SlicerError::InsufficientPurgeCenters {
                available,
                required,
            }) => {
                assert_eq!(available, 6);
                assert_eq!(required, 7);
            }
            other => panic!("expected InsufficientPurgeCenters, got {other:?}"),
        }
    }

    #[test]
    fn test_overlapping_towers_rejected() {
        let settings = PurgeSettings {
            spacing: [5.0, 5.0],
            ..small_zone()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_tower_loops_shrink_and_start_with_travel() {
        let tower = PurgeTowerCenter {
            range: MaterialRange::new(0.0, 0.5),
            center: Point2::new(5.0, 5.0),
        };
        let tour = tower_paths(&tower, &small_zone(), 0.5, Point2::origin());
        assert_eq!(tour.paths.len(), 6);
        assert!(tour.paths[0].is_travel());
        assert!(tour.paths[1].is_extrusion());
        assert_eq!(tour.paths[1].range, tower.range);
        assert_relative_eq!(tour.paths[1].length(), 32.0, epsilon = 1e-9);
        assert_relative_eq!(tour.paths[3].length(), 28.0, epsilon = 1e-9);
        assert_relative_eq!(tour.paths[5].length(), 24.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tower_stops_when_loops_collapse() {
        let settings = PurgeSettings {
            wall_count: 56,
            ..small_zone()
        };
        let tower = PurgeTowerCenter {
            range: MaterialRange::FULL,
            center: Point2::new(5.0, 5.0),
        };
        // 8 mm tower, 1 mm per loop on each axis: insets 0..=7 fit.
        let tour = tower_paths(&tower, &settings, 0.5, Point2::origin());
        assert_eq!(tour.paths.len(), 16);
    }
}
