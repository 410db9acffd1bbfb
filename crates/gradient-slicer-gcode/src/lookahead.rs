//! Distance to the next material change.
//!
//! [`UpcomingPaths`] walks the paths still to be printed without collecting
//! them, so a scan stops as soon as the distance limit is passed no matter
//! how many layers remain. It is `Clone`, so each scan restarts cheaply from
//! the emitter's current position.

use gradient_kernel::MaterialRange;
use gradient_slicer::{Layer, Path};

/// Paths after a position in the program, in print order.
#[derive(Debug, Clone)]
pub struct UpcomingPaths<'a> {
    layers: &'a [Layer],
    layer: usize,
    path: usize,
    across_layers: bool,
}

impl<'a> UpcomingPaths<'a> {
    /// Paths after `layers[layer].paths[path]`. With `across_layers` unset
    /// the sequence stops at the end of that layer.
    pub fn after(layers: &'a [Layer], layer: usize, path: usize, across_layers: bool) -> Self {
        Self {
            layers,
            layer,
            path: path + 1,
            across_layers,
        }
    }
}

impl<'a> Iterator for UpcomingPaths<'a> {
    type Item = &'a Path;

    fn next(&mut self) -> Option<&'a Path> {
        loop {
            let layer = self.layers.get(self.layer)?;
            if let Some(path) = layer.paths.get(self.path) {
                self.path += 1;
                return Some(path);
            }
            if !self.across_layers {
                return None;
            }
            self.layer += 1;
            self.path = 0;
        }
    }
}

/// The next range that differs from the active one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeChange {
    /// Extrusion distance until the change (mm).
    pub distance: f64,
    /// Range printed after the change.
    pub range: MaterialRange,
}

/// Find the next range change within `limit` millimetres of extrusion.
///
/// `remaining` is what is left of the path being printed. Travels are
/// skipped: they neither count toward the distance nor end the active range.
pub fn next_range_change<'a>(
    active: MaterialRange,
    remaining: f64,
    upcoming: impl Iterator<Item = &'a Path>,
    limit: f64,
) -> Option<RangeChange> {
    let mut distance = remaining;
    if distance >= limit {
        return None;
    }
    for path in upcoming.filter(|p| p.is_extrusion()) {
        if path.range != active {
            return Some(RangeChange {
                distance,
                range: path.range,
            });
        }
        distance += path.length();
        if distance >= limit {
            return None;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gradient_kernel::Outline;
    use gradient_kernel_math::Point2;

    fn line(x: f64, len: f64, range: MaterialRange) -> Path {
        Path::extrusion(vec![Point2::new(x, 0.0), Point2::new(x, len)], range)
    }

    fn layer(number: usize, paths: Vec<Path>) -> Layer {
        let mut layer = Layer::new(number, number as f64 * 0.2, Outline::default());
        layer.paths = paths;
        layer
    }

    #[test]
    fn test_upcoming_crosses_layers_lazily() {
        let a = MaterialRange::new(0.0, 0.5);
        let layers = vec![
            layer(1, vec![line(0.0, 1.0, a), line(1.0, 2.0, a)]),
            layer(2, vec![]),
            layer(3, vec![line(2.0, 3.0, a)]),
        ];
        let within: Vec<f64> = UpcomingPaths::after(&layers, 0, 0, false)
            .map(Path::length)
            .collect();
        assert_eq!(within, vec![2.0]);

        let across = UpcomingPaths::after(&layers, 0, 0, true);
        let restart = across.clone();
        assert_eq!(across.count(), 2);
        assert_eq!(restart.count(), 2);
    }

    #[test]
    fn test_next_range_change() {
        let a = MaterialRange::new(0.0, 0.5);
        let b = MaterialRange::new(0.5, 1.0);
        let layers = vec![
            layer(1, vec![line(0.0, 4.0, a), Path::travel(Point2::new(0.0, 4.0), Point2::new(9.0, 0.0)), line(1.0, 3.0, a)]),
            layer(2, vec![line(2.0, 5.0, b)]),
        ];

        let change = next_range_change(a, 1.5, UpcomingPaths::after(&layers, 0, 0, true), 10.0).unwrap();
        assert_relative_eq!(change.distance, 4.5);
        assert_eq!(change.range, b);

        // Too far away.
        assert!(next_range_change(a, 1.5, UpcomingPaths::after(&layers, 0, 0, true), 4.0).is_none());
        // Not visible without cross-layer look-ahead.
        assert!(next_range_change(a, 1.5, UpcomingPaths::after(&layers, 0, 0, false), 10.0).is_none());
    }
}
