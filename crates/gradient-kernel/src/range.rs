//! Material-fraction ranges and the region boundaries a kernel returns for them.

use serde::{Deserialize, Serialize};

use crate::geometry::Polygon;

/// A band `[lower, higher]` of the volume fraction of the second material.
///
/// Travel moves carry the degenerate range `[0, 0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialRange {
    /// Lower bound of the fraction.
    pub lower: f64,
    /// Upper bound of the fraction.
    pub higher: f64,
}

impl MaterialRange {
    /// Range attached to travel moves.
    pub const TRAVEL: Self = Self {
        lower: 0.0,
        higher: 0.0,
    };

    /// The whole fraction interval.
    pub const FULL: Self = Self {
        lower: 0.0,
        higher: 1.0,
    };

    /// Create a range, ordering the bounds so that `lower <= higher`.
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            lower: a.min(b),
            higher: a.max(b),
        }
    }

    /// Midpoint of the band, used as the blend ratio.
    pub fn midpoint(&self) -> f64 {
        (self.lower + self.higher) / 2.0
    }

    /// Width of the band.
    pub fn width(&self) -> f64 {
        self.higher - self.lower
    }

    /// True for exactly `[0, 1]`.
    pub fn is_full(&self) -> bool {
        self.lower == 0.0 && self.higher == 1.0
    }

    /// True if `self` lies inside `outer`.
    pub fn within(&self, outer: &MaterialRange) -> bool {
        self.lower >= outer.lower && self.higher <= outer.higher
    }

    /// True if the fraction value falls in this band.
    ///
    /// The band is half-open except at the top of the fraction interval, so
    /// adjacent bands never both claim a shared boundary value.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && (value < self.higher || (self.higher >= 1.0 && value <= self.higher))
    }
}

impl std::fmt::Display for MaterialRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.4}, {:.4}]", self.lower, self.higher)
    }
}

/// Split `[min, max]` into `count` equal consecutive ranges.
pub fn generate_linear_ranges(count: usize, min: f64, max: f64) -> Vec<MaterialRange> {
    if count == 0 {
        return Vec::new();
    }
    let step = (max - min) / count as f64;
    (0..count)
        .map(|i| {
            let lower = min + i as f64 * step;
            // Last range ends exactly on `max` regardless of rounding.
            let higher = if i + 1 == count { max } else { min + (i + 1) as f64 * step };
            MaterialRange::new(lower, higher)
        })
        .collect()
}

/// The cross-section polygons whose material fraction lies within `range`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionBoundary {
    /// The range queried.
    pub range: MaterialRange,
    /// Polygons of the layer belonging to the range.
    pub polygons: Vec<Polygon>,
}
