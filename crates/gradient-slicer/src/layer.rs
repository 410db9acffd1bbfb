//! A sliced layer: outline, per-region geometry and the routed tour.

use gradient_kernel::{MaterialRange, Outline, Polyline};
use gradient_kernel_math::{Bounds2, Point2, Vec2};

use crate::path::Path;
use crate::purge::{tower_paths, PurgeSettings, PurgeTowerCenter};
use crate::route::{route, TravelInsertion};

/// Wall and infill polylines of one material range within a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Material range of the region.
    pub range: MaterialRange,
    /// Wall chains.
    pub walls: Vec<Polyline>,
    /// Infill lines.
    pub infill: Vec<Polyline>,
}

impl Region {
    /// Create an empty region.
    pub fn new(range: MaterialRange) -> Self {
        Self {
            range,
            walls: Vec::new(),
            infill: Vec::new(),
        }
    }

    /// True if the region has nothing to print.
    pub fn is_empty(&self) -> bool {
        self.walls.is_empty() && self.infill.is_empty()
    }

    /// Walls then infill as extrusion paths in the region's range.
    pub fn to_paths(&self) -> Vec<Path> {
        self.walls
            .iter()
            .chain(&self.infill)
            .filter(|p| p.len() >= 2)
            .map(|p| Path::from_polyline(p.clone(), self.range))
            .collect()
    }
}

/// Purge tower inputs for routing one layer.
#[derive(Debug, Clone, Copy)]
pub struct PurgePlan<'a> {
    /// Tower per range.
    pub towers: &'a [PurgeTowerCenter],
    /// Tower shape.
    pub settings: &'a PurgeSettings,
}

/// One z-height slice of the object.
#[derive(Debug, Clone)]
pub struct Layer {
    /// 1-based number, counting only non-empty layers.
    pub number: usize,
    /// Print height (mm). Equals `model_z` until the layer is translated.
    pub z: f64,
    /// Height the cross-section was taken at, in model coordinates.
    pub model_z: f64,
    /// Cross-section outline.
    pub outline: Outline,
    /// Geometry per material range, in print order.
    pub regions: Vec<Region>,
    /// Routed tour. Empty until [`Layer::connect_paths`] runs.
    pub paths: Vec<Path>,
}

impl Layer {
    /// Create a layer with no geometry.
    pub fn new(number: usize, z: f64, outline: Outline) -> Self {
        Self {
            number,
            z,
            model_z: z,
            outline,
            regions: Vec::new(),
            paths: Vec::new(),
        }
    }

    /// Route every region into the layer's tour.
    ///
    /// Regions are visited in order. When purge towers are planned, each
    /// range's tower is printed right before that range's paths, on every
    /// layer, so all towers grow together. Returns where the tour ends.
    pub fn connect_paths(
        &mut self,
        start: Point2,
        purge: Option<PurgePlan<'_>>,
        bead_width: f64,
        travel: TravelInsertion,
    ) -> Point2 {
        let mut paths = Vec::new();
        let mut current = start;

        for region in &self.regions {
            let tower = purge.and_then(|plan| {
                plan.towers
                    .iter()
                    .find(|t| t.range == region.range)
                    .map(|t| (t, plan.settings))
            });
            if let Some((tower, settings)) = tower {
                let tour = tower_paths(tower, settings, bead_width, current);
                paths.extend(tour.paths);
                current = tour.end;
            }

            let tour = route(region.to_paths(), current, travel);
            paths.extend(tour.paths);
            current = tour.end;
        }

        self.paths = paths;
        current
    }

    /// Shift the tour in XY and the print height by `dz`.
    pub fn translate(&mut self, offset: &Vec2, dz: f64) {
        for path in &mut self.paths {
            path.translate(offset);
        }
        self.z = self.model_z + dz;
    }

    /// Bounds of every point in the tour.
    pub fn bounds(&self) -> Bounds2 {
        let mut bounds = Bounds2::empty();
        for path in &self.paths {
            bounds.merge(&path.bounds());
        }
        bounds
    }

    /// Total extrusion length of the tour (mm).
    pub fn extrusion_length(&self) -> f64 {
        self.paths.iter().filter(|p| p.is_extrusion()).map(Path::length).sum()
    }

    /// Total travel length of the tour (mm).
    pub fn travel_length(&self) -> f64 {
        self.paths.iter().filter(|p| p.is_travel()).map(Path::length).sum()
    }
}
