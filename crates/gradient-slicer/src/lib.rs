#![warn(missing_docs)]

//! Multi-material gradient slicer.
//!
//! Turns the per-layer outlines and material-fraction regions of a
//! [`GeometryKernel`] into one ordered, connected path list per layer:
//! walls and infill are generated, cut into material-range regions
//! (optionally interdigitated across each region boundary), chained into a
//! tour with purge towers in front of each range, and placed on the bed.
//!
//! # Example
//!
//! ```ignore
//! use gradient_kernel::{FieldSpec, PrismKernel};
//! use gradient_slicer::{slice, SliceSettings};
//!
//! let kernel = PrismKernel::bar(40.0, 10.0, 5.0, FieldSpec::default())?;
//! let result = slice(&kernel, &SliceSettings::default())?;
//!
//! println!("Layers: {}", result.layers.len());
//! println!("Extrusion: {:.0} mm", result.stats.extrusion_length);
//! ```

pub mod error;
pub mod infill;
pub mod layer;
pub mod partition;
pub mod path;
pub mod purge;
pub mod route;
pub mod slice;
pub mod walls;

pub use error::{Result, SlicerError};
pub use infill::{generate_rectilinear_infill, infill_spacing};
pub use layer::{Layer, Region};
pub use partition::{nudge_edges, outline_regions, partition_layer, InterdigitationSettings};
pub use path::{Path, PathKind};
pub use purge::{candidate_centers, plan_purge_towers, tower_paths, PurgeSettings, PurgeTowerCenter};
pub use route::{route, Tour, TravelInsertion};
pub use slice::{cross_sections, layer_heights, placement};
pub use walls::{generate_walls, WallPlan, MAX_WALL_ATTEMPTS};

use gradient_kernel::{generate_linear_ranges, GeometryKernel, MaterialRange};
use gradient_kernel_math::{Bounds2, Point2};
use serde::{Deserialize, Serialize};

use crate::slice::{process_layers, LayerContext};

/// How layer geometry is turned into regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Walls and infill are generated on the whole outline, then cut into
    /// regions. Supports interdigitation.
    #[default]
    Cutting,
    /// Each region's polygons are walled on their own.
    Outline {
        /// One wall per region, the rest filled with rectilinear infill.
        #[serde(default)]
        fill_with_infill: bool,
    },
}

/// Slicing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceSettings {
    /// Layer height (mm).
    pub layer_height: f64,
    /// Extrusion bead width (mm).
    pub bead_width: f64,
    /// Number of walls, or `None` to wall until the offset collapses.
    pub wall_count: Option<u32>,
    /// Infill density (0.0 disables infill, up to 1.0).
    pub infill_density: f64,
    /// Region strategy.
    pub strategy: Strategy,
    /// Number of equal material ranges over [0, 1].
    pub num_regions: usize,
    /// Overlap stitching across region boundaries.
    pub interdigitation: Option<InterdigitationSettings>,
    /// Purge towers, one per range.
    pub purge: Option<PurgeSettings>,
    /// Bed point the model's XY center is moved to.
    pub bed_center: Option<[f64; 2]>,
    /// Extra XY offset applied after centering (mm).
    pub translation: [f64; 2],
    /// Entry point of every layer's tour, in model coordinates.
    pub tour_start: [f64; 2],
    /// Process layers on the rayon thread pool.
    pub parallel: bool,
}

impl Default for SliceSettings {
    fn default() -> Self {
        Self {
            layer_height: 0.2,
            bead_width: 0.4,
            wall_count: Some(3),
            infill_density: 0.0,
            strategy: Strategy::Cutting,
            num_regions: 4,
            interdigitation: None,
            purge: None,
            bed_center: None,
            translation: [0.0, 0.0],
            tour_start: [-8.0, 10.0],
            parallel: true,
        }
    }
}

impl SliceSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.layer_height > 0.0 && self.layer_height <= 1.0) {
            return Err(SlicerError::InvalidSettings(
                "layer_height must be between 0 and 1mm".into(),
            ));
        }
        if !(self.bead_width > 0.0 && self.bead_width.is_finite()) {
            return Err(SlicerError::InvalidSettings(
                "bead_width must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.infill_density) {
            return Err(SlicerError::InvalidSettings(
                "infill_density must be between 0 and 1".into(),
            ));
        }
        if self.num_regions == 0 {
            return Err(SlicerError::InvalidSettings(
                "num_regions must be at least 1".into(),
            ));
        }
        if let Some(interdigitation) = &self.interdigitation {
            if matches!(self.strategy, Strategy::Outline { .. }) {
                return Err(SlicerError::InvalidSettings(
                    "interdigitation requires the cutting strategy".into(),
                ));
            }
            let range_width = 1.0 / self.num_regions as f64;
            let w = interdigitation.overlap_width;
            if !(w > 0.0 && w < range_width) {
                return Err(SlicerError::InvalidSettings(format!(
                    "overlap_width must be positive and narrower than a range ({range_width:.4})"
                )));
            }
        }
        if let Some(purge) = &self.purge {
            purge.validate()?;
        }
        let finite = |v: &[f64]| v.iter().all(|c| c.is_finite());
        if !finite(&self.translation)
            || !finite(&self.tour_start)
            || self.bed_center.is_some_and(|c| !finite(&c))
        {
            return Err(SlicerError::InvalidSettings(
                "bed_center, translation and tour_start must be finite".into(),
            ));
        }
        Ok(())
    }

    /// The material ranges the settings describe.
    pub fn ranges(&self) -> Vec<MaterialRange> {
        generate_linear_ranges(self.num_regions, 0.0, 1.0)
    }
}

/// Statistics about the sliced model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SliceStats {
    /// Layers with geometry.
    pub layer_count: usize,
    /// Heights skipped because their cross-section was empty.
    pub skipped_heights: usize,
    /// Total extrusion path length (mm).
    pub extrusion_length: f64,
    /// Total travel length (mm).
    pub travel_length: f64,
}

/// Result of slicing.
#[derive(Debug, Clone)]
pub struct SliceResult {
    /// Layers in print order, placed on the bed.
    pub layers: Vec<Layer>,
    /// Material ranges, lowest first.
    pub ranges: Vec<MaterialRange>,
    /// Purge towers in bed coordinates (empty when disabled).
    pub purge_towers: Vec<PurgeTowerCenter>,
    /// Layer height (mm).
    pub layer_height: f64,
    /// Bead width (mm).
    pub bead_width: f64,
    /// Statistics.
    pub stats: SliceStats,
}

impl SliceResult {
    /// XY bounds of every path in every layer.
    pub fn bounds(&self) -> Bounds2 {
        let mut bounds = Bounds2::empty();
        for layer in &self.layers {
            bounds.merge(&layer.bounds());
        }
        bounds
    }
}

/// Slice a model with the given settings.
///
/// This is the main entry point for slicing. It:
/// 1. Plans purge tower positions (failing early if the zone is too small)
/// 2. Takes a cross-section at every layer height, skipping empty ones
/// 3. Builds walls, infill and material regions per layer
/// 4. Routes each layer into a single tour
/// 5. Moves everything onto the bed
pub fn slice<K>(kernel: &K, settings: &SliceSettings) -> Result<SliceResult>
where
    K: GeometryKernel + ?Sized,
{
    settings.validate()?;

    let bounds = kernel.bounds();
    let valid = (0..3).all(|i| {
        bounds.min[i].is_finite() && bounds.max[i].is_finite() && bounds.min[i] <= bounds.max[i]
    });
    if !valid {
        return Err(SlicerError::EmptyModel);
    }

    let ranges = settings.ranges();
    let mut towers = match &settings.purge {
        Some(purge) => {
            log::info!("planning {} purge towers", ranges.len());
            plan_purge_towers(purge, &ranges)?
        }
        None => Vec::new(),
    };

    let heights = layer_heights(bounds.min[2], bounds.max[2], settings.layer_height);
    log::info!(
        "slicing {} heights into {} material ranges",
        heights.len(),
        ranges.len()
    );
    let layers = cross_sections(kernel, &heights, settings.parallel)?;
    let bottom_z = layers.first().map(|l| l.model_z).ok_or(SlicerError::EmptyModel)?;
    let offset = placement(settings, &bounds, bottom_z);

    // Towers are placed in bed coordinates; route them in model coordinates.
    for tower in &mut towers {
        tower.translate(&-offset.xy);
    }
    let ctx = LayerContext {
        settings,
        ranges: &ranges,
        towers: &towers,
        start: Point2::new(settings.tour_start[0], settings.tour_start[1]),
    };
    let mut layers = process_layers(kernel, layers, &ctx)?;
    log::info!("routed {} layers", layers.len());

    for layer in &mut layers {
        layer.translate(&offset.xy, offset.z);
    }
    for tower in &mut towers {
        tower.translate(&offset.xy);
    }

    for range in &ranges {
        let used = layers
            .iter()
            .flat_map(|l| &l.regions)
            .any(|r| r.range == *range && !r.is_empty());
        if !used {
            log::warn!("material range {range} has no geometry on any layer");
        }
    }

    let stats = SliceStats {
        layer_count: layers.len(),
        skipped_heights: heights.len() - layers.len(),
        extrusion_length: layers.iter().map(Layer::extrusion_length).sum(),
        travel_length: layers.iter().map(Layer::travel_length).sum(),
    };

    Ok(SliceResult {
        layers,
        ranges,
        purge_towers: towers,
        layer_height: settings.layer_height,
        bead_width: settings.bead_width,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_validate() {
        assert!(SliceSettings::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_settings() {
        let bad_height = SliceSettings {
            layer_height: 0.0,
            ..Default::default()
        };
        assert!(bad_height.validate().is_err());

        let wide_overlap = SliceSettings {
            num_regions: 4,
            interdigitation: Some(InterdigitationSettings { overlap_width: 0.3 }),
            ..Default::default()
        };
        assert!(wide_overlap.validate().is_err());

        let outline_interdigitated = SliceSettings {
            strategy: Strategy::Outline {
                fill_with_infill: false,
            },
            interdigitation: Some(InterdigitationSettings::default()),
            ..Default::default()
        };
        assert!(outline_interdigitated.validate().is_err());
    }

    #[test]
    fn test_strategy_deserializes_from_tag() {
        let settings: SliceSettings = serde_json::from_str(
            r#"{ "strategy": { "kind": "outline", "fill_with_infill": true }, "num_regions": 2 }"#,
        )
        .unwrap();
        assert_eq!(
            settings.strategy,
            Strategy::Outline {
                fill_with_infill: true
            }
        );
        assert_eq!(settings.num_regions, 2);
        assert_eq!(settings.wall_count, Some(3));
    }
}
