//! Per-layer pipeline: cross-section, walls and infill, region partition,
//! routing, and final placement on the bed.

use rayon::prelude::*;

use gradient_kernel::{GeometryKernel, MaterialRange};
use gradient_kernel_math::{Bounds3, Point2, Tolerance, Translation, Vec2};

use crate::error::Result;
use crate::infill::{generate_rectilinear_infill, infill_boundary, infill_spacing};
use crate::layer::{Layer, PurgePlan};
use crate::partition::{outline_regions, partition_layer};
use crate::purge::PurgeTowerCenter;
use crate::route::TravelInsertion;
use crate::walls::{generate_walls, wall_polylines, WallPlan};
use crate::{SliceSettings, Strategy};

/// Heights from `z_min` up to and including `z_max`, `layer_height` apart.
///
/// Heights are computed as `z_min + i * layer_height` so rounding does not
/// accumulate.
pub fn layer_heights(z_min: f64, z_max: f64, layer_height: f64) -> Vec<f64> {
    if !(layer_height > 0.0) || z_max < z_min {
        return Vec::new();
    }
    let eps = layer_height * 1e-9;
    let mut heights = Vec::new();
    let mut i = 0u32;
    loop {
        let z = z_min + f64::from(i) * layer_height;
        if z > z_max + eps {
            break;
        }
        heights.push(z);
        i += 1;
    }
    heights
}

/// Run `f` over `items`, on the rayon pool when `parallel` is set.
fn map_layers<T, F>(items: Vec<T>, parallel: bool, f: F) -> Result<Vec<Layer>>
where
    T: Send,
    F: Fn(T) -> Result<Layer> + Sync + Send,
{
    if parallel {
        items.into_par_iter().map(f).collect()
    } else {
        items.into_iter().map(f).collect()
    }
}

/// Take a cross-section at every height and keep the non-empty ones.
///
/// Layers are numbered from 1 in height order, counting only the heights
/// that produced geometry.
pub fn cross_sections<K>(kernel: &K, heights: &[f64], parallel: bool) -> Result<Vec<Layer>>
where
    K: GeometryKernel + ?Sized,
{
    let sections = map_layers(heights.to_vec(), parallel, |z| {
        Ok(Layer::new(0, z, kernel.cross_section(z)?))
    })?;

    let mut layers = Vec::with_capacity(sections.len());
    for mut layer in sections {
        if layer.outline.is_empty() {
            log::debug!("skipping z={:.3}: no geometry", layer.z);
            continue;
        }
        layer.number = layers.len() + 1;
        layers.push(layer);
    }
    Ok(layers)
}

/// Offset that centers the model on the bed (when a bed center is given),
/// applies the user translation, and drops the first layer to one layer
/// height above the bed.
pub fn placement(settings: &SliceSettings, bounds: &Bounds3, bottom_z: f64) -> Translation {
    let mut xy = Vec2::new(settings.translation[0], settings.translation[1]);
    if let Some([cx, cy]) = settings.bed_center {
        let center = bounds.xy().center();
        xy += Vec2::new(cx - center.x, cy - center.y);
    }
    Translation {
        xy,
        z: settings.layer_height - bottom_z,
    }
}

/// Shared inputs for processing a layer.
#[derive(Debug, Clone, Copy)]
pub struct LayerContext<'a> {
    /// Slice settings.
    pub settings: &'a SliceSettings,
    /// Material ranges, lowest first.
    pub ranges: &'a [MaterialRange],
    /// Purge towers in model coordinates (empty when disabled).
    pub towers: &'a [PurgeTowerCenter],
    /// Where each layer's tour starts, in model coordinates.
    pub start: Point2,
}

/// Build a layer's walls, infill and regions, then route its tour.
///
/// Even-numbered layers reverse the region order (and the interdigitation
/// side choice) so seams do not stack.
pub fn process_layer<K>(kernel: &K, mut layer: Layer, ctx: &LayerContext<'_>) -> Result<Layer>
where
    K: GeometryKernel + ?Sized,
{
    let settings = ctx.settings;
    let bead = settings.bead_width;
    let reverse = layer.number % 2 == 0;

    let (regions, travel) = match settings.strategy {
        Strategy::Cutting => {
            let outline = &layer.outline.polygons;
            let walls = generate_walls(kernel, outline, &WallPlan::cutting(bead, settings.wall_count));
            let infill = if settings.infill_density > 0.0 {
                let boundary = infill_boundary(kernel, &walls, outline, bead);
                generate_rectilinear_infill(kernel, &boundary, infill_spacing(bead, settings.infill_density))
            } else {
                Vec::new()
            };
            let regions = partition_layer(
                kernel,
                layer.model_z,
                &wall_polylines(&walls),
                &infill,
                ctx.ranges,
                reverse,
                settings.interdigitation.as_ref(),
            )?;
            (regions, TravelInsertion::Always)
        }
        Strategy::Outline { fill_with_infill } => {
            let spacing = fill_with_infill.then(|| {
                let density = if settings.infill_density > 0.0 {
                    settings.infill_density
                } else {
                    1.0
                };
                infill_spacing(bead, density)
            });
            let regions = outline_regions(
                kernel,
                layer.model_z,
                ctx.ranges,
                reverse,
                bead,
                settings.wall_count,
                spacing,
            )?;
            (regions, TravelInsertion::WhenGapExceeds(Tolerance::DEFAULT.join))
        }
    };
    layer.regions = regions;

    let purge = settings.purge.as_ref().map(|purge_settings| PurgePlan {
        towers: ctx.towers,
        settings: purge_settings,
    });
    layer.connect_paths(ctx.start, purge, bead, travel);

    log::debug!(
        "layer {} (z={:.3}): {} regions, {} paths",
        layer.number,
        layer.model_z,
        layer.regions.len(),
        layer.paths.len()
    );
    Ok(layer)
}

/// Process every layer, in parallel when the settings allow.
pub fn process_layers<K>(kernel: &K, layers: Vec<Layer>, ctx: &LayerContext<'_>) -> Result<Vec<Layer>>
where
    K: GeometryKernel + ?Sized,
{
    map_layers(layers, ctx.settings.parallel, |layer| process_layer(kernel, layer, ctx))
}
