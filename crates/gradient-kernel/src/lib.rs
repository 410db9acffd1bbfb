#![warn(missing_docs)]

//! Geometry kernel contract for the gradient slicer.
//!
//! The slicer never touches solid geometry directly. Everything it needs
//! from the model goes through [`GeometryKernel`]: the outline of a layer,
//! the polygons whose material fraction lies in a given range, polygon
//! offsets and polyline clipping.
//!
//! [`PrismKernel`] is a reference implementation: a planar footprint
//! extruded between two heights, with an analytic material field.
//!
//! # Example
//!
//! ```ignore
//! use gradient_kernel::{FieldSpec, GeometryKernel, MaterialRange, PrismKernel};
//!
//! let field = FieldSpec::Linear { gradient: [0.01, 0.0, 0.0], offset: 0.5 };
//! let kernel = PrismKernel::bar(100.0, 20.0, 5.0, field)?;
//! let regions = kernel.material_regions(1.0, &[MaterialRange::new(0.0, 0.5)])?;
//! ```

pub mod clip;
pub mod clipper;
pub mod error;
pub mod field;
pub mod geometry;
pub mod prism;
pub mod range;

pub use error::{KernelError, Result};
pub use field::{FieldSpec, MaterialField};
pub use geometry::{polygons_bounds, polygons_contain, Outline, Polygon, Polyline};
pub use prism::{PolygonSpec, PrismKernel, PrismSpec};
pub use range::{generate_linear_ranges, MaterialRange, RegionBoundary};

use gradient_kernel_math::Bounds3;

/// Geometric queries the slicer needs from a solid model.
///
/// Implementations must be shareable across threads, since layers may be
/// processed in parallel.
pub trait GeometryKernel: Sync {
    /// Axis-aligned bounds of the model.
    fn bounds(&self) -> Bounds3;

    /// Planar cross-section at height `z`. Empty above or below the model.
    fn cross_section(&self, z: f64) -> Result<Outline>;

    /// Offset polygons by `distance` (negative shrinks). May return nothing.
    fn offset(&self, polygons: &[Polygon], distance: f64) -> Vec<Polygon>;

    /// For each range, the part of the cross-section at `z` whose material
    /// fraction falls inside it. Output order matches `ranges`.
    fn material_regions(&self, z: f64, ranges: &[MaterialRange]) -> Result<Vec<RegionBoundary>>;

    /// The parts of `subjects` inside `boundary`.
    fn clip(&self, boundary: &[Polygon], subjects: &[Polyline]) -> Vec<Polyline>;
}
