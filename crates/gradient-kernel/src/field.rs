//! Material distribution oracle: the volume fraction of material B at a point.

use gradient_kernel_math::{Point3, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};

/// Gives the mixture fraction (0 = all material A, 1 = all material B) at a point.
pub trait MaterialField: Send + Sync {
    /// Fraction of material B at `p`, in `[0, 1]`.
    fn fraction(&self, p: &Point3) -> f64;
}

/// Serializable material field definitions understood by the prism kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldSpec {
    /// Same fraction everywhere.
    Constant {
        /// The fraction.
        value: f64,
    },
    /// `clamp(gradient · p + offset, 0, 1)`.
    Linear {
        /// Rate of change per mm along X, Y and Z.
        gradient: [f64; 3],
        /// Fraction at the origin.
        offset: f64,
    },
}

impl Default for FieldSpec {
    fn default() -> Self {
        FieldSpec::Constant { value: 0.0 }
    }
}

/// A field restricted to one horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PlanarField {
    /// Uniform fraction over the plane (already clamped).
    Uniform(f64),
    /// Unclamped `gradient · (x, y) + offset`.
    Affine {
        gradient: Vec2,
        offset: f64,
    },
}

impl FieldSpec {
    /// Reject non-finite coefficients and out-of-range constants.
    pub fn validate(&self) -> Result<()> {
        match self {
            FieldSpec::Constant { value } => {
                if !value.is_finite() || !(0.0..=1.0).contains(value) {
                    return Err(KernelError::InvalidField(format!(
                        "constant fraction {value} must lie in [0, 1]"
                    )));
                }
            }
            FieldSpec::Linear { gradient, offset } => {
                if gradient.iter().chain(std::iter::once(offset)).any(|c| !c.is_finite()) {
                    return Err(KernelError::InvalidField(
                        "linear gradient coefficients must be finite".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Restrict the field to the plane at height `z`.
    pub(crate) fn at_height(&self, z: f64) -> PlanarField {
        match *self {
            FieldSpec::Constant { value } => PlanarField::Uniform(value.clamp(0.0, 1.0)),
            FieldSpec::Linear { gradient, offset } => {
                let planar = Vec2::new(gradient[0], gradient[1]);
                let offset = offset + gradient[2] * z;
                if planar.norm() < 1e-12 {
                    PlanarField::Uniform(offset.clamp(0.0, 1.0))
                } else {
                    PlanarField::Affine {
                        gradient: planar,
                        offset,
                    }
                }
            }
        }
    }
}

impl MaterialField for FieldSpec {
    fn fraction(&self, p: &Point3) -> f64 {
        match *self {
            FieldSpec::Constant { value } => value.clamp(0.0, 1.0),
            FieldSpec::Linear { gradient, offset } => {
                (gradient[0] * p.x + gradient[1] * p.y + gradient[2] * p.z + offset).clamp(0.0, 1.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_fraction_is_clamped() {
        let field = FieldSpec::Linear {
            gradient: [0.01, 0.0, 0.0],
            offset: 0.5,
        };
        assert_relative_eq!(field.fraction(&Point3::new(0.0, 3.0, 1.0)), 0.5);
        assert_relative_eq!(field.fraction(&Point3::new(25.0, 0.0, 0.0)), 0.75);
        assert_relative_eq!(field.fraction(&Point3::new(80.0, 0.0, 0.0)), 1.0);
        assert_relative_eq!(field.fraction(&Point3::new(-80.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_vertical_gradient_is_uniform_per_plane() {
        let field = FieldSpec::Linear {
            gradient: [0.0, 0.0, 0.1],
            offset: 0.0,
        };
        assert_eq!(field.at_height(4.0), PlanarField::Uniform(0.4));
        assert_eq!(field.at_height(40.0), PlanarField::Uniform(1.0));
    }

    #[test]
    fn test_validate() {
        assert!(FieldSpec::Constant { value: 1.5 }.validate().is_err());
        assert!(FieldSpec::Linear {
            gradient: [f64::NAN, 0.0, 0.0],
            offset: 0.0
        }
        .validate()
        .is_err());
        assert!(FieldSpec::default().validate().is_ok());
    }
}
