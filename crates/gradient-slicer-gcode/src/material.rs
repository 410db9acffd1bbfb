//! Temperature and flow models for single-material gradients.
//!
//! In temperature mode a single filament is printed at a temperature chosen
//! from the blend ratio. Each material has an empirical fit from nozzle
//! temperature to the flow percentage that keeps the deposited volume
//! constant.

use crate::error::{GcodeError, Result};

/// A material with a temperature model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Material {
    /// Polylactic acid, 190-250 °C.
    Pla,
    /// Thermoplastic polyurethane, 200-240 °C.
    Tpu,
}

impl Material {
    /// Parse a material name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" => Err(GcodeError::MissingMaterial),
            "pla" => Ok(Material::Pla),
            "tpu" => Ok(Material::Tpu),
            _ => Err(GcodeError::UnsupportedMaterial(name.to_string())),
        }
    }

    /// Printable temperature range (°C).
    pub fn temperature_range(&self) -> (f64, f64) {
        match self {
            Material::Pla => (190.0, 250.0),
            Material::Tpu => (200.0, 240.0),
        }
    }

    /// Temperature for a blend ratio, linear over the printable range.
    pub fn temperature_for(&self, ratio: f64) -> f64 {
        let (low, high) = self.temperature_range();
        low + ratio.clamp(0.0, 1.0) * (high - low)
    }

    /// Flow percentage that compensates for printing at `temperature`.
    pub fn flow_percent(&self, temperature: f64) -> f64 {
        let (low, high) = self.temperature_range();
        let d = temperature.clamp(low, high) - low;
        match self {
            Material::Pla => 100.0 - 0.5 * d - 0.004 * d * d + 0.00003 * d * d * d,
            Material::Tpu => 100.0 - 0.35 * d + 0.002 * d * d,
        }
    }
}
