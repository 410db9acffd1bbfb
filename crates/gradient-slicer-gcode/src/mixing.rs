//! How a material range is realised on the machine.

use std::str::FromStr;

use gradient_kernel::MaterialRange;
use serde::{Deserialize, Serialize};

use crate::error::{GcodeError, Result};
use crate::material::Material;

/// Most tools a switching print may use.
pub const MAX_SWITCHING_REGIONS: usize = 5;

/// Parking the head while the nozzle changes temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockSettings {
    /// Filament pulled back before travelling to the park position (mm).
    pub retract_length: f64,
}

impl Default for DockSettings {
    fn default() -> Self {
        Self {
            retract_length: 10.0,
        }
    }
}

/// Mixing mode, selected once per program.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MixingMode {
    /// Two-input mixing hotend; the range midpoint is the blend ratio.
    #[default]
    Mixture,
    /// One filament, with the blend ratio mapped to nozzle temperature and
    /// compensating flow.
    Temperature {
        /// Material name (`pla` or `tpu`).
        #[serde(default)]
        material: String,
        /// Wait at the park position for each temperature change.
        #[serde(default)]
        dock: Option<DockSettings>,
    },
    /// One tool per range.
    Switching,
}

impl MixingMode {
    /// Mode name as written in job files.
    pub fn name(&self) -> &'static str {
        match self {
            MixingMode::Mixture => "mixture",
            MixingMode::Temperature { .. } => "temperature",
            MixingMode::Switching => "switching",
        }
    }

    /// The material of a temperature-mode program.
    pub fn material(&self) -> Result<Option<Material>> {
        match self {
            MixingMode::Temperature { material, .. } => Material::from_name(material).map(Some),
            _ => Ok(None),
        }
    }

    /// Check the mode against the number of ranges and the tools available.
    pub fn validate(&self, regions: usize, tools: u32) -> Result<()> {
        self.material()?;
        if let MixingMode::Switching = self {
            let max = MAX_SWITCHING_REGIONS.min(tools as usize);
            if regions > max {
                return Err(GcodeError::TooManySwitchingRegions { regions, max });
            }
        }
        if let MixingMode::Temperature {
            dock: Some(dock), ..
        } = self
        {
            if !(dock.retract_length >= 0.0 && dock.retract_length.is_finite()) {
                return Err(GcodeError::InvalidSettings(
                    "dock retract_length must be non-negative".into(),
                ));
            }
        }
        Ok(())
    }
}

impl FromStr for MixingMode {
    type Err = GcodeError;

    /// Parse a bare mode name. Temperature mode starts without a material.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mixture" => Ok(MixingMode::Mixture),
            "temperature" => Ok(MixingMode::Temperature {
                material: String::new(),
                dock: None,
            }),
            "switching" => Ok(MixingMode::Switching),
            _ => Err(GcodeError::UnknownMixingMode(s.to_string())),
        }
    }
}

/// Tool that prints `range` when `regions` tools split the fraction interval.
pub fn tool_index(range: &MaterialRange, regions: usize) -> u32 {
    if regions == 0 {
        return 0;
    }
    let index = (range.midpoint() * regions as f64).floor();
    index.clamp(0.0, (regions - 1) as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_names() {
        assert_eq!("Mixture".parse::<MixingMode>().unwrap(), MixingMode::Mixture);
        assert_eq!("switching".parse::<MixingMode>().unwrap().name(), "switching");
        assert!(matches!(
            "gradient".parse::<MixingMode>(),
            Err(GcodeError::UnknownMixingMode(_))
        ));
    }

    #[test]
    fn test_deserialize_tagged() {
        let mode: MixingMode = serde_json::from_str(
            r#"{ "mode": "temperature", "material": "tpu", "dock": { "retract_length": 12.0 } }"#,
        )
        .unwrap();
        assert_eq!(
            mode,
            MixingMode::Temperature {
                material: "tpu".into(),
                dock: Some(DockSettings {
                    retract_length: 12.0
                }),
            }
        );
        assert_eq!(mode.material().unwrap(), Some(Material::Tpu));
    }

    #[test]
    fn test_validate() {
        assert!(MixingMode::Mixture.validate(8, 2).is_ok());
        assert!(MixingMode::Switching.validate(5, 5).is_ok());
        assert!(matches!(
            MixingMode::Switching.validate(6, 8),
            Err(GcodeError::TooManySwitchingRegions { regions: 6, max: 5 })
        ));
        assert!(matches!(
            MixingMode::Switching.validate(3, 2),
            Err(GcodeError::TooManySwitchingRegions { regions: 3, max: 2 })
        ));
        let no_material: MixingMode = "temperature".parse().unwrap();
        assert!(matches!(
            no_material.validate(2, 1),
            Err(GcodeError::MissingMaterial)
        ));
    }

    #[test]
    fn test_tool_index() {
        let ranges = gradient_kernel::generate_linear_ranges(4, 0.0, 1.0);
        let tools: Vec<u32> = ranges.iter().map(|r| tool_index(r, 4)).collect();
        assert_eq!(tools, vec![0, 1, 2, 3]);
        assert_eq!(tool_index(&MaterialRange::new(0.9, 1.0), 3), 2);
        assert_eq!(tool_index(&MaterialRange::new(1.0, 1.0), 3), 2);
    }
}
