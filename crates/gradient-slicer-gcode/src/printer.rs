//! Printer profile definitions.

use serde::{Deserialize, Serialize};

use crate::flavor::GcodeFlavor;

/// Printer profile with machine-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterProfile {
    /// Profile name.
    pub name: String,
    /// G-code flavor.
    pub flavor: GcodeFlavor,
    /// Build volume X (mm).
    pub bed_x: f64,
    /// Build volume Y (mm).
    pub bed_y: f64,
    /// Build volume Z (mm).
    pub bed_z: f64,
    /// Is the bed heated?
    pub heated_bed: bool,
    /// Number of extruders, or tools on a tool changer.
    pub extruder_count: u32,
    /// Nozzle diameter (mm).
    pub nozzle_diameter: f64,
    /// Filament diameter (mm).
    pub filament_diameter: f64,
    /// Where the head waits while docked for a temperature change (mm).
    pub park_position: [f64; 2],
    /// Default print temperature (°C).
    pub default_print_temp: u32,
    /// Default bed temperature (°C).
    pub default_bed_temp: u32,
    /// Machine-specific start template, used instead of the flavor's.
    #[serde(default)]
    pub start_gcode: Option<String>,
    /// Machine-specific end template, used instead of the flavor's.
    #[serde(default)]
    pub end_gcode: Option<String>,
}

impl Default for PrinterProfile {
    fn default() -> Self {
        Self::generic_mixing()
    }
}

const BUILTIN: [(&str, fn() -> PrinterProfile); 3] = [
    ("generic_mixing", PrinterProfile::generic_mixing),
    ("reprap_mixing", PrinterProfile::reprap_mixing),
    ("prusa_xl_5t", PrinterProfile::prusa_xl_5t),
];

const PRUSA_XL_START: &str = "M140 S[bed_temperature]\n\
M104 T0 S[tool0_temperature]\n\
M104 T1 S[tool1_temperature]\n\
M104 T2 S[tool2_temperature]\n\
M104 T3 S[tool3_temperature]\n\
M104 T4 S[tool4_temperature]\n\
G28 ; Home all axes\n\
G29 X[bed_min_x]:[bed_max_x] Y[bed_min_y]:[bed_max_y] ; Probe print area\n\
M190 S[bed_temperature]\n\
M109 T0 S[tool0_temperature]\n\
G90\n\
M83\n\
G92 E0\n\
T0\n\
G0 Z5 F[travel_speed]\n";

impl PrinterProfile {
    /// Generic Marlin printer with a two-input mixing hotend.
    pub fn generic_mixing() -> Self {
        Self {
            name: "Generic Mixing".into(),
            flavor: GcodeFlavor::Marlin,
            bed_x: 220.0,
            bed_y: 220.0,
            bed_z: 250.0,
            heated_bed: true,
            extruder_count: 2,
            nozzle_diameter: 0.4,
            filament_diameter: 1.75,
            park_position: [0.0, 210.0],
            default_print_temp: 210,
            default_bed_temp: 60,
            start_gcode: None,
            end_gcode: None,
        }
    }

    /// RepRap firmware printer with a two-input mixing hotend.
    pub fn reprap_mixing() -> Self {
        Self {
            name: "RepRap Mixing".into(),
            flavor: GcodeFlavor::RepRap,
            bed_x: 300.0,
            bed_y: 300.0,
            bed_z: 300.0,
            heated_bed: true,
            extruder_count: 2,
            nozzle_diameter: 0.4,
            filament_diameter: 1.75,
            park_position: [0.0, 290.0],
            default_print_temp: 210,
            default_bed_temp: 60,
            start_gcode: None,
            end_gcode: None,
        }
    }

    /// Prusa XL with five tool heads.
    pub fn prusa_xl_5t() -> Self {
        Self {
            name: "Prusa XL 5T".into(),
            flavor: GcodeFlavor::Marlin,
            bed_x: 360.0,
            bed_y: 360.0,
            bed_z: 360.0,
            heated_bed: true,
            extruder_count: 5,
            nozzle_diameter: 0.4,
            filament_diameter: 1.75,
            park_position: [360.0, 0.0],
            default_print_temp: 215,
            default_bed_temp: 60,
            start_gcode: Some(PRUSA_XL_START.into()),
            end_gcode: None,
        }
    }

    /// Get all built-in profiles.
    pub fn all_profiles() -> Vec<Self> {
        BUILTIN.iter().map(|(_, profile)| profile()).collect()
    }

    /// Identifiers accepted by [`PrinterProfile::by_name`].
    pub fn builtin_ids() -> impl Iterator<Item = &'static str> {
        BUILTIN.iter().map(|(id, _)| *id)
    }

    /// Look up a built-in profile by identifier or display name.
    ///
    /// Matching ignores case and treats any non-alphanumeric character as `_`,
    /// so `"Prusa XL 5T"` and `"prusa_xl_5t"` are the same profile.
    pub fn by_name(name: &str) -> Option<Self> {
        let key = normalize(name);
        BUILTIN
            .iter()
            .map(|(id, profile)| (*id, profile()))
            .find(|(id, profile)| *id == key || normalize(&profile.name) == key)
            .map(|(_, profile)| profile)
    }

    /// Center of the bed in XY.
    pub fn bed_center(&self) -> [f64; 2] {
        [self.bed_x / 2.0, self.bed_y / 2.0]
    }

    /// Start template for this machine.
    pub fn start_template(&self) -> &str {
        self.start_gcode
            .as_deref()
            .unwrap_or_else(|| self.flavor.start_gcode())
    }

    /// End template for this machine.
    pub fn end_template(&self) -> &str {
        self.end_gcode
            .as_deref()
            .unwrap_or_else(|| self.flavor.end_gcode())
    }

    /// Check if a position is within build volume.
    pub fn in_bounds(&self, x: f64, y: f64, z: f64) -> bool {
        x >= 0.0 && x <= self.bed_x && y >= 0.0 && y <= self.bed_y && z >= 0.0 && z <= self.bed_z
    }
}

fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles() {
        for profile in PrinterProfile::all_profiles() {
            assert!(profile.bed_x > 0.0);
            assert!(profile.bed_y > 0.0);
            assert!(profile.bed_z > 0.0);
            assert!(profile.nozzle_diameter > 0.0);
            assert!(profile.extruder_count >= 2);
            let [px, py] = profile.park_position;
            assert!(profile.in_bounds(px, py, 0.0));
        }
    }

    #[test]
    fn test_by_name() {
        assert_eq!(PrinterProfile::by_name("prusa_xl_5t").unwrap().extruder_count, 5);
        assert_eq!(
            PrinterProfile::by_name("Prusa XL 5T").unwrap().name,
            "Prusa XL 5T"
        );
        assert_eq!(
            PrinterProfile::by_name("reprap-mixing").unwrap().flavor,
            GcodeFlavor::RepRap
        );
        assert!(PrinterProfile::by_name("ender3").is_none());
        assert_eq!(PrinterProfile::builtin_ids().count(), 3);
    }

    #[test]
    fn test_templates() {
        let generic = PrinterProfile::generic_mixing();
        assert_eq!(generic.start_template(), GcodeFlavor::Marlin.start_gcode());
        assert_eq!(generic.bed_center(), [110.0, 110.0]);

        let xl = PrinterProfile::prusa_xl_5t();
        assert!(xl.start_template().contains("[tool4_temperature]"));
        assert_eq!(xl.end_template(), GcodeFlavor::Marlin.end_gcode());
    }
}
