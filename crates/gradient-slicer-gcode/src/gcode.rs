//! Emitter settings and the program-level entry points.

use std::io::Write;

use serde::{Deserialize, Serialize};

use gradient_slicer::SliceResult;

use crate::emitter::{GcodeEmitter, ProgramStats};
use crate::error::{GcodeError, Result};
use crate::mixing::MixingMode;
use crate::printer::PrinterProfile;

/// Firmware retraction around long travels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetractionSettings {
    /// Retract before travels longer than `min_travel`.
    pub enabled: bool,
    /// Shortest travel that retracts (mm).
    pub min_travel: f64,
    /// Speed of explicit filament moves when docking (mm/s).
    pub speed: f64,
}

impl Default for RetractionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_travel: 6.0,
            speed: 40.0,
        }
    }
}

/// Settings for G-code generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcodeSettings {
    /// Printer profile.
    pub printer: PrinterProfile,
    /// Extrusion multiplier.
    pub flow_rate: f64,
    /// Retraction.
    pub retraction: RetractionSettings,
    /// Stop extruding this far before the end of each extrusion run (mm).
    pub coasting_distance: f64,
    /// Send the next range's command this far ahead of the change (mm).
    /// Zero switches at the boundary.
    pub lookahead_distance: f64,
    /// Let the look-ahead see into later layers.
    pub lookahead_across_layers: bool,
    /// Z hop for long travels and layer changes (mm).
    pub z_lift: f64,
    /// First layer print speed (mm/s).
    pub first_layer_speed: f64,
    /// Print speed (mm/s).
    pub print_speed: f64,
    /// Travel speed (mm/s).
    pub travel_speed: f64,
    /// Nozzle temperature (°C). Temperature mode starts at its first range's
    /// temperature instead.
    pub print_temp: u32,
    /// Bed temperature (°C).
    pub bed_temp: u32,
    /// Fan PWM from the second layer on (0 leaves it off).
    pub fan_speed: u8,
    /// How material ranges reach the machine.
    pub mixing: MixingMode,
    /// Start template overriding the printer's.
    pub start_template: Option<String>,
    /// End template overriding the printer's.
    pub end_template: Option<String>,
}

impl Default for GcodeSettings {
    fn default() -> Self {
        let printer = PrinterProfile::default();
        Self {
            flow_rate: 1.0,
            retraction: RetractionSettings::default(),
            coasting_distance: 0.0,
            lookahead_distance: 0.0,
            lookahead_across_layers: true,
            z_lift: 0.0,
            first_layer_speed: 20.0,
            print_speed: 40.0,
            travel_speed: 120.0,
            print_temp: printer.default_print_temp,
            bed_temp: printer.default_bed_temp,
            fan_speed: 255,
            mixing: MixingMode::Mixture,
            start_template: None,
            end_template: None,
            printer,
        }
    }
}

impl GcodeSettings {
    /// Validate settings that do not depend on the sliced model.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("flow_rate", self.flow_rate),
            ("first_layer_speed", self.first_layer_speed),
            ("print_speed", self.print_speed),
            ("travel_speed", self.travel_speed),
            ("retraction.speed", self.retraction.speed),
            ("printer.filament_diameter", self.printer.filament_diameter),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(GcodeError::InvalidSettings(format!(
                    "{name} must be positive"
                )));
            }
        }
        let non_negative = [
            ("coasting_distance", self.coasting_distance),
            ("lookahead_distance", self.lookahead_distance),
            ("z_lift", self.z_lift),
            ("retraction.min_travel", self.retraction.min_travel),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(GcodeError::InvalidSettings(format!(
                    "{name} must be zero or positive"
                )));
            }
        }
        self.mixing.material()?;
        Ok(())
    }

    /// Start template in effect.
    pub fn start_template(&self) -> &str {
        self.start_template
            .as_deref()
            .unwrap_or_else(|| self.printer.start_template())
    }

    /// End template in effect.
    pub fn end_template(&self) -> &str {
        self.end_template
            .as_deref()
            .unwrap_or_else(|| self.printer.end_template())
    }
}

/// Write the program for a sliced model to `out`.
///
/// The start template is written first, then every layer in order, then the
/// end template. Configuration problems (unknown material, too many
/// switching regions) are reported before anything is written.
pub fn write_gcode<W: Write>(
    result: &SliceResult,
    settings: &GcodeSettings,
    out: W,
) -> Result<ProgramStats> {
    let mut emitter = GcodeEmitter::new(out, settings, result)?;
    log::info!(
        "writing {} layers for {} in {} mode",
        result.layers.len(),
        settings.printer.name,
        settings.mixing.name()
    );
    emitter.emit_header(result)?;
    emitter.emit_layers(&result.layers)?;
    emitter.emit_footer(result)?;
    let (_, stats) = emitter.finish()?;
    log::info!(
        "wrote {} lines, {:.1} mm of filament, {} range changes",
        stats.lines,
        stats.filament_length,
        stats.range_changes
    );
    Ok(stats)
}

/// Generate the program for a sliced model as a string.
pub fn generate_gcode(result: &SliceResult, settings: &GcodeSettings) -> Result<String> {
    let mut buf = Vec::new();
    write_gcode(result, settings, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
