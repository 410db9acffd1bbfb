//! The G-code emitter: one pass over the routed layers, in order.
//!
//! All mutable state lives in [`EmitterState`], owned by the emitter for the
//! length of one program. Every command goes through `GcodeEmitter::write`,
//! so the state always matches what has been written.

use std::f64::consts::PI;
use std::io::Write;

use serde::Serialize;

use gradient_kernel::MaterialRange;
use gradient_kernel_math::{distance, lerp, Point2};
use gradient_slicer::{Layer, Path, SliceResult};

use crate::command::Command;
use crate::error::{GcodeError, Result};
use crate::gcode::GcodeSettings;
use crate::lookahead::{next_range_change, RangeChange, UpcomingPaths};
use crate::material::Material;
use crate::mixing::{tool_index, DockSettings, MixingMode};
use crate::template::{render, TemplateValues};

/// Filament length for a straight bead of rectangular cross-section.
///
/// `flow × length × bead_width × layer_height / (π (d/2)²)`.
pub fn filament_length(
    length: f64,
    bead_width: f64,
    layer_height: f64,
    filament_diameter: f64,
    flow_rate: f64,
) -> f64 {
    let volume = length * bead_width * layer_height;
    let radius = filament_diameter / 2.0;
    flow_rate * volume / (PI * radius * radius)
}

/// Fraction of a segment that is extruded before coasting starts.
///
/// `remaining` is the extrusion left in the run from the segment's start,
/// including the segment itself. Returns 1.0 when the segment ends before
/// the coasting zone and 0.0 when it starts inside it.
pub fn coasting_split(length: f64, remaining: f64, coasting_distance: f64) -> f64 {
    if coasting_distance <= 0.0 || remaining - length >= coasting_distance {
        1.0
    } else if remaining <= coasting_distance || length <= 0.0 {
        0.0
    } else {
        ((remaining - coasting_distance) / length).clamp(0.0, 1.0)
    }
}

/// Extrusion length of the paths after `index` up to the next travel.
fn run_length_after(paths: &[Path], index: usize) -> f64 {
    paths
        .iter()
        .skip(index + 1)
        .take_while(|p| p.is_extrusion())
        .map(Path::length)
        .sum()
}

/// Mutable state of the program writer.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterState {
    /// Current XY position.
    pub position: Point2,
    /// Current layer height.
    pub z: f64,
    /// Last feedrate written (mm/min).
    pub feedrate: Option<f64>,
    /// Range of the paths being printed.
    pub active_range: Option<MaterialRange>,
    /// Range whose command was last sent. Runs ahead of `active_range`
    /// after a look-ahead pre-emit.
    pub commanded_range: Option<MaterialRange>,
    /// Selected tool in switching mode.
    pub tool: Option<u32>,
    /// Current layer number.
    pub layer: usize,
    /// Filament pulled back for a dock and not yet primed.
    pub retracted: bool,
    /// Length to prime after a dock (mm).
    pub prime_length: f64,
    /// Head raised by the Z lift.
    pub lifted: bool,
    /// The head left the print (dock or tool change) and must travel back
    /// before extruding.
    pub return_pending: bool,
    /// Last look-ahead result.
    pub next_change: Option<RangeChange>,
}

impl Default for EmitterState {
    fn default() -> Self {
        Self {
            position: Point2::origin(),
            z: 0.0,
            feedrate: None,
            active_range: None,
            commanded_range: None,
            tool: None,
            layer: 0,
            retracted: false,
            prime_length: 0.0,
            lifted: false,
            return_pending: false,
            next_change: None,
        }
    }
}

/// Counters for a written program.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgramStats {
    /// Layers written.
    pub layers: usize,
    /// Lines written, templates included.
    pub lines: usize,
    /// Filament pushed (mm).
    pub filament_length: f64,
    /// XY distance printed, coasting included (mm).
    pub extrusion_distance: f64,
    /// XY distance travelled (mm).
    pub travel_distance: f64,
    /// Firmware retractions.
    pub retractions: usize,
    /// Mixing, temperature or tool commands sent.
    pub range_changes: usize,
    /// Tool changes in switching mode.
    pub tool_changes: usize,
    /// Docks in temperature mode.
    pub docks: usize,
}

/// Writes one program to `out`.
pub struct GcodeEmitter<'a, W: Write> {
    out: W,
    settings: &'a GcodeSettings,
    material: Option<Material>,
    regions: usize,
    single_range: bool,
    bead_width: f64,
    layer_height: f64,
    state: EmitterState,
    stats: ProgramStats,
}

impl<'a, W: Write> GcodeEmitter<'a, W> {
    /// Create an emitter for `result`, checking the settings against it.
    pub fn new(out: W, settings: &'a GcodeSettings, result: &SliceResult) -> Result<Self> {
        settings.validate()?;
        let regions = result.ranges.len();
        settings
            .mixing
            .validate(regions, settings.printer.extruder_count)?;
        if matches!(settings.mixing, MixingMode::Mixture) && settings.printer.extruder_count < 2 {
            log::warn!(
                "{} has {} extruder; mixing commands need a two-input hotend",
                settings.printer.name,
                settings.printer.extruder_count
            );
        }
        Ok(Self {
            out,
            settings,
            material: settings.mixing.material()?,
            regions,
            single_range: regions == 1,
            bead_width: result.bead_width,
            layer_height: result.layer_height,
            state: EmitterState::default(),
            stats: ProgramStats::default(),
        })
    }

    /// Current state.
    pub fn state(&self) -> &EmitterState {
        &self.state
    }

    /// Counters so far.
    pub fn stats(&self) -> &ProgramStats {
        &self.stats
    }

    /// Flush and return the writer with the final counters.
    pub fn finish(mut self) -> Result<(W, ProgramStats)> {
        self.out.flush()?;
        Ok((self.out, self.stats))
    }

    fn write(&mut self, cmd: Command) -> Result<()> {
        writeln!(self.out, "{}", cmd.to_gcode())?;
        self.stats.lines += 1;
        Ok(())
    }

    fn comment(&mut self, text: String) -> Result<()> {
        self.write(Command::Comment(text))
    }

    fn write_block(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        if !text.is_empty() && !text.ends_with('\n') {
            self.out.write_all(b"\n")?;
        }
        self.stats.lines += text.lines().count();
        Ok(())
    }

    /// Feedrate field for a move at `speed` mm/s, or `None` when unchanged.
    fn feed(&mut self, speed: f64) -> Option<f64> {
        let f = (speed * 60.0).round();
        if self.state.feedrate == Some(f) {
            None
        } else {
            self.state.feedrate = Some(f);
            Some(f)
        }
    }

    fn print_speed(&self) -> f64 {
        if self.state.layer <= 1 {
            self.settings.first_layer_speed
        } else {
            self.settings.print_speed
        }
    }

    fn template_values(&self, result: &SliceResult) -> TemplateValues {
        let temperature = self.initial_temperature(result);
        TemplateValues {
            bed_temperature: self.settings.bed_temp,
            extruder_temperature: temperature,
            travel_speed: self.settings.travel_speed * 60.0,
            tool_temperatures: vec![temperature; self.settings.printer.extruder_count as usize],
            print_area: result.bounds(),
        }
    }

    /// Nozzle temperature for the start template.
    fn initial_temperature(&self, result: &SliceResult) -> u32 {
        let first_range = result
            .layers
            .iter()
            .flat_map(|l| &l.paths)
            .find(|p| p.is_extrusion())
            .map(|p| p.range);
        match (self.material, first_range) {
            (Some(material), Some(range)) => material.temperature_for(range.midpoint()).round() as u32,
            _ => self.settings.print_temp,
        }
    }

    /// Write the rendered start template.
    pub fn emit_header(&mut self, result: &SliceResult) -> Result<()> {
        self.comment(format!(
            "{} layers, {} material ranges, {} mode",
            result.layers.len(),
            self.regions,
            self.settings.mixing.name()
        ))?;
        let text = render(self.settings.start_template(), &self.template_values(result));
        self.write_block(&text)
    }

    /// Write the rendered end template.
    pub fn emit_footer(&mut self, result: &SliceResult) -> Result<()> {
        let text = render(self.settings.end_template(), &self.template_values(result));
        self.write_block(&text)
    }

    /// Write every layer in order.
    pub fn emit_layers(&mut self, layers: &[Layer]) -> Result<()> {
        for index in 0..layers.len() {
            self.emit_layer(layers, index)?;
        }
        Ok(())
    }

    fn emit_layer(&mut self, layers: &[Layer], index: usize) -> Result<()> {
        let layer = &layers[index];
        self.begin_layer(layer)?;
        for (path_index, path) in layer.paths.iter().enumerate() {
            if path.is_travel() {
                for (_, to) in path.segments() {
                    self.travel_to(*to)?;
                }
            } else {
                self.extrude_path(layers, index, path_index)?;
            }
        }
        self.stats.layers += 1;
        log::debug!("layer {} written ({} lines so far)", layer.number, self.stats.lines);
        Ok(())
    }

    fn begin_layer(&mut self, layer: &Layer) -> Result<()> {
        self.state.layer = layer.number;
        self.state.z = layer.z;
        self.comment(format!("Layer {} z={:.3}", layer.number, layer.z))?;

        let z = if self.settings.z_lift > 0.0 {
            self.state.lifted = true;
            layer.z + self.settings.z_lift
        } else {
            layer.z
        };
        let f = self.feed(self.settings.travel_speed);
        self.write(Command::Rapid {
            x: None,
            y: None,
            z: Some(z),
            f,
        })?;

        if layer.number == 2 && self.settings.fan_speed > 0 {
            self.write(Command::SetFanSpeed {
                s: self.settings.fan_speed,
            })?;
        }

        if layer.number == 1 {
            if let Some(path) = layer.paths.iter().find(|p| p.is_extrusion()) {
                self.state.active_range = Some(path.range);
                self.apply_range(path.range)?;
            }
        }
        Ok(())
    }

    fn travel_to(&mut self, to: Point2) -> Result<()> {
        let length = distance(&self.state.position, &to);
        self.stats.travel_distance += length;
        let long = length > self.settings.retraction.min_travel;

        let retract = long && self.settings.retraction.enabled && !self.state.retracted;
        if retract {
            self.write(Command::Retract)?;
            self.stats.retractions += 1;
        }
        if long && self.settings.z_lift > 0.0 && !self.state.lifted {
            let f = self.feed(self.settings.travel_speed);
            self.write(Command::Rapid {
                x: None,
                y: None,
                z: Some(self.state.z + self.settings.z_lift),
                f,
            })?;
            self.state.lifted = true;
        }

        let f = self.feed(self.settings.travel_speed);
        self.write(Command::Rapid {
            x: Some(to.x),
            y: Some(to.y),
            z: None,
            f,
        })?;
        self.state.position = to;

        if self.state.lifted {
            self.lower()?;
        }
        if retract {
            self.write(Command::Unretract)?;
        }
        Ok(())
    }

    fn lower(&mut self) -> Result<()> {
        self.write(Command::Rapid {
            x: None,
            y: None,
            z: Some(self.state.z),
            f: None,
        })?;
        self.state.lifted = false;
        Ok(())
    }

    fn extrude_path(&mut self, layers: &[Layer], layer_index: usize, path_index: usize) -> Result<()> {
        let paths = &layers[layer_index].paths;
        let path = &paths[path_index];
        if self.state.active_range != Some(path.range) {
            self.state.active_range = Some(path.range);
            if self.state.commanded_range != Some(path.range) {
                self.apply_range(path.range)?;
            }
        }

        let run_after = run_length_after(paths, path_index);
        let mut rest = path.length();
        for (a, b) in path.segments() {
            let upcoming = UpcomingPaths::after(
                layers,
                layer_index,
                path_index,
                self.settings.lookahead_across_layers,
            );
            self.look_ahead(path.range, rest, upcoming)?;
            self.prepare_extrusion()?;
            let length = distance(a, b);
            self.extrude_segment(a, b, rest + run_after)?;
            rest -= length;
        }
        Ok(())
    }

    /// Pre-emit the next range's command when its boundary is close.
    fn look_ahead(
        &mut self,
        active: MaterialRange,
        remaining: f64,
        upcoming: UpcomingPaths<'_>,
    ) -> Result<()> {
        let limit = self.settings.lookahead_distance;
        if limit <= 0.0 || matches!(self.settings.mixing, MixingMode::Switching) {
            return Ok(());
        }
        self.state.next_change = next_range_change(active, remaining, upcoming, limit);
        if let Some(change) = self.state.next_change {
            if self.state.commanded_range != Some(change.range) {
                self.comment(format!(
                    "{} follows in {:.2} mm",
                    change.range, change.distance
                ))?;
                self.apply_range(change.range)?;
            }
        }
        Ok(())
    }

    /// Undo whatever took the nozzle off the print before extruding.
    fn prepare_extrusion(&mut self) -> Result<()> {
        if self.state.return_pending {
            let f = self.feed(self.settings.travel_speed);
            self.write(Command::Rapid {
                x: Some(self.state.position.x),
                y: Some(self.state.position.y),
                z: Some(self.state.z),
                f,
            })?;
            self.state.lifted = false;
            self.state.return_pending = false;
        }
        if self.state.lifted {
            self.lower()?;
        }
        if self.state.retracted {
            let f = self.feed(self.settings.retraction.speed);
            self.write(Command::Linear {
                x: None,
                y: None,
                e: Some(self.state.prime_length),
                f,
            })?;
            self.state.retracted = false;
            self.state.prime_length = 0.0;
        }
        Ok(())
    }

    fn extrude_segment(&mut self, a: &Point2, b: &Point2, remaining: f64) -> Result<()> {
        let length = distance(a, b);
        self.stats.extrusion_distance += length;
        let e = filament_length(
            length,
            self.bead_width,
            self.layer_height,
            self.settings.printer.filament_diameter,
            self.settings.flow_rate,
        );
        let ratio = coasting_split(length, remaining, self.settings.coasting_distance);
        let f = self.feed(self.print_speed());

        if ratio >= 1.0 {
            self.write(Command::Linear {
                x: Some(b.x),
                y: Some(b.y),
                e: Some(e),
                f,
            })?;
            self.stats.filament_length += e;
        } else if ratio <= 0.0 {
            self.write(Command::Linear {
                x: Some(b.x),
                y: Some(b.y),
                e: None,
                f,
            })?;
        } else {
            let split = lerp(a, b, ratio);
            self.write(Command::Linear {
                x: Some(split.x),
                y: Some(split.y),
                e: Some(e * ratio),
                f,
            })?;
            self.write(Command::Linear {
                x: Some(b.x),
                y: Some(b.y),
                e: None,
                f: None,
            })?;
            self.stats.filament_length += e * ratio;
        }
        self.state.position = *b;
        Ok(())
    }

    /// Send the command for `range`, unless one range covers the whole print.
    fn apply_range(&mut self, range: MaterialRange) -> Result<()> {
        if self.single_range && range.is_full() {
            if self.state.commanded_range.is_none() {
                log::info!("single material range {range}: no mixing command");
            }
            self.state.commanded_range = Some(range);
            return Ok(());
        }
        self.range_commands(range)?;
        self.state.commanded_range = Some(range);
        self.stats.range_changes += 1;
        Ok(())
    }

    /// Write the mixing, temperature or tool commands for `range`.
    pub fn range_commands(&mut self, range: MaterialRange) -> Result<()> {
        if range.is_full() {
            return Err(GcodeError::InvalidMixingRange(range));
        }
        let settings = self.settings;
        let ratio = range.midpoint();
        match &settings.mixing {
            MixingMode::Mixture => {
                self.comment(format!("Starting material range: {range}"))?;
                for cmd in settings.printer.flavor.mixing_commands(ratio) {
                    self.write(cmd)?;
                }
            }
            MixingMode::Temperature { dock, .. } => {
                let material = self.material.ok_or(GcodeError::MissingMaterial)?;
                let temperature = material.temperature_for(ratio).round();
                let flow = material.flow_percent(temperature);
                self.comment(format!(
                    "Starting material range: {range} at {temperature:.0}C, flow {flow:.1}%"
                ))?;
                match dock {
                    Some(dock) => self.dock(temperature as u32, flow, dock)?,
                    None => {
                        self.write(Command::SetTemperature {
                            s: temperature as u32,
                            wait: false,
                        })?;
                        self.write(Command::SetFlow { percent: flow })?;
                    }
                }
            }
            MixingMode::Switching => {
                let tool = tool_index(&range, self.regions);
                if self.state.tool != Some(tool) {
                    if let Some(previous) = self.state.tool {
                        self.comment(format!("park T{previous}"))?;
                    }
                    self.comment(format!("pick T{tool} for {range}"))?;
                    self.write(Command::SelectTool(tool))?;
                    self.state.tool = Some(tool);
                    self.state.return_pending = true;
                    self.stats.tool_changes += 1;
                }
            }
        }
        Ok(())
    }

    /// Retract, park, wait for `temperature`, and leave the return for the
    /// next extrusion.
    fn dock(&mut self, temperature: u32, flow: f64, dock: &DockSettings) -> Result<()> {
        if !self.state.retracted {
            let f = self.feed(self.settings.retraction.speed);
            self.write(Command::Linear {
                x: None,
                y: None,
                e: Some(-dock.retract_length),
                f,
            })?;
            self.state.retracted = true;
            self.state.prime_length = dock.retract_length;
        }
        let [px, py] = self.settings.printer.park_position;
        let f = self.feed(self.settings.travel_speed);
        self.write(Command::Rapid {
            x: Some(px),
            y: Some(py),
            z: None,
            f,
        })?;
        self.write(Command::SetTemperature {
            s: temperature,
            wait: true,
        })?;
        self.write(Command::SetFlow { percent: flow })?;
        self.state.return_pending = true;
        self.stats.docks += 1;
        Ok(())
    }
}
