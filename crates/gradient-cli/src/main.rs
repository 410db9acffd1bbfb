//! gradient-slice - slice multi-material gradient objects to G-code
//!
//! Usage:
//!   gradient-slice slice <job.toml> -o <output.gcode> [options]
//!   gradient-slice info <job.toml>
//!   gradient-slice profiles

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::{info, LevelFilter};

use gradient_kernel::{GeometryKernel, PrismKernel};
use gradient_slicer::{layer_heights, slice, SliceResult};
use gradient_slicer_gcode::{write_gcode, GcodeSettings, MixingMode, PrinterProfile, ProgramStats};

mod job;

use job::{lookup_printer, JobFile};

#[derive(Parser)]
#[command(name = "gradient-slice")]
#[command(version, about = "Slice functionally graded objects for mixing, temperature or tool-changing printers", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Slice a job file and write G-code
    Slice {
        /// Job file (.json or .toml)
        job: PathBuf,
        /// Output G-code file (default: <job name>.gcode)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Built-in printer profile, overriding the job's
        #[arg(long)]
        printer: Option<String>,
        /// Mixing mode: mixture, temperature or switching
        #[arg(long)]
        mixing: Option<String>,
        /// Material for temperature mode (pla, tpu)
        #[arg(long)]
        material: Option<String>,
        /// Number of material regions
        #[arg(long)]
        regions: Option<usize>,
        /// Process layers on one thread
        #[arg(long)]
        sequential: bool,
    },
    /// Show the object, ranges and settings of a job file
    Info {
        /// Job file (.json or .toml)
        job: PathBuf,
    },
    /// List built-in printer profiles
    Profiles,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Slice {
            job,
            output,
            printer,
            mixing,
            material,
            regions,
            sequential,
        } => {
            let overrides = Overrides {
                printer,
                mixing,
                material,
                regions,
                sequential,
            };
            cmd_slice(&job, output, overrides)
        }
        Commands::Info { job } => cmd_info(&job),
        Commands::Profiles => {
            cmd_profiles();
            Ok(())
        }
    }
}

/// Command-line settings applied over the job file.
struct Overrides {
    printer: Option<String>,
    mixing: Option<String>,
    material: Option<String>,
    regions: Option<usize>,
    sequential: bool,
}

impl Overrides {
    fn apply(self, job: &mut JobFile) -> Result<()> {
        if let Some(name) = &self.printer {
            job.set_printer(lookup_printer(name)?);
        }
        if let Some(mode) = &self.mixing {
            job.gcode.mixing = mode.parse()?;
        }
        if let Some(name) = self.material {
            match &mut job.gcode.mixing {
                MixingMode::Temperature { material, .. } => *material = name,
                other => bail!("--material only applies to temperature mode, not {}", other.name()),
            }
        }
        if let Some(regions) = self.regions {
            job.slice.num_regions = regions;
        }
        if self.sequential {
            job.slice.parallel = false;
        }
        Ok(())
    }
}

fn cmd_slice(path: &Path, output: Option<PathBuf>, overrides: Overrides) -> Result<()> {
    let mut job = JobFile::load(path)?;
    overrides.apply(&mut job)?;
    job.gcode.validate().context("invalid G-code settings")?;

    let kernel = PrismKernel::from_spec(&job.object).context("invalid object")?;
    info!("slicing job '{}'", job.name);
    let result = slice(&kernel, &job.slice).context("slicing failed")?;

    let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.gcode", job.name)));
    let stats = write_program(&output, &result, &job.gcode)?;

    println!("Sliced '{}' -> {}", job.name, output.display());
    print_summary(&result, &stats);
    Ok(())
}

/// Write the program, removing the file again if anything fails.
fn write_program(path: &Path, result: &SliceResult, settings: &GcodeSettings) -> Result<ProgramStats> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let written = write_gcode(result, settings, &mut writer)
        .map_err(anyhow::Error::from)
        .and_then(|stats| {
            writer.flush()?;
            Ok(stats)
        });
    match written {
        Ok(stats) => Ok(stats),
        Err(err) => {
            drop(writer);
            if let Err(remove) = fs::remove_file(path) {
                log::warn!("could not remove partial output {}: {remove}", path.display());
            }
            Err(err.context(format!("failed to write {}", path.display())))
        }
    }
}

fn print_summary(result: &SliceResult, stats: &ProgramStats) {
    println!("  Layers: {} ({} empty heights skipped)", stats.layers, result.stats.skipped_heights);
    println!("  Material ranges: {}", result.ranges.len());
    if !result.purge_towers.is_empty() {
        println!("  Purge towers: {}", result.purge_towers.len());
    }
    println!("  Extrusion: {:.1} mm", stats.extrusion_distance);
    println!("  Travel: {:.1} mm", stats.travel_distance);
    println!("  Filament: {:.1} mm", stats.filament_length);
    println!("  Range changes: {}", stats.range_changes);
    if stats.tool_changes > 0 {
        println!("  Tool changes: {}", stats.tool_changes);
    }
    if stats.docks > 0 {
        println!("  Docks: {}", stats.docks);
    }
    println!("  Lines: {}", stats.lines);
}

fn cmd_info(path: &Path) -> Result<()> {
    let job = JobFile::load(path)?;
    let kernel = PrismKernel::from_spec(&job.object).context("invalid object")?;
    let bounds = kernel.bounds();
    let settings = &job.slice;

    println!("Job: {}", job.name);
    println!("  File: {}", path.display());
    println!(
        "  Bounds: ({:.3}, {:.3}, {:.3}) - ({:.3}, {:.3}, {:.3}) mm",
        bounds.min[0], bounds.min[1], bounds.min[2], bounds.max[0], bounds.max[1], bounds.max[2]
    );
    println!(
        "  Layers: {} at {:.2} mm",
        layer_heights(bounds.min[2], bounds.max[2], settings.layer_height).len(),
        settings.layer_height
    );
    println!("  Strategy: {:?}", settings.strategy);
    println!("  Material ranges:");
    for range in settings.ranges() {
        println!("    {range}");
    }
    println!("  Printer: {}", job.gcode.printer.name);
    println!("  Mixing: {}", job.gcode.mixing.name());
    Ok(())
}

fn cmd_profiles() {
    for (id, profile) in PrinterProfile::builtin_ids().zip(PrinterProfile::all_profiles()) {
        println!(
            "{:<16} {} ({:?}, {} extruders, {:.0}x{:.0}x{:.0} mm)",
            id,
            profile.name,
            profile.flavor,
            profile.extruder_count,
            profile.bed_x,
            profile.bed_y,
            profile.bed_z
        );
    }
}
