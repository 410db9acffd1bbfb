#![warn(missing_docs)]

//! G-code generation for the gradient slicer.
//!
//! This crate turns the routed layers of a [`SliceResult`](gradient_slicer::SliceResult)
//! into a motion program. Material ranges reach the machine in one of three
//! ways: blend ratios for a mixing hotend, nozzle temperatures for a single
//! filament, or one tool per range on a tool changer.
//!
//! # Example
//!
//! ```ignore
//! use gradient_slicer::{slice, SliceSettings};
//! use gradient_slicer_gcode::{generate_gcode, GcodeSettings, MixingMode, PrinterProfile};
//!
//! let slice_result = slice(&kernel, &SliceSettings::default())?;
//!
//! let gcode_settings = GcodeSettings {
//!     printer: PrinterProfile::prusa_xl_5t(),
//!     mixing: MixingMode::Switching,
//!     coasting_distance: 0.5,
//!     ..Default::default()
//! };
//!
//! let gcode = generate_gcode(&slice_result, &gcode_settings)?;
//! std::fs::write("output.gcode", gcode)?;
//! ```

pub mod command;
pub mod emitter;
pub mod error;
pub mod flavor;
pub mod gcode;
pub mod lookahead;
pub mod material;
pub mod mixing;
pub mod printer;
pub mod template;

pub use command::Command;
pub use emitter::{coasting_split, filament_length, EmitterState, GcodeEmitter, ProgramStats};
pub use error::{GcodeError, Result};
pub use flavor::GcodeFlavor;
pub use gcode::{generate_gcode, write_gcode, GcodeSettings, RetractionSettings};
pub use lookahead::{next_range_change, RangeChange, UpcomingPaths};
pub use material::Material;
pub use mixing::{tool_index, DockSettings, MixingMode, MAX_SWITCHING_REGIONS};
pub use printer::PrinterProfile;
pub use template::{render, TemplateValues};
