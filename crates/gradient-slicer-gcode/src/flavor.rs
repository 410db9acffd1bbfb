//! G-code flavor definitions.

use serde::{Deserialize, Serialize};

use crate::command::Command;

/// G-code flavor (dialect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GcodeFlavor {
    /// Marlin firmware with a mixing extruder (M163/M164).
    #[default]
    Marlin,
    /// RepRap firmware (M567 mixing ratios).
    RepRap,
}

impl GcodeFlavor {
    /// Get the start G-code template for this flavor.
    pub fn start_gcode(&self) -> &'static str {
        match self {
            GcodeFlavor::Marlin => {
                "M140 S[bed_temperature] ; Set bed temp\n\
                 M104 S[extruder_temperature] ; Set nozzle temp\n\
                 G28 ; Home all axes\n\
                 G29 L[bed_min_x] R[bed_max_x] F[bed_min_y] B[bed_max_y] ; Probe print area\n\
                 M190 S[bed_temperature] ; Wait for bed temp\n\
                 M109 S[extruder_temperature] ; Wait for nozzle temp\n\
                 G90 ; Absolute positioning\n\
                 M83 ; Relative extrusion\n\
                 G92 E0 ; Reset extruder\n\
                 G0 Z5 F[travel_speed] ; Move Z up\n"
            }
            GcodeFlavor::RepRap => {
                "M140 S[bed_temperature]\n\
                 M104 S[extruder_temperature]\n\
                 G28\n\
                 M557 X[bed_min_x]:[bed_max_x] Y[bed_min_y]:[bed_max_y] S20\n\
                 G29\n\
                 M190 S[bed_temperature]\n\
                 M109 S[extruder_temperature]\n\
                 G90\n\
                 M83\n\
                 G92 E0\n\
                 G0 Z5 F[travel_speed]\n"
            }
        }
    }

    /// Get the end G-code template for this flavor.
    pub fn end_gcode(&self) -> &'static str {
        match self {
            GcodeFlavor::Marlin => {
                "M104 S0 ; Turn off nozzle\n\
                 M140 S0 ; Turn off bed\n\
                 M107 ; Fan off\n\
                 G91 ; Relative positioning\n\
                 G1 E-2 F2700 ; Retract\n\
                 G1 Z10 F3000 ; Move Z up\n\
                 G90 ; Absolute positioning\n\
                 G1 X0 Y200 F3000 ; Present print\n\
                 M84 ; Disable motors\n"
            }
            GcodeFlavor::RepRap => {
                "M104 S0\n\
                 M140 S0\n\
                 M107\n\
                 G91\n\
                 G1 E-2 F2700\n\
                 G1 Z10 F3000\n\
                 G90\n\
                 G1 X0 Y200 F3000\n\
                 M84\n"
            }
        }
    }

    /// Commands that set a two-input mixing extruder to `ratio` of the
    /// first input.
    pub fn mixing_commands(&self, ratio: f64) -> Vec<Command> {
        match self {
            GcodeFlavor::Marlin => vec![
                Command::MixFactor {
                    channel: 0,
                    factor: ratio,
                },
                Command::MixFactor {
                    channel: 1,
                    factor: 1.0 - ratio,
                },
                Command::CommitMix { tool: 0 },
            ],
            GcodeFlavor::RepRap => vec![Command::SetMixRatio {
                tool: 0,
                weights: [ratio, 1.0 - ratio],
            }],
        }
    }
}
