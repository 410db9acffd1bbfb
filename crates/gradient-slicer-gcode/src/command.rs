//! Single G-code lines.

/// One line of the motion program.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// G0 - Rapid move (travel)
    Rapid {
        /// Target X.
        x: Option<f64>,
        /// Target Y.
        y: Option<f64>,
        /// Target Z.
        z: Option<f64>,
        /// Feedrate (mm/min).
        f: Option<f64>,
    },
    /// G1 - Linear move, extruding `e` millimetres of filament when set
    Linear {
        /// Target X.
        x: Option<f64>,
        /// Target Y.
        y: Option<f64>,
        /// Relative filament length.
        e: Option<f64>,
        /// Feedrate (mm/min).
        f: Option<f64>,
    },
    /// G10 - Firmware retract
    Retract,
    /// G11 - Firmware un-retract
    Unretract,
    /// M104 / M109 - Set extruder temperature, optionally waiting for it
    SetTemperature {
        /// Target temperature (°C).
        s: u32,
        /// Block until the temperature is reached.
        wait: bool,
    },
    /// M221 - Flow percentage
    SetFlow {
        /// Flow (%).
        percent: f64,
    },
    /// M106 - Part cooling fan
    SetFanSpeed {
        /// PWM value, 0-255.
        s: u8,
    },
    /// M163 - Mix factor for one input of a mixing extruder (Marlin)
    MixFactor {
        /// Input channel.
        channel: u8,
        /// Proportion of the blend, 0-1.
        factor: f64,
    },
    /// M164 - Store the pending mix in a virtual tool (Marlin)
    CommitMix {
        /// Virtual tool index.
        tool: u32,
    },
    /// M567 - Mixing ratios for a tool (RepRap)
    SetMixRatio {
        /// Tool index.
        tool: u32,
        /// Proportion per input.
        weights: [f64; 2],
    },
    /// T - Select tool
    SelectTool(u32),
    /// Comment
    Comment(String),
}

impl Command {
    /// Convert the command to a G-code string.
    pub fn to_gcode(&self) -> String {
        match self {
            Command::Rapid { x, y, z, f } => {
                let mut cmd = String::from("G0");
                push_axis(&mut cmd, 'X', *x, 3);
                push_axis(&mut cmd, 'Y', *y, 3);
                push_axis(&mut cmd, 'Z', *z, 3);
                push_axis(&mut cmd, 'F', *f, 0);
                cmd
            }
            Command::Linear { x, y, e, f } => {
                let mut cmd = String::from("G1");
                push_axis(&mut cmd, 'X', *x, 3);
                push_axis(&mut cmd, 'Y', *y, 3);
                push_axis(&mut cmd, 'E', *e, 5);
                push_axis(&mut cmd, 'F', *f, 0);
                cmd
            }
            Command::Retract => "G10 ; retract".to_string(),
            Command::Unretract => "G11 ; un-retract".to_string(),
            Command::SetTemperature { s, wait: false } => format!("M104 S{}", s),
            Command::SetTemperature { s, wait: true } => format!("M109 S{}", s),
            Command::SetFlow { percent } => format!("M221 S{:.0}", percent),
            Command::SetFanSpeed { s } => format!("M106 S{}", s),
            Command::MixFactor { channel, factor } => format!("M163 S{} P{:.4}", channel, factor),
            Command::CommitMix { tool } => format!("M164 S{}", tool),
            Command::SetMixRatio { tool, weights } => {
                format!("M567 P{} E{:.4}:{:.4}", tool, weights[0], weights[1])
            }
            Command::SelectTool(tool) => format!("T{}", tool),
            Command::Comment(text) => format!("; {}", text),
        }
    }
}

fn push_axis(cmd: &mut String, axis: char, value: Option<f64>, precision: usize) {
    if let Some(v) = value {
        cmd.push_str(&format!(" {}{:.prec$}", axis, v, prec = precision));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rapid_move() {
        let cmd = Command::Rapid {
            x: Some(10.0),
            y: Some(20.0),
            z: None,
            f: Some(7200.0),
        };
        assert_eq!(cmd.to_gcode(), "G0 X10.000 Y20.000 F7200");
    }

    #[test]
    fn test_linear_move() {
        let cmd = Command::Linear {
            x: Some(1.23456),
            y: Some(-2.0),
            e: Some(0.332601),
            f: None,
        };
        assert_eq!(cmd.to_gcode(), "G1 X1.235 Y-2.000 E0.33260");
    }

    #[test]
    fn test_mixing_and_temperature_commands() {
        assert_eq!(
            Command::MixFactor {
                channel: 1,
                factor: 0.375
            }
            .to_gcode(),
            "M163 S1 P0.3750"
        );
        assert_eq!(
            Command::SetMixRatio {
                tool: 0,
                weights: [0.625, 0.375]
            }
            .to_gcode(),
            "M567 P0 E0.6250:0.3750"
        );
        assert_eq!(Command::SetTemperature { s: 215, wait: true }.to_gcode(), "M109 S215");
        assert_eq!(Command::SetFlow { percent: 87.6 }.to_gcode(), "M221 S88");
        assert_eq!(Command::SelectTool(3).to_gcode(), "T3");
    }
}
