//! Whole programs generated from sliced reference prisms.

use gradient_kernel::{FieldSpec, MaterialRange, PrismKernel};
use gradient_slicer::{slice, PurgeSettings, SliceResult, SliceSettings};
use gradient_slicer_gcode::{
    generate_gcode, write_gcode, DockSettings, GcodeError, GcodeSettings, MixingMode,
    PrinterProfile,
};

fn sliced(num_regions: usize, purge: bool) -> SliceResult {
    let kernel = PrismKernel::bar(
        40.0,
        10.0,
        0.6,
        FieldSpec::Linear {
            gradient: [0.025, 0.0, 0.0],
            offset: 0.5,
        },
    )
    .unwrap();
    let settings = SliceSettings {
        num_regions,
        infill_density: 0.3,
        bed_center: Some([110.0, 110.0]),
        purge: purge.then(|| PurgeSettings {
            zone_min: [10.0, 10.0],
            zone_max: [80.0, 30.0],
            tower_size: [8.0, 8.0],
            spacing: [10.0, 10.0],
            wall_count: 3,
        }),
        ..SliceSettings::default()
    };
    slice(&kernel, &settings).unwrap()
}

#[test]
fn test_mixture_program_structure() {
    let result = sliced(2, false);
    let gcode = generate_gcode(&result, &GcodeSettings::default()).unwrap();

    assert!(gcode.contains("M83"));
    assert!(gcode.contains("M190 S60"));
    assert!(!gcode.contains("[bed_temperature]"));
    assert!(!gcode.contains("[bed_min_x]"));
    assert!(gcode.trim_end().ends_with("M84 ; Disable motors"));

    let layer_markers = gcode.lines().filter(|l| l.starts_with("; Layer ")).count();
    assert_eq!(layer_markers, result.layers.len());

    // Both ranges on the first layer, then one change per layer since the
    // region order alternates.
    assert_eq!(gcode.matches("M164 S0").count(), result.layers.len() + 1);
    for line in gcode.lines().filter(|l| l.starts_with("M163")) {
        let p: f64 = line.rsplit('P').next().unwrap().parse().unwrap();
        assert!((0.0..=1.0).contains(&p));
    }
}

#[test]
fn test_extrusion_matches_path_lengths() {
    let result = sliced(2, true);
    let mut out = Vec::new();
    let stats = write_gcode(&result, &GcodeSettings::default(), &mut out).unwrap();

    assert_eq!(stats.layers, result.layers.len());
    let expected = gradient_slicer_gcode::filament_length(
        result.stats.extrusion_length,
        result.bead_width,
        result.layer_height,
        1.75,
        1.0,
    );
    assert!((stats.filament_length - expected).abs() < 1e-6 * expected.max(1.0));
    assert!((stats.extrusion_distance - result.stats.extrusion_length).abs() < 1e-6);

    let text = String::from_utf8(out).unwrap();
    let e_sum: f64 = text
        .lines()
        .filter(|l| l.starts_with("G1 "))
        .filter_map(|l| l.split(' ').find_map(|w| w.strip_prefix('E')))
        .map(|v| v.parse::<f64>().unwrap())
        .sum();
    // Rounded to five decimals per line.
    assert!((e_sum - stats.filament_length).abs() < 1e-5 * stats.lines as f64);
}

#[test]
fn test_single_range_program_has_no_mixing() {
    let result = sliced(1, false);
    assert_eq!(result.ranges, vec![MaterialRange::FULL]);
    let gcode = generate_gcode(&result, &GcodeSettings::default()).unwrap();
    assert!(!gcode.contains("M163"));
    assert!(gcode.contains("G1 X"));
}

#[test]
fn test_switching_program() {
    let result = sliced(5, false);
    let settings = GcodeSettings {
        printer: PrinterProfile::prusa_xl_5t(),
        mixing: MixingMode::Switching,
        ..GcodeSettings::default()
    };
    let gcode = generate_gcode(&result, &settings).unwrap();
    // Start template heats every tool.
    assert!(gcode.contains("M104 T4 S210"));
    for tool in ["T0", "T1", "T2", "T3", "T4"] {
        assert!(gcode.lines().any(|l| l == tool), "{tool} never selected");
    }

    let too_many = sliced(6, false);
    assert!(matches!(
        generate_gcode(&too_many, &settings),
        Err(GcodeError::TooManySwitchingRegions { regions: 6, max: 5 })
    ));
}

#[test]
fn test_temperature_program() {
    let result = sliced(3, false);
    let settings = GcodeSettings {
        mixing: MixingMode::Temperature {
            material: "pla".into(),
            dock: Some(DockSettings::default()),
        },
        lookahead_distance: 5.0,
        ..GcodeSettings::default()
    };
    let gcode = generate_gcode(&result, &settings).unwrap();
    assert!(gcode.contains("M109 S200"));
    assert!(gcode.contains("M109 S220"));
    assert!(gcode.contains("M109 S240"));
    assert!(gcode.contains("M221 S"));
    assert!(!gcode.contains("M163"));

    let unsupported = GcodeSettings {
        mixing: MixingMode::Temperature {
            material: "nylon".into(),
            dock: None,
        },
        ..GcodeSettings::default()
    };
    assert!(matches!(
        generate_gcode(&result, &unsupported),
        Err(GcodeError::UnsupportedMaterial(_))
    ));
}
