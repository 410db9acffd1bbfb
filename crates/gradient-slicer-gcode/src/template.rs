//! Placeholder substitution for start and end templates.
//!
//! Templates are plain G-code with bracketed placeholders such as
//! `[bed_temperature]`. Unknown placeholders are left in place and logged.

use gradient_kernel_math::Bounds2;

/// Values available to templates.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateValues {
    /// `[bed_temperature]` (°C).
    pub bed_temperature: u32,
    /// `[extruder_temperature]` (°C).
    pub extruder_temperature: u32,
    /// `[travel_speed]` (mm/min).
    pub travel_speed: f64,
    /// `[tool0_temperature]`, `[tool1_temperature]`, ... (°C).
    pub tool_temperatures: Vec<u32>,
    /// `[bed_min_x]`, `[bed_min_y]`, `[bed_max_x]`, `[bed_max_y]`: the area the
    /// program prints on (mm).
    pub print_area: Bounds2,
}

impl TemplateValues {
    /// Placeholder and replacement pairs.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let area = if self.print_area.is_empty() {
            Bounds2 {
                min: [0.0, 0.0],
                max: [0.0, 0.0],
            }
        } else {
            self.print_area
        };
        let mut pairs = vec![
            ("[bed_temperature]".to_string(), self.bed_temperature.to_string()),
            (
                "[extruder_temperature]".to_string(),
                self.extruder_temperature.to_string(),
            ),
            ("[travel_speed]".to_string(), format!("{:.0}", self.travel_speed)),
            ("[bed_min_x]".to_string(), format!("{:.3}", area.min[0])),
            ("[bed_min_y]".to_string(), format!("{:.3}", area.min[1])),
            ("[bed_max_x]".to_string(), format!("{:.3}", area.max[0])),
            ("[bed_max_y]".to_string(), format!("{:.3}", area.max[1])),
        ];
        for (i, t) in self.tool_temperatures.iter().enumerate() {
            pairs.push((format!("[tool{i}_temperature]"), t.to_string()));
        }
        pairs
    }
}

/// Substitute every known placeholder in `template`.
pub fn render(template: &str, values: &TemplateValues) -> String {
    let mut text = template.to_string();
    for (key, value) in values.pairs() {
        text = text.replace(&key, &value);
    }
    for placeholder in unresolved_placeholders(&text) {
        log::warn!("template placeholder {placeholder} has no value");
    }
    text
}

/// Bracketed `[snake_case]` tokens still present in `text`.
pub fn unresolved_placeholders(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        let Some(close) = after.find(']') else {
            break;
        };
        let name = &after[..close];
        if !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            found.push(&rest[open..open + close + 2]);
        }
        rest = &after[close + 1..];
    }
    found
}
