//! Job files: the object to print and every setting, in JSON or TOML.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use gradient_kernel::PrismSpec;
use gradient_slicer::SliceSettings;
use gradient_slicer_gcode::{GcodeSettings, PrinterProfile};

/// Printer chosen by built-in name or given in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrinterRef {
    /// A built-in profile, e.g. `"prusa_xl_5t"`.
    Name(String),
    /// A complete profile.
    Inline(PrinterProfile),
}

impl PrinterRef {
    /// The profile this reference names.
    pub fn profile(&self) -> Result<PrinterProfile> {
        match self {
            PrinterRef::Name(name) => lookup_printer(name),
            PrinterRef::Inline(profile) => Ok(profile.clone()),
        }
    }
}

/// Look up a built-in printer, listing the known ones on failure.
pub fn lookup_printer(name: &str) -> Result<PrinterProfile> {
    match PrinterProfile::by_name(name) {
        Some(profile) => Ok(profile),
        None => {
            let known: Vec<&str> = PrinterProfile::builtin_ids().collect();
            bail!("unknown printer '{}' (known: {})", name, known.join(", "))
        }
    }
}

/// A print job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFile {
    /// Job name, used for the default output file.
    #[serde(default = "default_name")]
    pub name: String,
    /// The object: an extruded footprint with a material field.
    pub object: PrismSpec,
    /// Slicing settings.
    #[serde(default)]
    pub slice: SliceSettings,
    /// G-code settings.
    #[serde(default)]
    pub gcode: GcodeSettings,
    /// Printer, overriding `gcode.printer`.
    #[serde(default)]
    pub printer: Option<PrinterRef>,
}

fn default_name() -> String {
    "gradient".to_string()
}

/// Job file syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFormat {
    /// JSON.
    Json,
    /// TOML.
    Toml,
}

impl JobFormat {
    /// Format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "json" => Ok(JobFormat::Json),
            "toml" => Ok(JobFormat::Toml),
            _ => bail!(
                "unknown job file type '{}' (expected .json or .toml)",
                path.display()
            ),
        }
    }
}

impl JobFile {
    /// Read and resolve a job file.
    pub fn load(path: &Path) -> Result<Self> {
        let format = JobFormat::from_path(path)?;
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text, format).with_context(|| format!("invalid job file {}", path.display()))
    }

    /// Parse and resolve job text.
    pub fn parse(text: &str, format: JobFormat) -> Result<Self> {
        let job: JobFile = match format {
            JobFormat::Json => serde_json::from_str(text)?,
            JobFormat::Toml => toml::from_str(text)?,
        };
        job.resolve()
    }

    /// Apply the printer reference and place the object on the bed center
    /// when no placement was given.
    pub fn resolve(mut self) -> Result<Self> {
        if let Some(printer) = &self.printer {
            self.gcode.printer = printer.profile()?;
        }
        self.use_printer_bed();
        Ok(self)
    }

    /// Replace the printer.
    pub fn set_printer(&mut self, profile: PrinterProfile) {
        self.gcode.printer = profile;
        self.use_printer_bed();
    }

    fn use_printer_bed(&mut self) {
        if self.slice.bed_center.is_none() {
            self.slice.bed_center = Some(self.gcode.printer.bed_center());
        }
    }
}
