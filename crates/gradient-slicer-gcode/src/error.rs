//! Error types for G-code emission.

use gradient_kernel::MaterialRange;
use thiserror::Error;

/// Errors that can occur while writing a program.
#[derive(Error, Debug)]
pub enum GcodeError {
    /// Invalid emitter settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The mixing mode name is not one of `mixture`, `temperature` or `switching`.
    #[error("unknown mixing mode '{0}' (expected mixture, temperature or switching)")]
    UnknownMixingMode(String),

    /// Temperature mode was selected without naming a material.
    #[error("temperature mixing needs a material")]
    MissingMaterial,

    /// No temperature and flow model exists for the material.
    #[error("unsupported material '{0}' (supported: pla, tpu)")]
    UnsupportedMaterial(String),

    /// Switching mode maps each range to its own tool.
    #[error("switching mode supports at most {max} regions, got {regions}")]
    TooManySwitchingRegions {
        /// Number of material ranges.
        regions: usize,
        /// Tools available.
        max: usize,
    },

    /// A mixing command was requested for the whole fraction interval.
    #[error("mixing command requested for {0}, which spans every material")]
    InvalidMixingRange(MaterialRange),

    /// Writing the program failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for G-code operations.
pub type Result<T> = std::result::Result<T, GcodeError>;
