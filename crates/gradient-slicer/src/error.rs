//! Error types for the slicer.

use gradient_kernel::KernelError;
use thiserror::Error;

/// Errors that can occur during slicing.
#[derive(Error, Debug)]
pub enum SlicerError {
    /// Invalid slice settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Model has no extent to slice.
    #[error("model is empty")]
    EmptyModel,

    /// The purge zone cannot hold one tower per material range.
    #[error(
        "purge zone holds {available} tower positions but {required} ranges need one; \
         adjust the purge tower settings"
    )]
    InsufficientPurgeCenters {
        /// Candidate positions in the zone.
        available: usize,
        /// Number of material ranges.
        required: usize,
    },

    /// Geometry kernel query failed.
    #[error("geometry kernel: {0}")]
    Kernel(#[from] KernelError),
}

/// Result type for slicer operations.
pub type Result<T> = std::result::Result<T, SlicerError>;
