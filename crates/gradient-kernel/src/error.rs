//! Error types for the geometry kernel.

use thiserror::Error;

/// Errors raised while building or querying a kernel.
#[derive(Error, Debug)]
pub enum KernelError {
    /// Input geometry could not be interpreted.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Material field definition is unusable.
    #[error("invalid material field: {0}")]
    InvalidField(String),
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
