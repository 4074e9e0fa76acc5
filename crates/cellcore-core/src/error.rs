//! Crate-wide error type.
//!
//! `MaskBoundaryViolation` from spec §7 has no variant here: the contract
//! ("border voxels are masked zero") is documented, not detected, and a
//! violation produces unspecified (but memory-safe) output rather than a
//! catchable error.

use thiserror::Error;

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the raster I/O and filter layers.
#[derive(Debug, Error)]
pub enum Error {
    /// Mmap open/create/unmap failure, or a short backing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Two volumes that must be compatible disagree on shape.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Shape required by the caller/context.
        expected: (u64, u64, u64),
        /// Shape actually observed.
        got: (u64, u64, u64),
    },

    /// An element type fell outside the fused set a filter supports.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A seed raveled index pointed outside the volume.
    #[error("seed index {index} out of range for volume of size {size}")]
    SeedOutOfRange {
        /// The offending raveled index.
        index: usize,
        /// Total element count of the volume.
        size: usize,
    },

    /// A bug: heap underflow, label overflow, or other broken invariant.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}
