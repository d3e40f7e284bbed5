//! Error types for the subd-shading crate.
//!
//! Evaluation itself is infallible. Errors only surface when scene arrays are
//! wrapped into views or when packed descriptors are decoded.

use thiserror::Error;

/// Main error type for subd-shading operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The patch array length is not a multiple of the record size.
    #[error("Patch array length {len} is not a multiple of {record_len}")]
    PatchArrayLength { len: usize, record_len: usize },

    /// A patch record is inconsistent.
    #[error("Invalid patch at word offset {patch}: {reason}")]
    InvalidPatch { patch: usize, reason: String },

    /// A triangle references data outside of the arrays it was given.
    #[error("Invalid triangle {prim}: {reason}")]
    InvalidTriangle { prim: usize, reason: String },

    /// Invalid buffer size.
    #[error("Invalid buffer size: expected {expected}, got {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },

    /// Unknown attribute element id in a packed descriptor.
    #[error("Unknown attribute element id {0}")]
    UnknownElement(u32),

    /// Unknown attribute type id in a packed descriptor.
    #[error("Unknown attribute type id {0}")]
    UnknownType(u32),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
