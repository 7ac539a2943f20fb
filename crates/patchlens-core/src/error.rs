//! Errors raised while converting patches and documents through a lens.

use thiserror::Error;

/// Boxed error returned by the external collaborators (schema oracle, patch engine).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum LensError {
    /// A `convert` op met a value its forward table does not cover.
    ///
    /// This aborts the whole conversion: the document and the lens disagree
    /// about the value domain of `field`.
    #[error("no mapping for value `{value}` of field `{field}`")]
    UnmappedValue { field: String, value: String },

    #[error("invalid JSON pointer `{pointer}`: {reason}")]
    InvalidPointer { pointer: String, reason: String },

    #[error("failed to parse lens: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("schema collaborator failed: {0}")]
    Schema(#[source] BoxError),

    #[error("patch engine failed: {0}")]
    Apply(#[source] BoxError),
}

pub type Result<T, E = LensError> = std::result::Result<T, E>;
