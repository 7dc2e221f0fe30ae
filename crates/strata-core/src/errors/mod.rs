//! Error types for the strata row store.
//!
//! One enum per domain, aggregated into [`StrataError`]. Functions across
//! the workspace return [`StrataResult`].

mod cell_error;
mod mutation_error;

pub use cell_error::CellError;
pub use mutation_error::MutationError;

/// Top-level error type aggregating all strata error domains.
#[derive(Debug, thiserror::Error)]
pub enum StrataError {
    /// Cell-level failure (bad view construction, malformed payload, ...).
    #[error(transparent)]
    Cell(#[from] CellError),

    /// Mutation-level failure (schema mismatch during merge or transform).
    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// Freeze/unfreeze serialization failure.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used throughout the workspace.
pub type StrataResult<T> = Result<T, StrataError>;
