//! Snapshot error types

use thiserror::Error;

use crate::cdp::CdpError;

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur while building a [`crate::snapshot::SnapshotData`].
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The CDP channel failed while walking the accessibility tree or DOM.
    #[error(transparent)]
    Cdp(#[from] CdpError),

    /// The page returned a malformed result for an in-page evaluation the
    /// builder depends on (e.g. the DOM fallback query).
    #[error("snapshot evaluation returned an unexpected shape: {0}")]
    UnexpectedShape(String),
}
