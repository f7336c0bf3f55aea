//! Tool-framework errors — protocol-level failures only. An action's own
//! failure modes (§7) travel inside its `ActionResult`/`SnapshotResult`
//! envelope, not as an `Err` here.

use thiserror::Error;

/// Errors that prevent a tool from even attempting its action.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments didn't match the tool's input schema.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Failed to serialize the result envelope.
    #[error("result serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
