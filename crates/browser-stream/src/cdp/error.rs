//! CDP channel error types

use thiserror::Error;

/// Errors surfaced by the CDP channel facade.
#[derive(Debug, Error)]
pub enum CdpError {
    /// `Inspector.targetCrashed` was observed; the channel is permanently
    /// crashed and every subsequent `send` fails the same way.
    #[error("page crashed")]
    PageCrashed,

    /// The channel's websocket is closed, or a send failed terminally.
    #[error("CDP channel disconnected: {0}")]
    Disconnected(String),

    /// The underlying CDP command returned a protocol-level error.
    #[error("CDP command failed: {0}")]
    Command(String),

    /// The channel could not be established against the target page.
    #[error("failed to set up CDP channel: {0}")]
    Setup(String),
}
