//! Browser error types

use thiserror::Error;

use crate::cdp::CdpError;

/// Errors that can occur during browser launch, attach and lifecycle.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Browser launch failed
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Connection to an existing CDP endpoint failed
    #[error("Failed to connect to CDP endpoint: {0}")]
    ConnectionFailed(String),

    /// A tool was invoked before the browser finished initializing, or after
    /// it has been shut down.
    #[error("Browser not running")]
    NotRunning,

    /// The CDP channel observed `Inspector.targetCrashed`.
    #[error("Page crashed")]
    PageCrashed,

    /// The CDP channel is disconnected (the websocket closed or a send
    /// failed terminally).
    #[error("CDP channel disconnected")]
    CdpDisconnected,
}

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::PageCrashed => Self::PageCrashed,
            CdpError::Disconnected(_) => Self::CdpDisconnected,
            other => Self::LaunchFailed(other.to_string()),
        }
    }
}
