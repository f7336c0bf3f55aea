//! Shared glue between the tool layer and the browser/orchestrator: lazy
//! browser init and the `BrowserError` → wire `ErrorDetail` mapping used
//! when a tool can't even get a channel to act on.

use crate::browser::{BrowserError, BrowserState};
use crate::result::{ActionErrorCode, ErrorDetail};
use crate::snapshot::PageInfo;

/// Maps a lifecycle failure onto the wire taxonomy (§7).
pub(super) fn browser_error_detail(e: &BrowserError) -> ErrorDetail {
    let code = match e {
        BrowserError::PageCrashed => ActionErrorCode::PageCrashed,
        BrowserError::CdpDisconnected => ActionErrorCode::CdpDisconnected,
        BrowserError::NotRunning | BrowserError::LaunchFailed(_) | BrowserError::ConnectionFailed(_) => {
            ActionErrorCode::ActionFailed
        }
    };
    ErrorDetail::new(code, e.to_string())
}

/// Lazily launches/attaches the browser, then borrows its channel and ref
/// registry together. Every tool's `execute` starts here; a failure turns
/// into an `ok:false` envelope rather than an `Err` out of `execute`, per
/// the policy that no exception escapes an action.
pub(super) async fn acquire(
    browser: &mut BrowserState,
) -> Result<(&crate::cdp::CdpChannel, &mut crate::registry::RefRegistry), ErrorDetail> {
    browser.initialize().await.map_err(|e| browser_error_detail(&e))?;
    browser.channel_and_registry().map_err(|e| browser_error_detail(&e))
}

/// Empty `PageInfo`, for envelopes built before any snapshot was taken.
pub(super) fn blank_page() -> PageInfo {
    PageInfo::default()
}
