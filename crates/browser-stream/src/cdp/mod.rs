//! CDP Channel: request/response plus event-subscription facade over one
//! debugging target.
//!
//! Everything above this module — the ref registry, the resolver, the
//! snapshot builder, the differ, the stability waiter, the interactable
//! check and the action orchestrator — speaks to Chromium only through
//! [`CdpChannel`]. No other module imports `chromiumoxide` directly.

mod channel;
mod error;

pub use channel::CdpChannel;
pub use error::CdpError;

/// Result type for CDP channel operations.
pub type Result<T> = std::result::Result<T, CdpError>;
