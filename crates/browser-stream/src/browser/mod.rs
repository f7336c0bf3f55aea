//! Browser lifecycle: launching or attaching to a single Chromium target
//! and owning the `CdpChannel` and ref registry built over it.
//!
//! Deliberately single-page: no multi-page/multi-frame management. One
//! [`BrowserState`] drives exactly one page for the lifetime of the process.

mod config;
mod error;
mod state;

#[cfg(test)]
mod tests;

pub use config::{BrowserConfig, ViewportSize};
pub use error::BrowserError;
pub use state::BrowserState;

/// Result type for browser operations
pub type Result<T> = std::result::Result<T, BrowserError>;
