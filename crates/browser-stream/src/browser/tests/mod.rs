//! Unit tests for browser state management that don't require a live
//! Chromium instance.

use crate::browser::{BrowserConfig, BrowserState, ViewportSize};

#[test]
fn test_default_viewport_is_1280x960() {
    let viewport = ViewportSize::default();
    assert_eq!(viewport.width, 1280);
    assert_eq!(viewport.height, 960);
}

#[tokio::test]
async fn test_browser_state_starts_uninitialized() {
    let config = BrowserConfig::default();
    let state = BrowserState::new(config);

    assert!(!state.is_initialized());
    assert!(state.channel().is_err());
}

#[tokio::test]
async fn test_browser_state_registry_starts_empty() {
    let config = BrowserConfig::default();
    let state = BrowserState::new(config);

    assert!(state.registry().is_empty());
}

#[tokio::test]
async fn test_handle_potential_connection_loss_resets_state() {
    let config = BrowserConfig::default();
    let mut state = BrowserState::new(config);

    // Simulating a lost connection before initialization is a no-op; the
    // important property is it never panics and leaves state consistent.
    state.handle_potential_connection_loss("CDP_DISCONNECTED: socket closed");
    assert!(!state.is_initialized());
}
