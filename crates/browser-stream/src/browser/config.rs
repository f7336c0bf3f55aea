//! Browser configuration types

/// Browser configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,

    /// Viewport size. Defaults to 1280x960.
    pub viewport: ViewportSize,

    /// Existing CDP endpoint to attach to instead of launching a browser.
    ///
    /// Accepts a `ws://`/`wss://` websocket debugger URL or an `http(s)://`
    /// endpoint from which the websocket URL is discovered.
    pub cdp_endpoint: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            viewport: ViewportSize::default(),
            cdp_endpoint: None,
        }
    }
}

/// Viewport size configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 960,
        }
    }
}

impl ViewportSize {
    /// Create a new viewport size
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}
