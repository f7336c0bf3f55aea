//! Browser state management: launches or attaches to Chromium, owns the
//! single page's `CdpChannel` and the ref registry scoped to its lifetime.

use chromiumoxide::Browser;
use chromiumoxide::browser::BrowserConfig as ChromeConfig;
use futures::StreamExt;

use crate::cdp::CdpChannel;
use crate::registry::RefRegistry;

use super::config::BrowserConfig;
use super::error::BrowserError;

/// Owns the one browser target this crate drives: a launched or attached
/// Chromium instance, its single page, the `CdpChannel` built over it, and
/// the ref registry scoped to that page.
pub struct BrowserState {
    config: BrowserConfig,
    channel: Option<CdpChannel>,
    registry: RefRegistry,
    browser: Option<Browser>,
    handler_task: Option<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for BrowserState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserState")
            .field("config", &self.config)
            .field("initialized", &self.channel.is_some())
            .finish()
    }
}

impl BrowserState {
    /// Create a new, uninitialized browser state manager.
    #[must_use]
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            channel: None,
            registry: RefRegistry::new(),
            browser: None,
            handler_task: None,
        }
    }

    /// The browser configuration.
    #[must_use]
    pub const fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Whether the browser has been launched/attached.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.channel.is_some()
    }

    /// Lazily launch (or attach to, via `--cdp-url`) the browser on first
    /// use and establish the single page's `CdpChannel`.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::LaunchFailed`] / [`BrowserError::ConnectionFailed`]
    /// if the browser cannot be started or attached to.
    pub async fn initialize(&mut self) -> Result<(), BrowserError> {
        if self.channel.is_some() {
            return Ok(());
        }

        tracing::info!(
            cdp_endpoint = ?self.config.cdp_endpoint,
            width = self.config.viewport.width,
            height = self.config.viewport.height,
            "initializing browser"
        );

        let (browser, mut handler) = if let Some(endpoint) = self.config.cdp_endpoint.clone() {
            Browser::connect(&endpoint)
                .await
                .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?
        } else {
            let mut builder = ChromeConfig::builder()
                .arg("--no-first-run")
                .arg("--no-default-browser-check")
                .window_size(self.config.viewport.width, self.config.viewport.height);
            if !self.config.headless {
                builder = builder.with_head();
            }
            let chrome_config = builder.build().map_err(BrowserError::LaunchFailed)?;

            Browser::launch(chrome_config)
                .await
                .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?
        };

        // chromiumoxide's `Handler` drives the websocket connection and must
        // be polled continuously for any `Page`/`Browser` call to resolve.
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let channel = CdpChannel::new(page).await?;

        self.browser = Some(browser);
        self.handler_task = Some(handler_task);
        self.channel = Some(channel);
        Ok(())
    }

    /// The `CdpChannel` for the active page.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::NotRunning`] if `initialize` has not
    /// succeeded yet.
    pub fn channel(&self) -> Result<&CdpChannel, BrowserError> {
        self.channel.as_ref().ok_or(BrowserError::NotRunning)
    }

    /// The session's ref registry.
    pub fn registry_mut(&mut self) -> &mut RefRegistry {
        &mut self.registry
    }

    /// Borrow the active page's channel and the ref registry at the same
    /// time, as every orchestrator call needs both.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::NotRunning`] if `initialize` has not
    /// succeeded yet.
    pub fn channel_and_registry(&mut self) -> Result<(&CdpChannel, &mut RefRegistry), BrowserError> {
        let channel = self.channel.as_ref().ok_or(BrowserError::NotRunning)?;
        Ok((channel, &mut self.registry))
    }

    /// The session's ref registry, read-only.
    #[must_use]
    pub const fn registry(&self) -> &RefRegistry {
        &self.registry
    }

    /// Shut down: close the CDP channel, close the browser, stop the event
    /// handler loop.
    pub async fn shutdown(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close().await;
        }
        if let Some(mut browser) = self.browser.take() {
            let _ = browser.close().await;
        }
        if let Some(handler_task) = self.handler_task.take() {
            handler_task.abort();
        }
    }

    /// Inspect an execution-failure message and reset initialization state
    /// if it indicates the channel is gone, so the next tool call
    /// re-initializes rather than repeatedly failing against a dead
    /// browser.
    pub fn handle_potential_connection_loss(&mut self, error_message: &str) {
        let lost = error_message.contains("CDP_DISCONNECTED")
            || error_message.contains("PAGE_CRASHED")
            || error_message.contains("disconnected")
            || error_message.contains("crashed");
        if lost {
            tracing::warn!(error = %error_message, "browser connection lost, resetting state");
            self.channel = None;
            self.browser = None;
            if let Some(handler_task) = self.handler_task.take() {
                handler_task.abort();
            }
        }
    }
}
