use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::accessibility::EnableParams as AccessibilityEnableParams;
use chromiumoxide::cdp::browser_protocol::dom::EnableParams as DomEnableParams;
use chromiumoxide::cdp::browser_protocol::inspector::{
    EnableParams as InspectorEnableParams, EventTargetCrashed,
};
use chromiumoxide::cdp::browser_protocol::network::EnableParams as NetworkEnableParams;
use chromiumoxide::cdp::browser_protocol::page::EnableParams as PageEnableParams;
use chromiumoxide::cdp::js_protocol::runtime::EnableParams as RuntimeEnableParams;
use chromiumoxide::cdp::{Command, IntoEventKind};
use chromiumoxide::error::CdpError as ChromiumoxideError;
use chromiumoxide::listeners::EventStream;
use futures::StreamExt;

use super::CdpError;

/// Thin facade over a `chromiumoxide::Page` that normalizes protocol and
/// transport failures into [`CdpError`] and tracks the permanently-crashed
/// state `Inspector.targetCrashed` puts the target into.
///
/// Every other module in this crate reaches Chromium exclusively through
/// this type; none of them import `chromiumoxide` directly.
pub struct CdpChannel {
    page: Page,
    crashed: Arc<AtomicBool>,
}

impl CdpChannel {
    /// Wrap `page`, enable the domains every component of this crate
    /// depends on (Page, DOM, Runtime, Accessibility, Network, Inspector),
    /// and start watching for `Inspector.targetCrashed`.
    pub async fn new(page: Page) -> Result<Self, CdpError> {
        page.execute(PageEnableParams::default())
            .await
            .map_err(setup_err)?;
        page.execute(DomEnableParams::default())
            .await
            .map_err(setup_err)?;
        page.execute(RuntimeEnableParams::default())
            .await
            .map_err(setup_err)?;
        page.execute(AccessibilityEnableParams::default())
            .await
            .map_err(setup_err)?;
        page.execute(NetworkEnableParams::default())
            .await
            .map_err(setup_err)?;
        page.execute(InspectorEnableParams::default())
            .await
            .map_err(setup_err)?;

        let crashed = Arc::new(AtomicBool::new(false));
        let mut crash_events = page
            .event_listener::<EventTargetCrashed>()
            .await
            .map_err(setup_err)?;
        let crashed_flag = Arc::clone(&crashed);
        tokio::spawn(async move {
            if crash_events.next().await.is_some() {
                tracing::warn!("Inspector.targetCrashed observed, channel marked crashed");
                crashed_flag.store(true, Ordering::SeqCst);
            }
        });

        Ok(Self { page, crashed })
    }

    /// Whether `Inspector.targetCrashed` has fired on this channel.
    #[must_use]
    pub fn is_crashed(&self) -> bool {
        self.crashed.load(Ordering::SeqCst)
    }

    /// Send a typed CDP command, surfacing `PageCrashed`/`Disconnected`
    /// ahead of the underlying protocol error when applicable.
    ///
    /// # Errors
    ///
    /// Returns [`CdpError::PageCrashed`] if the channel has crashed,
    /// [`CdpError::Disconnected`] if the transport is gone, or
    /// [`CdpError::Command`] for any other protocol failure.
    pub async fn send<T>(&self, cmd: T) -> Result<T::Response, CdpError>
    where
        T: Command + Send + Sync,
    {
        if self.is_crashed() {
            return Err(CdpError::PageCrashed);
        }

        self.page
            .execute(cmd)
            .await
            .map(|resp| resp.result)
            .map_err(|e| {
                if self.is_crashed() {
                    CdpError::PageCrashed
                } else {
                    classify(e)
                }
            })
    }

    /// Subscribe to a CDP event stream.
    ///
    /// # Errors
    ///
    /// Returns [`CdpError::Disconnected`] if the subscription cannot be
    /// established.
    pub async fn on<T>(&self) -> Result<EventStream<T>, CdpError>
    where
        T: IntoEventKind + Unpin + std::fmt::Debug + serde::de::DeserializeOwned + Send + 'static,
    {
        if self.is_crashed() {
            return Err(CdpError::PageCrashed);
        }
        self.page
            .event_listener::<T>()
            .await
            .map_err(|e| classify(e))
    }

    /// Evaluate a JavaScript expression in the page's main world and
    /// deserialize the result.
    ///
    /// # Errors
    ///
    /// Returns [`CdpError::Command`] if evaluation throws or the result
    /// cannot be deserialized.
    pub async fn evaluate<T>(&self, expression: &str) -> Result<T, CdpError>
    where
        T: serde::de::DeserializeOwned,
    {
        if self.is_crashed() {
            return Err(CdpError::PageCrashed);
        }
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(|e| classify(e))?;
        result
            .into_value()
            .map_err(|e| CdpError::Command(e.to_string()))
    }

    /// The page's current URL, used for `PageInfo` and navigation bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns [`CdpError::Command`] if the URL cannot be read.
    pub async fn url(&self) -> Result<String, CdpError> {
        self.page
            .url()
            .await
            .map_err(|e| classify(e))?
            .ok_or_else(|| CdpError::Command("page has no URL".to_string()))
    }

    /// Close the underlying target.
    pub async fn close(&self) {
        if let Err(e) = self.page.close().await {
            tracing::debug!(error = %e, "error closing CDP target (already gone?)");
        }
    }
}

fn setup_err(e: ChromiumoxideError) -> CdpError {
    CdpError::Setup(e.to_string())
}

fn classify(e: ChromiumoxideError) -> CdpError {
    let msg = e.to_string();
    if msg.contains("closed") || msg.contains("disconnected") {
        CdpError::Disconnected(msg)
    } else {
        CdpError::Command(msg)
    }
}
