//! `browser_snapshot` tool (§4.3 / §6): captures the current page with no
//! preceding action and no diff.

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::browser::BrowserState;
use crate::result::SnapshotResult;
use crate::server::ToolOutput;
use crate::snapshot::take_snapshot;

use super::traits::{Tool, ToolResult};
use super::util::{acquire, blank_page};

/// Captures the accessibility snapshot of the current page with no action.
pub struct BrowserSnapshotTool;

impl BrowserSnapshotTool {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for BrowserSnapshotTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for BrowserSnapshotTool {
    fn name(&self) -> &'static str {
        "browser_snapshot"
    }

    fn description(&self) -> &'static str {
        "Capture an accessibility snapshot of the current page: a compact, flat list of \
         interactive elements, each with a stable @eN ref usable by the other tools."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    #[instrument(skip(self, _args, browser), fields(element_count))]
    async fn execute(&self, _args: &Value, browser: &mut BrowserState) -> ToolResult {
        let start = std::time::Instant::now();
        tracing::debug!("browser_snapshot: start");
        let (channel, registry) = match acquire(browser).await {
            Ok(pair) => pair,
            Err(error) => {
                let result = SnapshotResult::failure(blank_page(), error, 0);
                return Ok(ToolOutput::text(serde_json::to_string(&result)?));
            }
        };

        let result = match take_snapshot(channel, registry, false).await {
            Ok(data) => {
                let lines = data.compact_lines();
                tracing::Span::current().record("element_count", lines.len());
                SnapshotResult::success(
                    data.page.clone(),
                    lines,
                    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                )
            }
            Err(e) => SnapshotResult::failure(
                blank_page(),
                crate::result::ErrorDetail::new(crate::result::ActionErrorCode::ActionFailed, e.to_string()),
                u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            ),
        };

        tracing::debug!("browser_snapshot: complete");
        Ok(ToolOutput::text(serde_json::to_string(&result)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_metadata() {
        let tool = BrowserSnapshotTool::new();
        assert_eq!(tool.name(), "browser_snapshot");
        assert_eq!(tool.input_schema()["type"], "object");
    }
}
