//! `browser_wait_for` tool (§4.7.6 / §6).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::browser::BrowserState;
use crate::orchestrator::{self, DEFAULT_WAIT_TIMEOUT_MS};
use crate::result::SnapshotResult;
use crate::server::ToolOutput;

use super::traits::{Tool, ToolResult};
use super::util::{acquire, blank_page};
use super::ToolError;

#[derive(Debug, Deserialize)]
struct WaitForInput {
    text: Option<String>,
    #[serde(rename = "ref")]
    ref_: Option<String>,
    timeout: Option<u64>,
}

/// Polls every 500 ms until the text and/or ref conditions hold, or the
/// timeout (default 10 s) elapses.
pub struct BrowserWaitForTool;

impl BrowserWaitForTool {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for BrowserWaitForTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for BrowserWaitForTool {
    fn name(&self) -> &'static str {
        "browser_wait_for"
    }

    fn description(&self) -> &'static str {
        "Wait until given text appears on the page and/or a ref resolves, polling every \
         500ms until the timeout (default 10000ms) elapses."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": { "type": "string", "description": "Substring to wait for, matched case-insensitively" },
                "ref": { "type": "string", "description": "Ref that must resolve for the wait to succeed" },
                "timeout": { "type": "number", "description": "Timeout in milliseconds, default 10000" }
            }
        })
    }

    async fn execute(&self, args: &Value, browser: &mut BrowserState) -> ToolResult {
        let input: WaitForInput =
            serde_json::from_value(args.clone()).map_err(|e| ToolError::InvalidParams(e.to_string()))?;
        let timeout_ms = input.timeout.unwrap_or(DEFAULT_WAIT_TIMEOUT_MS);

        let (channel, registry) = match acquire(browser).await {
            Ok(pair) => pair,
            Err(error) => {
                let result = SnapshotResult::failure(blank_page(), error, 0);
                return Ok(ToolOutput::text(serde_json::to_string(&result)?));
            }
        };

        let result = orchestrator::wait_for(
            channel,
            registry,
            input.text.as_deref(),
            input.ref_.as_deref(),
            timeout_ms,
        )
        .await;
        Ok(ToolOutput::text(serde_json::to_string(&result)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_metadata() {
        let tool = BrowserWaitForTool::new();
        assert_eq!(tool.name(), "browser_wait_for");
        assert_eq!(tool.input_schema()["type"], "object");
    }

    #[test]
    fn input_parsing_defaults_all_fields_optional() {
        let input: WaitForInput = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(input.text.is_none());
        assert!(input.ref_.is_none());
        assert!(input.timeout.is_none());
    }
}
