//! `browser_navigate` tool (§4.7.5 / §6).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::browser::BrowserState;
use crate::orchestrator;
use crate::result::SnapshotResult;
use crate::server::ToolOutput;

use super::traits::{Tool, ToolResult};
use super::util::{acquire, blank_page};
use super::ToolError;

#[derive(Debug, Deserialize)]
struct NavigateInput {
    url: String,
}

/// Navigates the single page and returns a fresh snapshot.
pub struct BrowserNavigateTool;

impl BrowserNavigateTool {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for BrowserNavigateTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for BrowserNavigateTool {
    fn name(&self) -> &'static str {
        "browser_navigate"
    }

    fn description(&self) -> &'static str {
        "Navigate the browser to a URL and return a snapshot of the resulting page."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "The URL to navigate to" }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: &Value, browser: &mut BrowserState) -> ToolResult {
        let input: NavigateInput =
            serde_json::from_value(args.clone()).map_err(|e| ToolError::InvalidParams(e.to_string()))?;

        let (channel, registry) = match acquire(browser).await {
            Ok(pair) => pair,
            Err(error) => {
                let result = SnapshotResult::failure(blank_page(), error, 0);
                return Ok(ToolOutput::text(serde_json::to_string(&result)?));
            }
        };

        let result = orchestrator::navigate(channel, registry, &input.url).await;
        Ok(ToolOutput::text(serde_json::to_string(&result)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_metadata() {
        let tool = BrowserNavigateTool::new();
        assert_eq!(tool.name(), "browser_navigate");
        let schema = tool.input_schema();
        assert_eq!(schema["required"][0], "url");
    }

    #[test]
    fn input_parsing_rejects_missing_url() {
        let err = serde_json::from_value::<NavigateInput>(serde_json::json!({})).unwrap_err();
        assert!(err.to_string().contains("url"));
    }

    #[test]
    fn input_parsing_accepts_url() {
        let input: NavigateInput = serde_json::from_value(serde_json::json!({ "url": "https://example.com" })).unwrap();
        assert_eq!(input.url, "https://example.com");
    }
}
