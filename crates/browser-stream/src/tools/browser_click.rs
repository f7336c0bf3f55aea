//! `browser_click` tool (§4.7.1 / §6).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::browser::BrowserState;
use crate::orchestrator;
use crate::result::ActionResult;
use crate::server::ToolOutput;

use super::traits::{Tool, ToolResult};
use super::util::{acquire, blank_page};
use super::ToolError;

#[derive(Debug, Deserialize)]
struct ClickInput {
    #[serde(rename = "ref")]
    ref_: String,
}

/// Resolves a ref, checks it's in the viewport, clicks it, and reports
/// what changed.
pub struct BrowserClickTool;

impl BrowserClickTool {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for BrowserClickTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for BrowserClickTool {
    fn name(&self) -> &'static str {
        "browser_click"
    }

    fn description(&self) -> &'static str {
        "Click an interactive element identified by its @eN ref from a prior snapshot. \
         Returns what changed on the page as a consequence."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "ref": { "type": "string", "description": "Element ref from a snapshot, e.g. '@e3'" }
            },
            "required": ["ref"]
        })
    }

    async fn execute(&self, args: &Value, browser: &mut BrowserState) -> ToolResult {
        let input: ClickInput =
            serde_json::from_value(args.clone()).map_err(|e| ToolError::InvalidParams(e.to_string()))?;

        let (channel, registry) = match acquire(browser).await {
            Ok(pair) => pair,
            Err(error) => {
                let result = ActionResult::failure(format!("click {}", input.ref_), blank_page(), error, 0);
                return Ok(ToolOutput::text(serde_json::to_string(&result)?));
            }
        };

        let result = orchestrator::click(channel, registry, &input.ref_).await;
        Ok(ToolOutput::text(serde_json::to_string(&result)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_metadata() {
        let tool = BrowserClickTool::new();
        assert_eq!(tool.name(), "browser_click");
        assert_eq!(tool.input_schema()["required"][0], "ref");
    }

    #[test]
    fn input_parsing_reads_ref_field() {
        let input: ClickInput = serde_json::from_value(serde_json::json!({ "ref": "@e3" })).unwrap();
        assert_eq!(input.ref_, "@e3");
    }

    #[test]
    fn input_parsing_rejects_missing_ref() {
        assert!(serde_json::from_value::<ClickInput>(serde_json::json!({})).is_err());
    }
}
