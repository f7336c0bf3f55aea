//! `browser_fill` tool (§4.7.2 / §6).

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
struct FillInput {
    #[serde(rename = "ref")]
    ref_: String,
    value: String,
}

/// Sets an input/textarea/content-editable element's value through the
/// native value setter (so framework-bound listeners observe the change).
pub struct BrowserFillTool;

impl BrowserFillTool {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for BrowserFillTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for BrowserFillTool {
    fn name(&self) -> &'static str {
        "browser_fill"
    }

    fn description(&self) -> &'static str {
        "Fill a text input, textarea, or content-editable element identified by its @eN ref \
         with a value."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "ref": { "type": "string", "description": "Element ref from a snapshot, e.g. '@e3'" },
                "value": { "type": "string", "description": "Text to fill the element with" }
            },
            "required": ["ref", "value"]
        })
    }

    async fn execute(&self, args: &Value, browser: &mut BrowserState) -> ToolResult {
        let input: FillInput =
            serde_json::from_value(args.clone()).map_err(|e| ToolError::InvalidParams(e.to_string()))?;

        let (channel, registry) = match acquire(browser).await {
            Ok(pair) => pair,
            Err(error) => {
                let result = ActionResult::failure(format!("fill {}", input.ref_), blank_page(), error, 0);
                return Ok(ToolOutput::text(serde_json::to_string(&result)?));
            }
        };

        let result = orchestrator::fill(channel, registry, &input.ref_, &input.value).await;
        Ok(ToolOutput::text(serde_json::to_string(&result)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_metadata() {
        let tool = BrowserFillTool::new();
        assert_eq!(tool.name(), "browser_fill");
        let schema = tool.input_schema();
        assert_eq!(schema["required"], serde_json::json!(["ref", "value"]));
    }

    #[test]
    fn input_parsing_reads_ref_and_value() {
        let input: FillInput =
            serde_json::from_value(serde_json::json!({ "ref": "@e5", "value": "hello" })).unwrap();
        assert_eq!(input.ref_, "@e5");
        assert_eq!(input.value, "hello");
    }
}
