//! `browser_press_key` tool (§4.7.3 / §6).

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
struct PressKeyInput {
    key: String,
}

/// Presses a single key or `Key+Mod` combination via synthetic input events.
pub struct BrowserPressKeyTool;

impl BrowserPressKeyTool {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for BrowserPressKeyTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for BrowserPressKeyTool {
    fn name(&self) -> &'static str {
        "browser_press_key"
    }

    fn description(&self) -> &'static str {
        "Press a keyboard key or key combination, such as 'Enter', 'Tab', 'ArrowLeft', or \
         'Control+a'."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "key": {
                    "type": "string",
                    "description": "Key name, optionally with '+'-joined modifiers, e.g. 'Enter' or 'Control+a'"
                }
            },
            "required": ["key"]
        })
    }

    async fn execute(&self, args: &Value, browser: &mut BrowserState) -> ToolResult {
        let input: PressKeyInput =
            serde_json::from_value(args.clone()).map_err(|e| ToolError::InvalidParams(e.to_string()))?;

        if input.key.is_empty() {
            return Err(ToolError::InvalidParams("key cannot be empty".to_string()));
        }

        let (channel, registry) = match acquire(browser).await {
            Ok(pair) => pair,
            Err(error) => {
                let result = ActionResult::failure(format!("press_key {}", input.key), blank_page(), error, 0);
                return Ok(ToolOutput::text(serde_json::to_string(&result)?));
            }
        };

        let result = orchestrator::press_key(channel, registry, &input.key).await;
        Ok(ToolOutput::text(serde_json::to_string(&result)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_metadata() {
        let tool = BrowserPressKeyTool::new();
        assert_eq!(tool.name(), "browser_press_key");
        assert_eq!(tool.input_schema()["required"][0], "key");
    }

    #[test]
    fn input_parsing_accepts_modifier_combo() {
        let input: PressKeyInput = serde_json::from_value(serde_json::json!({ "key": "Control+a" })).unwrap();
        assert_eq!(input.key, "Control+a");
    }
}
