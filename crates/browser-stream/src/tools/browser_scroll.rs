//! `browser_scroll` tool (§4.7.4 / §6).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::browser::BrowserState;
use crate::orchestrator::{self, ScrollAmount, ScrollDirection};
use crate::result::ActionResult;
use crate::server::ToolOutput;

use super::traits::{Tool, ToolResult};
use super::util::{acquire, blank_page};
use super::ToolError;

#[derive(Debug, Deserialize)]
struct ScrollInput {
    #[serde(rename = "ref")]
    ref_: Option<String>,
    direction: String,
    #[serde(default)]
    amount: Option<Value>,
}

fn parse_direction(s: &str) -> Result<ScrollDirection, ToolError> {
    match s {
        "up" => Ok(ScrollDirection::Up),
        "down" => Ok(ScrollDirection::Down),
        other => Err(ToolError::InvalidParams(format!("direction must be 'up' or 'down', got '{other}'"))),
    }
}

fn parse_amount(value: Option<&Value>) -> Result<ScrollAmount, ToolError> {
    match value {
        None => Ok(ScrollAmount::Page),
        Some(Value::String(s)) => match s.as_str() {
            "page" => Ok(ScrollAmount::Page),
            "to-top" => Ok(ScrollAmount::ToTop),
            "to-bottom" => Ok(ScrollAmount::ToBottom),
            other => Err(ToolError::InvalidParams(format!("unknown amount '{other}'"))),
        },
        Some(Value::Number(n)) => n
            .as_f64()
            .map(ScrollAmount::Pixels)
            .ok_or_else(|| ToolError::InvalidParams("amount must be a finite number".to_string())),
        Some(_) => Err(ToolError::InvalidParams(
            "amount must be 'page', 'to-top', 'to-bottom', or a number".to_string(),
        )),
    }
}

/// Scrolls the nearest scrollable ancestor of a ref, or the viewport if
/// no ref is given, and reports DOM-churn/layout-shift consequences.
pub struct BrowserScrollTool;

impl BrowserScrollTool {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for BrowserScrollTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for BrowserScrollTool {
    fn name(&self) -> &'static str {
        "browser_scroll"
    }

    fn description(&self) -> &'static str {
        "Scroll the page or, given a ref, its nearest scrollable ancestor. direction is \
         required; amount defaults to a full page."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "ref": { "type": "string", "description": "Optional element ref whose scrollable ancestor to scroll" },
                "direction": { "type": "string", "enum": ["up", "down"] },
                "amount": {
                    "description": "'page' (default), 'to-top', 'to-bottom', or a pixel count",
                    "oneOf": [
                        { "type": "string", "enum": ["page", "to-top", "to-bottom"] },
                        { "type": "number" }
                    ]
                }
            },
            "required": ["direction"]
        })
    }

    async fn execute(&self, args: &Value, browser: &mut BrowserState) -> ToolResult {
        let input: ScrollInput =
            serde_json::from_value(args.clone()).map_err(|e| ToolError::InvalidParams(e.to_string()))?;
        let direction = parse_direction(&input.direction)?;
        let amount = parse_amount(input.amount.as_ref())?;

        let action_label = match &input.ref_ {
            Some(r) => format!("scroll {r} {}", input.direction),
            None => format!("scroll {}", input.direction),
        };

        let (channel, registry) = match acquire(browser).await {
            Ok(pair) => pair,
            Err(error) => {
                let result = ActionResult::failure(action_label, blank_page(), error, 0);
                return Ok(ToolOutput::text(serde_json::to_string(&result)?));
            }
        };

        let result = orchestrator::scroll(channel, registry, input.ref_.as_deref(), direction, amount).await;
        Ok(ToolOutput::text(serde_json::to_string(&result)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_metadata() {
        let tool = BrowserScrollTool::new();
        assert_eq!(tool.name(), "browser_scroll");
        assert_eq!(tool.input_schema()["required"][0], "direction");
    }

    #[test]
    fn direction_rejects_unknown_value() {
        assert!(parse_direction("sideways").is_err());
    }

    #[test]
    fn amount_defaults_to_page() {
        assert!(matches!(parse_amount(None).unwrap(), ScrollAmount::Page));
    }

    #[test]
    fn amount_parses_numeric_pixels() {
        let amount = parse_amount(Some(&serde_json::json!(250.0))).unwrap();
        assert!(matches!(amount, ScrollAmount::Pixels(n) if (n - 250.0).abs() < f64::EPSILON));
    }

    #[test]
    fn amount_rejects_unknown_string() {
        assert!(parse_amount(Some(&serde_json::json!("sideways"))).is_err());
    }
}
