//! Tool trait definition

use ::async_trait::async_trait;
use serde_json::Value;

use super::ToolError;
use crate::browser::BrowserState;
use crate::server::ToolOutput;

/// Result type for tool execution. Per the error-handling policy, failures
/// intrinsic to an action (stale ref, timeout, script error, ...) are not
/// represented here — they come back as an `Ok` output whose JSON envelope
/// has `ok: false`. `Err` is reserved for requests the server cannot even
/// attempt to service, such as malformed arguments.
pub type ToolResult = Result<ToolOutput, ToolError>;

/// Tool trait for MCP tool implementations
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &'static str;

    /// Get the tool description
    fn description(&self) -> &'static str;

    /// Get the JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Execute the tool with given arguments
    async fn execute(&self, args: &Value, browser: &mut BrowserState) -> ToolResult;
}
