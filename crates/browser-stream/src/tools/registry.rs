//! Tool registry for managing the fixed set of available tools

use std::collections::HashMap;
use std::sync::Arc;

use super::traits::Tool;

/// Registry of available MCP tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    #[must_use]
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    /// Register a tool
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// List all registered tools
    #[must_use]
    pub fn list(&self) -> Vec<&Arc<dyn Tool>> {
        self.tools.values().collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the seven browser tools with the registry.
pub fn register_all_tools(registry: &mut ToolRegistry) {
    registry.register(Arc::new(super::BrowserNavigateTool::new()));
    registry.register(Arc::new(super::BrowserSnapshotTool::new()));
    registry.register(Arc::new(super::BrowserClickTool::new()));
    registry.register(Arc::new(super::BrowserFillTool::new()));
    registry.register(Arc::new(super::BrowserPressKeyTool::new()));
    registry.register(Arc::new(super::BrowserScrollTool::new()));
    registry.register(Arc::new(super::BrowserWaitForTool::new()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::BrowserState;
    use crate::server::ToolOutput;
    use crate::tools::{ToolError, ToolResult};
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct MockTool {
        name: &'static str,
    }

    #[async_trait]
    impl Tool for MockTool {
        fn name(&self) -> &'static str {
            self.name
        }

        fn description(&self) -> &'static str {
            "Mock tool for testing"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(&self, _args: &Value, _browser: &mut BrowserState) -> ToolResult {
            Ok(ToolOutput::text("mock"))
        }
    }

    #[test]
    fn register_and_get_roundtrip() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(MockTool { name: "mock_tool" }));

        assert!(registry.get("mock_tool").is_some());
        assert!(registry.get("unknown").is_none());
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn register_all_tools_registers_the_seven_tool_surface() {
        let mut registry = ToolRegistry::new();
        register_all_tools(&mut registry);

        for name in [
            "browser_navigate",
            "browser_snapshot",
            "browser_click",
            "browser_fill",
            "browser_press_key",
            "browser_scroll",
            "browser_wait_for",
        ] {
            assert!(registry.get(name).is_some(), "missing tool {name}");
        }
        assert_eq!(registry.list().len(), 7);
    }
}
