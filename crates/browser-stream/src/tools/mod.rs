//! Tool framework for MCP: the seven browser tools and the registry/trait
//! scaffolding that exposes them.

mod browser_click;
mod browser_fill;
mod browser_navigate;
mod browser_press_key;
mod browser_scroll;
mod browser_snapshot;
mod browser_wait_for;

mod error;
mod registry;
mod traits;
mod util;

pub use browser_click::BrowserClickTool;
pub use browser_fill::BrowserFillTool;
pub use browser_navigate::BrowserNavigateTool;
pub use browser_press_key::BrowserPressKeyTool;
pub use browser_scroll::BrowserScrollTool;
pub use browser_snapshot::BrowserSnapshotTool;
pub use browser_wait_for::BrowserWaitForTool;

pub use error::ToolError;
pub use registry::{ToolRegistry, register_all_tools};
pub use traits::{Tool, ToolResult};

pub use crate::server::{ContentItem, ToolOutput};

/// Result type for tool operations
pub type Result<T> = std::result::Result<T, ToolError>;
