//! Server configuration types

use crate::browser::BrowserConfig;

/// MCP Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server name reported to clients
    pub name: String,

    /// Server version
    pub version: String,

    /// Browser configuration
    pub browser: BrowserConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "browser-stream".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            browser: BrowserConfig::default(),
        }
    }
}
