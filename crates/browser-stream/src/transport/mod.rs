//! Transport layer for MCP communication.
//!
//! The only concrete delivery mechanism this crate ships is JSON-RPC
//! frames over stdio — how tool invocations physically reach this process
//! is infrastructure the spec treats as an external collaborator (§1); this
//! is the minimal glue needed to drive the core from a CLI process.

mod error;
mod stdio;

pub use error::TransportError;
pub use stdio::StdioTransport;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;
