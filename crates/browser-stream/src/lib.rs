//! # browser-stream
//!
//! An automation server that lets an external agent drive a real Chromium
//! instance through a small set of high-level actions (navigate, click,
//! fill, press-key, scroll, wait-for, snapshot). Every mutating action
//! returns not just success/failure but a structured description of what
//! changed on the page as a consequence — appeared/disappeared/changed
//! interactive elements, network requests, DOM churn, layout shift.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use browser_stream::{McpServer, ServerConfig};
//! use browser_stream::transport::StdioTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), browser_stream::transport::TransportError> {
//!     let server = McpServer::new(ServerConfig::default());
//!     let transport = StdioTransport::new(server);
//!     transport.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`cdp`]: Request/response plus event-subscription facade over one CDP target
//! - [`registry`]: The session-scoped `@e`-ref to node-identity map
//! - [`resolver`]: The three-tier ref → backend-node-id resolution ladder
//! - [`snapshot`]: Accessibility-tree capture (with DOM fallback) and the compact-line model
//! - [`differ`]: Pre/post snapshot matching into a semantic consequence list
//! - [`stability`]: The DOM-mutation/network-inflight debounce that decides when a page settled
//! - [`interactable`]: Resolves a ref to a clickable viewport coordinate
//! - [`orchestrator`]: The pre/act/settle/post/diff pipeline behind every tool call
//! - [`result`]: The stable `ActionResult`/`SnapshotResult` wire envelopes
//! - [`browser`]: Browser launch/attach and the session's `CdpChannel` + ref registry
//! - [`server`]: MCP JSON-RPC protocol handling and tool dispatch
//! - [`tools`]: The seven MCP tool definitions
//! - [`transport`]: Stdio delivery of JSON-RPC frames
//!
//! ## Non-goals
//!
//! This crate does not manage multiple pages or frames, does not
//! manipulate cookies or storage, does not expose raw DOM queries, and is
//! not a screenshot/PDF engine. It performs no authoring-level retries
//! beyond its stability wait.

pub mod browser;
pub mod cdp;
pub mod differ;
pub mod interactable;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod result;
pub mod server;
pub mod snapshot;
pub mod stability;
pub mod tools;
pub mod transport;

pub use server::{McpServer, ServerConfig};
