//! browser-stream CLI
//!
//! Starts the MCP server over stdio, driving either a freshly launched
//! Chromium instance or one reachable at `--cdp-url`.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use browser_stream::browser::BrowserConfig;
use browser_stream::transport::StdioTransport;
use browser_stream::{McpServer, ServerConfig};

/// MCP server for driving a real Chromium instance through a small set of
/// high-level browser actions.
#[derive(Parser, Debug)]
#[command(name = "browser-stream")]
#[command(version)]
#[command(about = "MCP server for browser automation")]
struct Args {
    /// Attach to an existing browser via its CDP websocket URL instead of
    /// launching a new Chromium instance.
    #[arg(long, value_name = "URL")]
    cdp_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout is reserved for JSON-RPC frames; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "fatal error");
        std::process::exit(1);
    }

    Ok(())
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let browser_config = BrowserConfig {
        cdp_endpoint: args.cdp_url,
        ..BrowserConfig::default()
    };

    let server_config = ServerConfig {
        browser: browser_config,
        ..ServerConfig::default()
    };

    let server = McpServer::new(server_config);
    let browser_state = server.browser_state().clone();
    let transport = StdioTransport::new(server);

    tokio::select! {
        result = transport.run() => result.map_err(anyhow::Error::from)?,
        () = shutdown_signal() => {
            tracing::info!("shutdown signal received");
            browser_state.write().await.shutdown().await;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
