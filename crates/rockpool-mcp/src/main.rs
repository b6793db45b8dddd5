//! Rockpool MCP Server
//!
//! This binary runs the rockpool sandboxed filesystem as an MCP server
//! over stdio. The allowed root directories are given as command-line
//! arguments; every tool call is confined to them.

use std::path::PathBuf;

use clap::Parser;
use rmcp::ServiceExt;
use rockpool::AllowedRoots;
use rockpool_mcp::RockpoolServer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Sandboxed filesystem MCP server.
#[derive(Debug, Parser)]
#[command(name = "rockpool-mcp", version, about)]
struct Args {
    /// Root directories file operations are allowed to touch.
    ///
    /// Each must be an existing directory; the server refuses to start
    /// otherwise.
    #[arg(required = true, value_name = "DIR")]
    allowed_dirs: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing - output to stderr so it doesn't interfere with MCP stdio
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();
    let roots = AllowedRoots::new(&args.allowed_dirs)
        .map_err(|e| anyhow::anyhow!("invalid allowed directory: {e}"))?;

    tracing::info!(
        roots = %args
            .allowed_dirs
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
        "Starting rockpool MCP server"
    );

    let server = RockpoolServer::new(roots);

    // Serve over stdio
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("Failed to start MCP service: {}", e);
        })?;

    // Wait for the service to complete
    service.waiting().await?;

    tracing::info!("rockpool MCP server shutting down");

    Ok(())
}
