//! MCP server binary entry point.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};
use vertica_mcp::{
    cli::Cli,
    config::ServerConfig,
    protocol::McpServerBuilder,
    server::{McpHandler, ServerStateBuilder},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::from_env();
    init_tracing(cli.log_filter(config.as_ref().is_ok_and(|c| c.debug)));

    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e).context("Failed to load configuration");
        }
    };

    info!(
        database = %config.connection,
        query_limit = config.query_limit,
        max_rows_export = config.max_rows_export,
        allowed_tables = config.allow_lists.tables.len(),
        allowed_columns = config.allow_lists.columns.len(),
        "Configuration loaded"
    );

    let state = Arc::new(
        ServerStateBuilder::new()
            .config(config)
            .build()
            .map_err(|e| anyhow::anyhow!(e))?,
    );

    info!("Server state initialized with {} tools", state.tools.len());

    let handler = McpHandler::new(state);
    let server = McpServerBuilder::new()
        .handler(handler)
        .build()?;

    info!("MCP server ready, waiting for requests on stdin");

    server.run().await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // JSON to stderr; stdout carries the protocol.
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .json()
        .init();
}
