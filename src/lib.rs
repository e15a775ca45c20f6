//! MCP server for read-only Vertica schema exploration and querying.
//!
//! Exposes catalog inspection, gated query execution, plan retrieval and
//! CSV/JSON export as MCP tools, plus schema resources, over JSON-RPC on
//! stdio. Every operation opens its own database connection.
//!
//! # Example
//!
//! ```no_run
//! use vertica_mcp::{
//!     config::ServerConfig,
//!     protocol::McpServerBuilder,
//!     server::{McpHandler, ServerStateBuilder},
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!
//!     let state = Arc::new(
//!         ServerStateBuilder::new()
//!             .config(config)
//!             .build()
//!             .map_err(|e| anyhow::anyhow!(e))?,
//!     );
//!
//!     let server = McpServerBuilder::new()
//!         .handler(McpHandler::new(state))
//!         .build()?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod protocol;
pub mod resources;
pub mod security;
pub mod server;
pub mod tools;

pub use config::{AllowLists, ServerConfig};
pub use database::{
    ConnectionParameters, ConnectionStringParser, DatabaseDriver, Gateway, QueryExecutor,
    SchemaInspector, VerticaDriver,
};
pub use error::{McpError, Result};
pub use protocol::{McpServer, McpServerBuilder};
pub use security::SqlGate;
pub use server::{McpHandler, ServerState, ServerStateBuilder};
