//! MCP request handler implementation.

use crate::error::{McpError, ProtocolError, ProtocolResult};
use crate::protocol::{
    CallToolParams, CallToolResult, Handler, InitializeParams, InitializeResult,
    ListResourcesResult, ListToolsResult, MCP_VERSION, ReadResourceParams, ReadResourceResult,
    ResourcesCapability, ServerCapabilities, ServerInfo, ToolsCapability,
};
use crate::server::state::ServerState;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

/// MCP request handler that processes protocol messages.
pub struct McpHandler {
    state: Arc<ServerState>,
}

impl McpHandler {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }
}

#[async_trait]
impl Handler for McpHandler {
    async fn initialize(&self, params: InitializeParams) -> ProtocolResult<InitializeResult> {
        match &params.client_info {
            Some(client) => info!("Initialize request from {} v{}", client.name, client.version),
            None => info!("Initialize request from unnamed client"),
        }
        debug!("Client capabilities: {}", params.capabilities);

        self.state.set_initialized(params.client_info);

        let capabilities = ServerCapabilities {
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
            resources: Some(ResourcesCapability {
                subscribe: Some(false),
                list_changed: Some(false),
            }),
        };

        let instructions = format!(
            "Vertica MCP server for {}. Statements other than SELECT, DESCRIBE and EXPLAIN \
            are rejected, and SELECT statements without a LIMIT return at most {} rows. \
            Use list_tables, describe_table and the vertica://schema/overview resource \
            to explore the schema before querying.",
            self.state.config.connection, self.state.config.query_limit
        );

        Ok(InitializeResult {
            protocol_version: MCP_VERSION.into(),
            capabilities,
            server_info: ServerInfo {
                name: self.state.config.name.to_string(),
                version: self.state.config.version.to_string(),
            },
            instructions: Some(instructions),
        })
    }

    async fn initialized(&self) -> ProtocolResult<()> {
        info!("Server initialized successfully");
        Ok(())
    }

    async fn shutdown(&self) -> ProtocolResult<()> {
        info!("Shutdown request received");
        Ok(())
    }

    async fn list_tools(&self) -> ProtocolResult<ListToolsResult> {
        let tools = self.state.tools.list();
        debug!("Listing {} tools", tools.len());

        Ok(ListToolsResult {
            tools,
            next_cursor: None,
        })
    }

    async fn call_tool(&self, params: CallToolParams) -> ProtocolResult<CallToolResult> {
        debug!("Tool call: {}", params.name);
        let name = params.name.clone();

        match self.state.tools.execute(params).await {
            Ok(result) => Ok(result),
            Err(e) => {
                error!("Error calling tool {}: {}", name, e);
                Ok(CallToolResult::error(format!("Error: {}", e)))
            }
        }
    }

    async fn list_resources(&self) -> ProtocolResult<ListResourcesResult> {
        Ok(ListResourcesResult {
            resources: self.state.resources.list().await,
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        params: ReadResourceParams,
    ) -> ProtocolResult<ReadResourceResult> {
        match self.state.resources.read(&params.uri).await {
            Ok(content) => Ok(ReadResourceResult {
                contents: vec![content],
            }),
            Err(McpError::Protocol(e)) => Err(e),
            Err(e) => {
                error!("Error reading resource {}: {}", params.uri, e);
                Err(ProtocolError::InternalError(e.to_string().into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::database::{ConnectionParameters, MockDriver, RowSet};
    use crate::protocol::ToolContent;
    use crate::server::state::ServerStateBuilder;

    fn handler(driver: MockDriver) -> McpHandler {
        let config = ServerConfig::builder(ConnectionParameters {
            host: "localhost".into(),
            port: 5433,
            user: Some("dbadmin".into()),
            password: None,
            database: Some("analytics".into()),
        })
        .build();
        let state = ServerStateBuilder::new()
            .config(config)
            .driver(Arc::new(driver))
            .build()
            .unwrap();
        McpHandler::new(Arc::new(state))
    }

    #[tokio::test]
    async fn test_initialize_advertises_tools_and_resources() {
        let handler = handler(MockDriver::returning(RowSet::default()));
        let params: InitializeParams = serde_json::from_value(serde_json::json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "client", "version": "1.0"}
        }))
        .unwrap();

        let result = handler.initialize(params).await.unwrap();
        assert!(result.capabilities.tools.is_some());
        assert!(result.capabilities.resources.is_some());
        assert_eq!(result.server_info.name, "vertica-mcp");
        assert!(handler.state().is_initialized());
        assert_eq!(handler.state().client_info().unwrap().name, "client");
    }

    #[tokio::test]
    async fn test_tool_errors_become_error_results() {
        let handler = handler(MockDriver::returning(RowSet::default()));

        let result = handler
            .call_tool(CallToolParams {
                name: "execute_query".into(),
                arguments: serde_json::json!({"sql": "DROP TABLE t"}),
            })
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        let ToolContent::Text { text } = &result.content[0];
        assert_eq!(
            text,
            "Error: Only SELECT, DESCRIBE, and EXPLAIN statements are allowed"
        );
    }

    #[tokio::test]
    async fn test_connectivity_error_text() {
        let handler = handler(MockDriver::unreachable("connection refused"));

        let result = handler
            .call_tool(CallToolParams {
                name: "list_tables".into(),
                arguments: serde_json::json!({}),
            })
            .await
            .unwrap();

        let ToolContent::Text { text } = &result.content[0];
        assert_eq!(text, "Error: Connection failed: connection refused");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_result() {
        let handler = handler(MockDriver::returning(RowSet::default()));

        let result = handler
            .call_tool(CallToolParams {
                name: "nope".into(),
                arguments: serde_json::json!({}),
            })
            .await
            .unwrap();

        let ToolContent::Text { text } = &result.content[0];
        assert_eq!(text, "Error: Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_read_resource_failures() {
        let handler = handler(MockDriver::failing("permission denied"));

        let unknown = handler
            .read_resource(ReadResourceParams {
                uri: "file:///etc/passwd".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(unknown.code(), -32602);

        let failed = handler
            .read_resource(ReadResourceParams {
                uri: "vertica://schema/overview".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(failed.code(), -32603);
    }
}
