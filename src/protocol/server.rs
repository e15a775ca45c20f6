//! Stdio server loop.

use crate::error::{McpError, ProtocolError, Result};
use crate::protocol::handler::{Dispatcher, Handler};
use crate::protocol::transport::{StdioTransport, Transport};
use crate::protocol::types::*;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// MCP Server.
///
/// Reads one message at a time and answers it before reading the next.
/// Capabilities are advertised by the handler's `initialize`.
pub struct McpServer<H: Handler> {
    info: ServerInfo,
    handler: Arc<H>,
}

impl<H: Handler> McpServer<H> {
    pub fn new(handler: H, info: ServerInfo) -> Self {
        Self {
            info,
            handler: Arc::new(handler),
        }
    }

    /// Run the server with stdio transport.
    #[instrument(skip(self), fields(server = %self.info.name))]
    pub async fn run(self) -> Result<()> {
        let transport = Arc::new(StdioTransport::stdio());
        self.run_with_transport(transport).await
    }

    /// Run the server until EOF or a `shutdown` request.
    pub async fn run_with_transport<T: Transport + 'static>(self, transport: Arc<T>) -> Result<()> {
        info!(
            "Starting MCP server: {} v{}",
            self.info.name, self.info.version
        );

        let dispatcher = Dispatcher::new(Arc::clone(&self.handler));

        loop {
            let message = match transport.read_message().await {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    debug!("EOF received, shutting down");
                    break;
                }
                Err(McpError::Protocol(ProtocolError::ParseError)) => {
                    let response = JsonRpcResponse::error(None, JsonRpcError::parse_error());
                    if let Err(e) = transport.write_response(&response).await {
                        error!("Failed to send error response: {}", e);
                    }
                    continue;
                }
                Err(e) => {
                    error!("Transport error: {}", e);
                    break;
                }
            };

            match message {
                Message::Request(request) => {
                    let is_notification = request.is_notification();
                    let is_shutdown = request.method == "shutdown";

                    let response = dispatcher.dispatch(request).await;

                    // Notifications get no response.
                    if !is_notification && let Err(e) = transport.write_response(&response).await {
                        error!("Failed to send response: {}", e);
                    }

                    if is_shutdown {
                        info!("Shutdown request received");
                        break;
                    }
                }
                Message::Response(response) => {
                    warn!("Unexpected response received: {:?}", response.id);
                }
            }
        }

        info!("Server stopped");
        Ok(())
    }
}

/// Builder for MCP Server.
pub struct McpServerBuilder<H: Handler> {
    handler: Option<H>,
}

impl<H: Handler> McpServerBuilder<H> {
    pub fn new() -> Self {
        Self { handler: None }
    }

    pub fn handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn build(self) -> Result<McpServer<H>> {
        let handler = self.handler.ok_or_else(|| McpError::Internal {
            message: "Handler is required".into(),
        })?;

        Ok(McpServer::new(
            handler,
            ServerInfo {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
        ))
    }
}

impl<H: Handler> Default for McpServerBuilder<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::handler::Handler;
    use crate::protocol::transport::LineTransport;
    use async_trait::async_trait;

    struct TestHandler;

    #[async_trait]
    impl Handler for TestHandler {
        async fn initialize(
            &self,
            _params: InitializeParams,
        ) -> crate::error::ProtocolResult<InitializeResult> {
            Ok(InitializeResult {
                protocol_version: MCP_VERSION.into(),
                capabilities: ServerCapabilities::default(),
                server_info: ServerInfo {
                    name: "test".into(),
                    version: "1.0".into(),
                },
                instructions: None,
            })
        }

        async fn initialized(&self) -> crate::error::ProtocolResult<()> {
            Ok(())
        }

        async fn shutdown(&self) -> crate::error::ProtocolResult<()> {
            Ok(())
        }

        async fn list_tools(&self) -> crate::error::ProtocolResult<ListToolsResult> {
            Ok(ListToolsResult {
                tools: vec![],
                next_cursor: None,
            })
        }

        async fn call_tool(
            &self,
            _params: CallToolParams,
        ) -> crate::error::ProtocolResult<CallToolResult> {
            Ok(CallToolResult::text("test"))
        }

        async fn list_resources(&self) -> crate::error::ProtocolResult<ListResourcesResult> {
            Ok(ListResourcesResult {
                resources: vec![],
                next_cursor: None,
            })
        }

        async fn read_resource(
            &self,
            params: ReadResourceParams,
        ) -> crate::error::ProtocolResult<ReadResourceResult> {
            Ok(ReadResourceResult {
                contents: vec![ResourceContent::json(params.uri, &serde_json::json!({}))],
            })
        }
    }

    #[test]
    fn test_builder_requires_handler() {
        assert!(McpServerBuilder::<TestHandler>::new().build().is_err());
    }

    async fn run_lines(input: &'static str) -> Vec<serde_json::Value> {
        let (client, server_io) = tokio::io::duplex(64 * 1024);
        let (_, server_writer) = tokio::io::split(server_io);
        let transport = Arc::new(LineTransport::new(input.as_bytes(), server_writer));

        let server = McpServerBuilder::new()
            .handler(TestHandler)
            .build()
            .unwrap();
        server.run_with_transport(transport).await.unwrap();

        let mut output = String::new();
        let mut client = client;
        tokio::io::AsyncReadExt::read_to_string(&mut client, &mut output)
            .await
            .unwrap();
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_server_loop_responses() {
        let responses = run_lines(concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
            "\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "this is not json\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"nope\"}\n",
        ))
        .await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["error"]["code"], -32700);
        assert_eq!(responses[2]["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_server_stops_after_shutdown() {
        let responses = run_lines(concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"shutdown\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n",
        ))
        .await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 1);
    }
}
