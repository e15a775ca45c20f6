//! Request handler and method dispatcher.

use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::types::*;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// Handler trait for processing MCP requests.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle initialize request.
    async fn initialize(&self, params: InitializeParams) -> ProtocolResult<InitializeResult>;

    /// Handle initialized notification.
    async fn initialized(&self) -> ProtocolResult<()>;

    /// Handle shutdown request.
    async fn shutdown(&self) -> ProtocolResult<()>;

    /// List available tools.
    async fn list_tools(&self) -> ProtocolResult<ListToolsResult>;

    /// Call a tool.
    async fn call_tool(&self, params: CallToolParams) -> ProtocolResult<CallToolResult>;

    /// List available resources.
    async fn list_resources(&self) -> ProtocolResult<ListResourcesResult>;

    /// Read a resource by URI.
    async fn read_resource(&self, params: ReadResourceParams)
    -> ProtocolResult<ReadResourceResult>;

    /// Handle ping request.
    async fn ping(&self) -> ProtocolResult<Value> {
        Ok(serde_json::json!({}))
    }
}

/// Method dispatcher that routes requests to appropriate handlers.
pub struct Dispatcher<H: Handler> {
    handler: Arc<H>,
}

impl<H: Handler> Dispatcher<H> {
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Dispatch a request to the appropriate handler method.
    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Dispatching request: {}", request.method);

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params).await,
            "initialized" | "notifications/initialized" => self.handle_initialized().await,
            "shutdown" => self.handle_shutdown().await,
            "ping" => self.handle_ping().await,
            "tools/list" => self.handle_list_tools().await,
            "tools/call" => self.handle_call_tool(request.params).await,
            "resources/list" => self.handle_list_resources().await,
            "resources/read" => self.handle_read_resource(request.params).await,
            method => {
                warn!("Unknown method: {}", method);
                Err(ProtocolError::MethodNotFound(method.to_string()))
            }
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => {
                error!("Request failed: {}", e);
                JsonRpcResponse::error(request.id, JsonRpcError::new(e.code(), e.to_string()))
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> ProtocolResult<Value> {
        let result = self.handler.initialize(required_params(params)?).await?;
        to_value(result)
    }

    async fn handle_initialized(&self) -> ProtocolResult<Value> {
        self.handler.initialized().await?;
        Ok(Value::Null)
    }

    async fn handle_shutdown(&self) -> ProtocolResult<Value> {
        self.handler.shutdown().await?;
        Ok(Value::Null)
    }

    async fn handle_ping(&self) -> ProtocolResult<Value> {
        self.handler.ping().await
    }

    async fn handle_list_tools(&self) -> ProtocolResult<Value> {
        to_value(self.handler.list_tools().await?)
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> ProtocolResult<Value> {
        let result = self.handler.call_tool(required_params(params)?).await?;
        to_value(result)
    }

    async fn handle_list_resources(&self) -> ProtocolResult<Value> {
        to_value(self.handler.list_resources().await?)
    }

    async fn handle_read_resource(&self, params: Option<Value>) -> ProtocolResult<Value> {
        let result = self.handler.read_resource(required_params(params)?).await?;
        to_value(result)
    }
}

fn required_params<T: DeserializeOwned>(params: Option<Value>) -> ProtocolResult<T> {
    params
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| ProtocolError::InvalidParams(e.to_string().into()))?
        .ok_or_else(|| ProtocolError::InvalidParams("Missing params".into()))
}

fn to_value<T: Serialize>(result: T) -> ProtocolResult<Value> {
    serde_json::to_value(result).map_err(|e| ProtocolError::InternalError(e.to_string().into()))
}
