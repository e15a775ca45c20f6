//! Tool registry for dynamic tool registration.

use crate::error::{Result, ToolError};
use crate::protocol::{CallToolParams, CallToolResult, Tool};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn definition(&self) -> Tool;
    async fn execute(&self, arguments: Value) -> Result<CallToolResult>;
}

pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
        }
    }

    pub fn register<T: ToolHandler + 'static>(&self, tool: T) {
        let definition = tool.definition();
        let name = definition.name.clone();
        debug!("Registering tool: {}", name);
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).map(|r| Arc::clone(&*r))
    }

    /// Tool definitions ordered by name.
    pub fn list(&self) -> Vec<Tool> {
        let mut tools: Vec<Tool> = self.tools.iter().map(|r| r.value().definition()).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub async fn execute(&self, params: CallToolParams) -> Result<CallToolResult> {
        let tool = self
            .get(&params.name)
            .ok_or_else(|| ToolError::NotFound(params.name.clone()))?;

        tool.execute(params.arguments).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Deserializes tool arguments, mapping failures to `InvalidArguments`.
///
/// Omitted arguments are treated as an empty object.
pub fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidArguments(e.to_string()).into())
}

pub fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::text(text)
}

pub fn json_result<T: serde::Serialize>(data: &T) -> CallToolResult {
    CallToolResult::json(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestTool;

    #[async_trait]
    impl ToolHandler for TestTool {
        fn definition(&self) -> Tool {
            Tool {
                name: "test_tool".into(),
                description: Some("A test tool".into()),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {}
                }),
            }
        }

        async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
            Ok(CallToolResult::text("test result"))
        }
    }

    #[test]
    fn test_registry() {
        let registry = ToolRegistry::new();
        registry.register(TestTool);

        assert_eq!(registry.len(), 1);
        assert!(registry.get("test_tool").is_some());
        assert!(registry.get("unknown").is_none());

        let tools = registry.list();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "test_tool");
    }

    #[tokio::test]
    async fn test_execute() {
        let registry = ToolRegistry::new();
        registry.register(TestTool);

        let params = CallToolParams {
            name: "test_tool".into(),
            arguments: serde_json::json!({}),
        };

        let result = registry.execute(params).await.unwrap();
        assert!(result.is_error.is_none());
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let registry = ToolRegistry::new();
        let params = CallToolParams {
            name: "drop_everything".into(),
            arguments: serde_json::json!({}),
        };

        let err = registry.execute(params).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: drop_everything");
    }

    #[test]
    fn test_parse_arguments_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Args {
            #[allow(dead_code)]
            sql: String,
        }

        let err = parse_arguments::<Args>(serde_json::json!({"sql": 5})).unwrap_err();
        assert!(err.to_string().starts_with("Invalid arguments:"));
    }
}
