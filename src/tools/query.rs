//! Query tools: execute_query, explain_query.

use crate::database::QueryExecutor;
use crate::error::Result;
use crate::protocol::{CallToolResult, Tool};
use crate::tools::registry::{ToolHandler, json_result, parse_arguments};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
pub struct ExecuteQueryArgs {
    pub sql: String,
    #[serde(default)]
    pub params: Vec<String>,
}

pub struct ExecuteQueryTool {
    executor: Arc<QueryExecutor>,
}

impl ExecuteQueryTool {
    pub fn new(executor: Arc<QueryExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ToolHandler for ExecuteQueryTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "execute_query".into(),
            description: Some(
                "Execute a SQL query against the Vertica database. \
                Only SELECT, DESCRIBE, and EXPLAIN statements are allowed for safety. \
                SELECT statements without a LIMIT clause are capped at the configured row limit."
                    .into(),
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "sql": {
                        "type": "string",
                        "description": "SQL query to execute (SELECT, DESCRIBE, or EXPLAIN only)"
                    },
                    "params": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Optional values for %s placeholders in the query"
                    }
                },
                "required": ["sql"]
            }),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "execute_query"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ExecuteQueryArgs = parse_arguments(arguments)?;

        debug!("Executing query with {} parameters", args.params.len());
        let outcome = self.executor.execute(&args.sql, &args.params).await?;

        Ok(json_result(&outcome))
    }
}

#[derive(Debug, Deserialize)]
pub struct ExplainQueryArgs {
    pub sql: String,
}

pub struct ExplainQueryTool {
    executor: Arc<QueryExecutor>,
}

impl ExplainQueryTool {
    pub fn new(executor: Arc<QueryExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ToolHandler for ExplainQueryTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "explain_query".into(),
            description: Some(
                "Get the execution plan for a SQL query to analyze performance".into(),
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "sql": {
                        "type": "string",
                        "description": "SQL query to explain"
                    }
                },
                "required": ["sql"]
            }),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "explain_query"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ExplainQueryArgs = parse_arguments(arguments)?;

        let plan = self.executor.explain(&args.sql).await?;
        Ok(json_result(&plan))
    }
}
