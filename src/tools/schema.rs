//! Schema inspection tools: describe_table, list_tables, list_views, list_projections.

use crate::database::{
    ColumnDescriptor, ProjectionDescriptor, SchemaInspector, TableDescriptor, ViewDescriptor,
};
use crate::error::Result;
use crate::protocol::{CallToolResult, Tool};
use crate::tools::registry::{ToolHandler, json_result, parse_arguments};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// An empty schema name means no schema filter.
fn optional_schema<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let schema = Option::<String>::deserialize(deserializer)?;
    Ok(schema.filter(|s| !s.is_empty()))
}

#[derive(Debug, Deserialize)]
pub struct TableArgs {
    pub table_name: String,
    #[serde(default, deserialize_with = "optional_schema")]
    pub schema_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SchemaFilterArgs {
    #[serde(default, deserialize_with = "optional_schema")]
    pub schema_name: Option<String>,
}

fn schema_filter_schema(description: &str) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "schema_name": {
                "type": "string",
                "description": description
            }
        }
    })
}

#[derive(Debug, Serialize)]
struct DescribeTableOutput<'a> {
    table_name: &'a str,
    schema_name: Option<&'a str>,
    columns: Vec<ColumnDescriptor>,
    column_count: usize,
}

pub struct DescribeTableTool {
    inspector: Arc<SchemaInspector>,
}

impl DescribeTableTool {
    pub fn new(inspector: Arc<SchemaInspector>) -> Self {
        Self { inspector }
    }
}

#[async_trait]
impl ToolHandler for DescribeTableTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "describe_table".into(),
            description: Some(
                "Get detailed information about a table including columns, data types, and constraints"
                    .into(),
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "table_name": {
                        "type": "string",
                        "description": "Name of the table to describe"
                    },
                    "schema_name": {
                        "type": "string",
                        "description": "Schema name (optional)"
                    }
                },
                "required": ["table_name"]
            }),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "describe_table"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: TableArgs = parse_arguments(arguments)?;

        let columns = self
            .inspector
            .list_columns(&args.table_name, args.schema_name.as_deref())
            .await?;

        Ok(json_result(&DescribeTableOutput {
            table_name: &args.table_name,
            schema_name: args.schema_name.as_deref(),
            column_count: columns.len(),
            columns,
        }))
    }
}

#[derive(Debug, Serialize)]
struct ListTablesOutput {
    tables: Vec<TableDescriptor>,
}

pub struct ListTablesTool {
    inspector: Arc<SchemaInspector>,
}

impl ListTablesTool {
    pub fn new(inspector: Arc<SchemaInspector>) -> Self {
        Self { inspector }
    }
}

#[async_trait]
impl ToolHandler for ListTablesTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "list_tables".into(),
            description: Some("List all tables in the database with metadata".into()),
            input_schema: schema_filter_schema("Filter by schema name (optional)"),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "list_tables"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: SchemaFilterArgs = parse_arguments(arguments)?;
        let tables = self.inspector.list_tables(args.schema_name.as_deref()).await?;
        Ok(json_result(&ListTablesOutput { tables }))
    }
}

#[derive(Debug, Serialize)]
struct ListViewsOutput {
    views: Vec<ViewDescriptor>,
}

pub struct ListViewsTool {
    inspector: Arc<SchemaInspector>,
}

impl ListViewsTool {
    pub fn new(inspector: Arc<SchemaInspector>) -> Self {
        Self { inspector }
    }
}

#[async_trait]
impl ToolHandler for ListViewsTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "list_views".into(),
            description: Some("List all views in the database".into()),
            input_schema: schema_filter_schema("Filter by schema name (optional)"),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "list_views"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: SchemaFilterArgs = parse_arguments(arguments)?;
        let views = self.inspector.list_views(args.schema_name.as_deref()).await?;
        Ok(json_result(&ListViewsOutput { views }))
    }
}

#[derive(Debug, Serialize)]
struct ListProjectionsOutput {
    projections: Vec<ProjectionDescriptor>,
}

pub struct ListProjectionsTool {
    inspector: Arc<SchemaInspector>,
}

impl ListProjectionsTool {
    pub fn new(inspector: Arc<SchemaInspector>) -> Self {
        Self { inspector }
    }
}

#[async_trait]
impl ToolHandler for ListProjectionsTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "list_projections".into(),
            description: Some("List all projections in the database (Vertica-specific)".into()),
            input_schema: schema_filter_schema("Filter by schema name (optional)"),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "list_projections"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: SchemaFilterArgs = parse_arguments(arguments)?;
        let projections = self
            .inspector
            .list_projections(args.schema_name.as_deref())
            .await?;
        Ok(json_result(&ListProjectionsOutput { projections }))
    }
}
