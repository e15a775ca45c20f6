//! Sample query generation from a table's column types.

use crate::database::{ColumnDescriptor, SchemaInspector};
use crate::error::Result;
use crate::protocol::{CallToolResult, Tool};
use crate::tools::registry::{ToolHandler, json_result, parse_arguments};
use crate::tools::schema::TableArgs;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// Number of leading columns that get column-specific queries.
const SAMPLED_COLUMNS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeFamily {
    Text,
    Numeric,
    Temporal,
    Other,
}

impl TypeFamily {
    /// Classifies a Vertica type name such as `varchar(80)` or `numeric(10,2)`.
    fn of(data_type: &str) -> Self {
        let upper = data_type.trim().to_ascii_uppercase();
        let base = upper.split('(').next().unwrap_or_default().trim();

        match base {
            "CHAR" | "VARCHAR" | "LONG VARCHAR" => Self::Text,
            "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" | "INT8" | "NUMERIC"
            | "DECIMAL" | "NUMBER" | "MONEY" | "FLOAT" | "FLOAT8" | "REAL"
            | "DOUBLE PRECISION" => Self::Numeric,
            "DATE" | "TIME" | "TIMETZ" | "TIMESTAMP" | "TIMESTAMPTZ" | "DATETIME"
            | "SMALLDATETIME" | "TIME WITH TIME ZONE" | "TIMESTAMP WITH TIME ZONE" => {
                Self::Temporal
            }
            _ => Self::Other,
        }
    }
}

/// Builds exploration queries for `table`, qualified by `schema` when given.
pub fn sample_queries(
    table: &str,
    schema: Option<&str>,
    columns: &[ColumnDescriptor],
) -> Vec<String> {
    let table_ref = match schema {
        Some(schema) => format!("{}.{}", schema, table),
        None => table.to_string(),
    };

    let mut queries = vec![
        format!("-- Basic select all\nSELECT * FROM {} LIMIT 10;", table_ref),
        format!("-- Count total rows\nSELECT COUNT(*) FROM {};", table_ref),
    ];

    for column in columns.iter().take(SAMPLED_COLUMNS) {
        let name = &column.column_name;
        let query = match TypeFamily::of(&column.data_type) {
            TypeFamily::Text => format!(
                "-- Find distinct values for {name}\n\
                 SELECT DISTINCT {name} FROM {table_ref} WHERE {name} IS NOT NULL LIMIT 20;"
            ),
            TypeFamily::Numeric => format!(
                "-- Statistics for {name}\n\
                 SELECT MIN({name}), MAX({name}), AVG({name}) FROM {table_ref};"
            ),
            TypeFamily::Temporal => format!(
                "-- Date range for {name}\nSELECT MIN({name}), MAX({name}) FROM {table_ref};"
            ),
            TypeFamily::Other => continue,
        };
        queries.push(query);
    }

    queries
}

#[derive(Debug, Serialize)]
struct SampleQueriesOutput<'a> {
    table_name: &'a str,
    sample_queries: Vec<String>,
}

pub struct GenerateSampleQueriesTool {
    inspector: Arc<SchemaInspector>,
}

impl GenerateSampleQueriesTool {
    pub fn new(inspector: Arc<SchemaInspector>) -> Self {
        Self { inspector }
    }
}

#[async_trait]
impl ToolHandler for GenerateSampleQueriesTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "generate_sample_queries".into(),
            description: Some(
                "Generate sample SQL queries for a given table to help with exploration".into(),
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "table_name": {
                        "type": "string",
                        "description": "Name of the table to generate queries for"
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

    #[instrument(skip(self, arguments), fields(tool = "generate_sample_queries"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: TableArgs = parse_arguments(arguments)?;
        let schema = args.schema_name.as_deref();

        let columns = self.inspector.list_columns(&args.table_name, schema).await?;

        Ok(json_result(&SampleQueriesOutput {
            table_name: &args.table_name,
            sample_queries: sample_queries(&args.table_name, schema, &columns),
        }))
    }
}
