//! Export tool: query results as JSON or CSV text.

use crate::database::{ExecutionOutcome, QueryExecutor, QueryResult};
use crate::error::{Result, ToolError};
use crate::protocol::{CallToolResult, Tool};
use crate::tools::registry::{ToolHandler, json_result, parse_arguments, text_result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Supported export formats.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

/// Quotes a field when it contains a comma or a double quote.
fn escape_csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Renders a result as CSV: header line, then one line per row, `\n` separated.
///
/// Null cells render as empty fields. Header names are written verbatim.
pub fn render_csv(result: &QueryResult) -> String {
    let mut lines = Vec::with_capacity(result.rows.len() + 1);
    lines.push(result.columns.join(","));

    for row in &result.rows {
        let fields: Vec<String> = row
            .iter()
            .map(|v| escape_csv_field(&v.to_text()))
            .collect();
        lines.push(fields.join(","));
    }

    lines.join("\n")
}

#[derive(Debug, Deserialize)]
pub struct ExportQueryArgs {
    pub sql: String,
    #[serde(default)]
    pub format: ExportFormat,
}

pub struct ExportQueryResultsTool {
    executor: Arc<QueryExecutor>,
}

impl ExportQueryResultsTool {
    pub fn new(executor: Arc<QueryExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ToolHandler for ExportQueryResultsTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "export_query_results".into(),
            description: Some("Export query results in various formats (JSON, CSV)".into()),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "sql": {
                        "type": "string",
                        "description": "SQL query to execute and export"
                    },
                    "format": {
                        "type": "string",
                        "enum": ["json", "csv"],
                        "description": "Export format",
                        "default": "json"
                    }
                },
                "required": ["sql"]
            }),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "export_query_results"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ExportQueryArgs = parse_arguments(arguments)?;

        let outcome = self.executor.execute(&args.sql, &[]).await?;
        debug!("Exporting as {:?}", args.format);

        match (args.format, outcome) {
            (ExportFormat::Json, outcome) => Ok(json_result(&outcome)),
            (ExportFormat::Csv, ExecutionOutcome::Rows(result)) => Ok(text_result(format!(
                "CSV Export ({} rows):\n\n{}",
                result.row_count,
                render_csv(&result)
            ))),
            (ExportFormat::Csv, ExecutionOutcome::Statement(_)) => Err(ToolError::ExecutionFailed(
                "Statement returned no result set to export as CSV".into(),
            )
            .into()),
        }
    }
}
