//! MCP tool definitions and registry.

pub mod export;
pub mod query;
pub mod registry;
pub mod samples;
pub mod schema;

pub use export::{ExportFormat, ExportQueryResultsTool, render_csv};
pub use query::{ExecuteQueryTool, ExplainQueryTool};
pub use registry::{ToolHandler, ToolRegistry, json_result, parse_arguments, text_result};
pub use samples::{GenerateSampleQueriesTool, sample_queries};
pub use schema::{DescribeTableTool, ListProjectionsTool, ListTablesTool, ListViewsTool};

use crate::database::{QueryExecutor, SchemaInspector};
use std::sync::Arc;

/// Create and register all tools.
pub fn create_registry(inspector: Arc<SchemaInspector>, executor: Arc<QueryExecutor>) -> ToolRegistry {
    let registry = ToolRegistry::new();

    // Query tools
    registry.register(ExecuteQueryTool::new(Arc::clone(&executor)));
    registry.register(ExplainQueryTool::new(Arc::clone(&executor)));
    registry.register(ExportQueryResultsTool::new(executor));

    // Schema tools
    registry.register(DescribeTableTool::new(Arc::clone(&inspector)));
    registry.register(ListTablesTool::new(Arc::clone(&inspector)));
    registry.register(ListViewsTool::new(Arc::clone(&inspector)));
    registry.register(ListProjectionsTool::new(Arc::clone(&inspector)));
    registry.register(GenerateSampleQueriesTool::new(inspector));

    registry
}
