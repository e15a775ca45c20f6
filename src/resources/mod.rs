//! MCP resources: schema overview and per-table metadata.

use crate::database::result::iso8601;
use crate::database::{
    ColumnDescriptor, ProjectionDescriptor, SchemaInspector, TableDescriptor, ViewDescriptor,
};
use crate::error::{ProtocolError, Result};
use crate::protocol::{Resource, ResourceContent};
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, instrument};

pub const OVERVIEW_URI: &str = "vertica://schema/overview";
pub const TABLE_URI_PREFIX: &str = "vertica://table/";

/// Maximum number of table resources advertised by `list`.
const MAX_LISTED_TABLES: usize = 50;

const JSON_MIME: &str = "application/json";

#[derive(Debug, Serialize)]
struct SchemaOverview {
    database_type: &'static str,
    tables: Vec<TableDescriptor>,
    views: Vec<ViewDescriptor>,
    projections: Vec<ProjectionDescriptor>,
    table_count: usize,
    view_count: usize,
    projection_count: usize,
    generated_at: String,
}

#[derive(Debug, Serialize)]
struct TableResource<'a> {
    schema_name: Option<&'a str>,
    table_name: &'a str,
    columns: Vec<ColumnDescriptor>,
    column_count: usize,
    generated_at: String,
}

fn generated_at() -> String {
    iso8601(&Local::now().naive_local())
}

/// Splits `schema.table` on the first dot; a bare name has no schema.
fn split_table_path(path: &str) -> (Option<&str>, &str) {
    match path.split_once('.') {
        Some((schema, table)) => (Some(schema), table),
        None => (None, path),
    }
}

pub struct ResourceCatalog {
    inspector: Arc<SchemaInspector>,
}

impl ResourceCatalog {
    pub fn new(inspector: Arc<SchemaInspector>) -> Self {
        Self { inspector }
    }

    /// The overview resource plus one resource per table, capped at 50 tables.
    ///
    /// A catalog failure is logged and only the overview is returned.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Vec<Resource> {
        let mut resources = vec![Resource {
            uri: OVERVIEW_URI.into(),
            name: "Database Schema Overview".into(),
            description: Some(
                "Complete overview of database tables, views, and projections".into(),
            ),
            mime_type: Some(JSON_MIME.into()),
        }];

        match self.inspector.list_tables(None).await {
            Ok(tables) => {
                resources.extend(tables.iter().take(MAX_LISTED_TABLES).map(|t| Resource {
                    uri: format!("{}{}.{}", TABLE_URI_PREFIX, t.schema_name, t.table_name),
                    name: format!("Table: {}.{}", t.schema_name, t.table_name),
                    description: Some(format!("Schema and metadata for table {}", t.table_name)),
                    mime_type: Some(JSON_MIME.into()),
                }));
            }
            Err(e) => error!("Error listing resources: {}", e),
        }

        debug!("Listing {} resources", resources.len());
        resources
    }

    /// Reads the resource at `uri`.
    #[instrument(skip(self))]
    pub async fn read(&self, uri: &str) -> Result<ResourceContent> {
        if uri == OVERVIEW_URI {
            return self.overview(uri).await;
        }

        if let Some(path) = uri.strip_prefix(TABLE_URI_PREFIX) {
            let (schema, table) = split_table_path(path);
            if !table.is_empty() {
                return self.table(uri, schema, table).await;
            }
        }

        Err(ProtocolError::InvalidParams(format!("Unknown resource URI: {}", uri).into()).into())
    }

    async fn overview(&self, uri: &str) -> Result<ResourceContent> {
        let tables = self.inspector.list_tables(None).await?;
        let views = self.inspector.list_views(None).await?;
        let projections = self.inspector.list_projections(None).await?;

        let overview = SchemaOverview {
            database_type: "Vertica",
            table_count: tables.len(),
            view_count: views.len(),
            projection_count: projections.len(),
            tables,
            views,
            projections,
            generated_at: generated_at(),
        };

        Ok(ResourceContent::json(uri, &overview))
    }

    async fn table(&self, uri: &str, schema: Option<&str>, table: &str) -> Result<ResourceContent> {
        let columns = self.inspector.list_columns(table, schema).await?;

        Ok(ResourceContent::json(
            uri,
            &TableResource {
                schema_name: schema,
                table_name: table,
                column_count: columns.len(),
                columns,
                generated_at: generated_at(),
            },
        ))
    }
}
