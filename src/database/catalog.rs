//! Schema inspection over Vertica's `v_catalog` and `v_monitor` tables.

use crate::config::AllowLists;
use crate::database::bind::{quote_list, quote_literal};
use crate::database::gateway::Gateway;
use crate::database::result::{
    CellValue, ColumnDescriptor, ProjectionDescriptor, Row, TableDescriptor, TableType,
    ViewDescriptor,
};
use crate::error::DbResult;
use std::sync::Arc;
use tracing::{debug, instrument};

const TABLES_QUERY: &str = r#"
SELECT
    t.table_schema,
    t.table_name,
    CASE
        WHEN t.is_temp_table THEN 'TEMPORARY TABLE'
        WHEN t.is_flextable THEN 'FLEX TABLE'
        ELSE 'TABLE'
    END AS table_type,
    t.is_temp_table,
    t.is_system_table,
    COALESCE(ps.row_count, 0) AS estimated_row_count
FROM v_catalog.tables t
LEFT JOIN (
    SELECT anchor_table_schema, anchor_table_name, MAX(projection_rows) AS row_count
    FROM (
        SELECT anchor_table_schema, anchor_table_name, projection_name,
               SUM(row_count) AS projection_rows
        FROM v_monitor.projection_storage
        GROUP BY anchor_table_schema, anchor_table_name, projection_name
    ) per_projection
    GROUP BY anchor_table_schema, anchor_table_name
) ps ON ps.anchor_table_schema = t.table_schema
    AND ps.anchor_table_name = t.table_name
WHERE NOT t.is_system_table"#;

const COLUMNS_QUERY: &str = r#"
SELECT
    c.column_name,
    c.data_type,
    c.data_type_id,
    c.data_type_length,
    c.numeric_precision,
    c.numeric_scale,
    c.is_nullable,
    c.column_default,
    c.column_set_using,
    c.ordinal_position
FROM v_catalog.columns c
WHERE c.table_name = "#;

const VIEWS_QUERY: &str = r#"
SELECT
    v.table_schema,
    v.table_name,
    v.is_system_view
FROM v_catalog.views v
WHERE NOT v.is_system_view"#;

const PROJECTIONS_QUERY: &str = r#"
SELECT
    p.projection_schema,
    p.projection_name,
    p.anchor_table_name,
    p.is_super_projection,
    p.is_up_to_date,
    p.has_statistics,
    p.created_epoch,
    p.verified_fault_tolerance
FROM v_catalog.projections p
WHERE p.owner_name != 'release'
  AND p.projection_schema NOT IN ('v_catalog', 'v_monitor', 'v_internal')"#;

/// Reads catalog metadata through the gateway, one connection per call.
pub struct SchemaInspector {
    gateway: Arc<Gateway>,
    allow_lists: AllowLists,
}

impl SchemaInspector {
    pub fn new(gateway: Arc<Gateway>, allow_lists: AllowLists) -> Self {
        Self {
            gateway,
            allow_lists,
        }
    }

    pub(crate) fn tables_sql(&self, schema: Option<&str>) -> String {
        let mut sql = TABLES_QUERY.to_string();
        if let Some(schema) = schema {
            sql.push_str(&format!("\n  AND t.table_schema = {}", quote_literal(schema)));
        }
        if !self.allow_lists.tables.is_empty() {
            sql.push_str(&format!(
                "\n  AND t.table_name IN ({})",
                quote_list(&self.allow_lists.tables)
            ));
        }
        sql.push_str("\nORDER BY t.table_schema, t.table_name");
        sql
    }

    pub(crate) fn columns_sql(table: &str, schema: Option<&str>) -> String {
        let mut sql = format!("{}{}", COLUMNS_QUERY, quote_literal(table));
        if let Some(schema) = schema {
            sql.push_str(&format!("\n  AND c.table_schema = {}", quote_literal(schema)));
        }
        sql.push_str("\nORDER BY c.ordinal_position");
        sql
    }

    pub(crate) fn views_sql(schema: Option<&str>) -> String {
        let mut sql = VIEWS_QUERY.to_string();
        if let Some(schema) = schema {
            sql.push_str(&format!("\n  AND v.table_schema = {}", quote_literal(schema)));
        }
        sql.push_str("\nORDER BY v.table_schema, v.table_name");
        sql
    }

    pub(crate) fn projections_sql(schema: Option<&str>) -> String {
        let mut sql = PROJECTIONS_QUERY.to_string();
        if let Some(schema) = schema {
            sql.push_str(&format!(
                "\n  AND p.projection_schema = {}",
                quote_literal(schema)
            ));
        }
        sql.push_str("\nORDER BY p.projection_schema, p.projection_name");
        sql
    }

    /// Lists user tables, optionally restricted to one schema.
    #[instrument(skip(self))]
    pub async fn list_tables(&self, schema: Option<&str>) -> DbResult<Vec<TableDescriptor>> {
        let rows = self.gateway.run(&self.tables_sql(schema)).await?.rows;

        let tables: Vec<TableDescriptor> = rows
            .iter()
            .map(|row| TableDescriptor {
                schema_name: text(row, 0),
                table_name: text(row, 1),
                table_type: TableType::parse(&text(row, 2)),
                is_temporary: flag(row, 3),
                is_system_table: flag(row, 4),
                estimated_row_count: int(row, 5).unwrap_or(0),
            })
            .filter(|t| self.allow_lists.allows_table(&t.table_name))
            .collect();

        debug!("Found {} tables", tables.len());
        Ok(tables)
    }

    /// Lists the columns of a table in ordinal order.
    ///
    /// The column allow-list is keyed `table.column` and applied after
    /// retrieval, so ordinal order among allowed columns is preserved.
    #[instrument(skip(self))]
    pub async fn list_columns(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        let rows = self.gateway.run(&Self::columns_sql(table, schema)).await?.rows;

        let mut columns: Vec<ColumnDescriptor> = rows
            .iter()
            .map(|row| ColumnDescriptor {
                column_name: text(row, 0),
                data_type: text(row, 1),
                data_type_id: int(row, 2),
                data_type_length: int(row, 3),
                numeric_precision: int(row, 4),
                numeric_scale: int(row, 5),
                is_nullable: flag(row, 6),
                column_default: opt_text(row, 7),
                column_set_expression: opt_text(row, 8),
                ordinal_position: int(row, 9).unwrap_or(0),
            })
            .filter(|c| self.allow_lists.allows_column(table, &c.column_name))
            .collect();
        columns.sort_by_key(|c| c.ordinal_position);

        debug!("Found {} columns for {}", columns.len(), table);
        Ok(columns)
    }

    /// Lists user views.
    #[instrument(skip(self))]
    pub async fn list_views(&self, schema: Option<&str>) -> DbResult<Vec<ViewDescriptor>> {
        let rows = self.gateway.run(&Self::views_sql(schema)).await?.rows;

        Ok(rows
            .iter()
            .map(|row| ViewDescriptor {
                schema_name: text(row, 0),
                view_name: text(row, 1),
                is_system_view: flag(row, 2),
            })
            .collect())
    }

    /// Lists projections outside the reserved system schemas.
    #[instrument(skip(self))]
    pub async fn list_projections(
        &self,
        schema: Option<&str>,
    ) -> DbResult<Vec<ProjectionDescriptor>> {
        let rows = self.gateway.run(&Self::projections_sql(schema)).await?.rows;

        Ok(rows
            .iter()
            .map(|row| ProjectionDescriptor {
                schema_name: text(row, 0),
                projection_name: text(row, 1),
                anchor_table_name: text(row, 2),
                is_super_projection: flag(row, 3),
                is_up_to_date: flag(row, 4),
                has_statistics: flag(row, 5),
                created_epoch: int(row, 6),
                // K-safety level; any positive level counts as fault tolerant.
                is_fault_tolerant: cell(row, 7)
                    .and_then(|v| v.as_i64().or_else(|| v.as_bool().map(i64::from)))
                    .is_some_and(|k| k > 0),
            })
            .collect())
    }
}

fn cell(row: &Row, index: usize) -> Option<&CellValue> {
    row.get(index).filter(|v| !v.is_null())
}

fn text(row: &Row, index: usize) -> String {
    cell(row, index).map(CellValue::to_text).unwrap_or_default()
}

fn opt_text(row: &Row, index: usize) -> Option<String> {
    cell(row, index).map(CellValue::to_text)
}

fn int(row: &Row, index: usize) -> Option<i64> {
    cell(row, index).and_then(CellValue::as_i64)
}

fn flag(row: &Row, index: usize) -> bool {
    cell(row, index).and_then(CellValue::as_bool).unwrap_or(false)
}
