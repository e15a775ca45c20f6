//! Query result types and catalog descriptors.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};

/// Cell value that can hold the scalar types returned by Vertica.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Timestamp(#[serde(serialize_with = "serialize_iso8601")] NaiveDateTime),
    TimestampTz(#[serde(serialize_with = "serialize_iso8601_offset")] DateTime<FixedOffset>),
}

/// Formats a timestamp as ISO-8601, with microseconds only when non-zero.
pub fn iso8601(value: &NaiveDateTime) -> String {
    if value.nanosecond() == 0 {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// ISO-8601 with a `+HH:MM` offset suffix.
pub fn iso8601_offset(value: &DateTime<FixedOffset>) -> String {
    format!("{}{}", iso8601(&value.naive_local()), value.format("%:z"))
}

fn serialize_iso8601_offset<S: Serializer>(
    value: &DateTime<FixedOffset>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&iso8601_offset(value))
}

fn serialize_iso8601<S: Serializer>(
    value: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&iso8601(value))
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view of the cell. Text cells from the simple-query protocol are parsed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Bool(b) => Some(i64::from(*b)),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean view of the cell. Accepts Vertica's `t`/`f` text form.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(n) => Some(*n != 0),
            Self::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "t" | "true" | "y" | "yes" | "1" => Some(true),
                "f" | "false" | "n" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Text used by CSV export. Null renders as an empty string.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
            Self::Timestamp(ts) => iso8601(ts),
            Self::TimestampTz(ts) => iso8601_offset(ts),
        }
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

impl From<DateTime<FixedOffset>> for CellValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::TimestampTz(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// A row as an ordered list of scalars, positionally aligned with the column names.
pub type Row = Vec<CellValue>;

/// Raw driver output for one statement.
///
/// `columns` is `None` when the server sent no row description, which is
/// how non-row-returning statements are recognised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Option<Vec<String>>,
    pub rows: Vec<Row>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns: Some(columns),
            rows,
        }
    }

    pub fn no_description() -> Self {
        Self::default()
    }
}

/// Result of a row-returning statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub row_count: usize,
    pub execution_time_seconds: f64,
    pub query: String,
}

impl QueryResult {
    pub fn new(
        columns: Vec<String>,
        rows: Vec<Row>,
        execution_time_seconds: f64,
        query: impl Into<String>,
    ) -> Self {
        Self {
            row_count: rows.len(),
            columns,
            rows,
            execution_time_seconds,
            query: query.into(),
        }
    }
}

/// Result of a statement that returned no row description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementSummary {
    pub message: String,
    pub execution_time_seconds: f64,
    pub query: String,
}

/// Either a result set or a bare success summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExecutionOutcome {
    Rows(QueryResult),
    Statement(StatementSummary),
}

impl ExecutionOutcome {
    pub fn query(&self) -> &str {
        match self {
            Self::Rows(result) => &result.query,
            Self::Statement(summary) => &summary.query,
        }
    }

    pub fn as_rows(&self) -> Option<&QueryResult> {
        match self {
            Self::Rows(result) => Some(result),
            Self::Statement(_) => None,
        }
    }
}

/// One line of an `EXPLAIN` plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanLine {
    pub plan_line: String,
}

/// Output of `EXPLAIN`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionPlan {
    pub execution_plan: Vec<PlanLine>,
}

/// Table type as reported by `v_catalog.tables`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableType {
    #[serde(rename = "TABLE")]
    Table,
    #[serde(rename = "TEMPORARY TABLE")]
    TemporaryTable,
    #[serde(rename = "FLEX TABLE")]
    FlexTable,
}

impl TableType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "TEMPORARY TABLE" => Self::TemporaryTable,
            "FLEX TABLE" => Self::FlexTable,
            _ => Self::Table,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDescriptor {
    pub schema_name: String,
    pub table_name: String,
    pub table_type: TableType,
    #[serde(rename = "is_temp_table")]
    pub is_temporary: bool,
    pub is_system_table: bool,
    pub estimated_row_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub column_name: String,
    pub data_type: String,
    pub data_type_id: Option<i64>,
    pub data_type_length: Option<i64>,
    pub numeric_precision: Option<i64>,
    pub numeric_scale: Option<i64>,
    pub is_nullable: bool,
    pub column_default: Option<String>,
    #[serde(rename = "column_set_using")]
    pub column_set_expression: Option<String>,
    pub ordinal_position: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewDescriptor {
    pub schema_name: String,
    pub view_name: String,
    pub is_system_view: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionDescriptor {
    pub schema_name: String,
    pub projection_name: String,
    pub anchor_table_name: String,
    pub is_super_projection: bool,
    pub is_up_to_date: bool,
    pub has_statistics: bool,
    pub created_epoch: Option<i64>,
    #[serde(rename = "verified_fault_tolerance")]
    pub is_fault_tolerant: bool,
}
