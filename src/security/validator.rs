//! SQL safety gate.
//!
//! A flat keyword scan, not a parser: statements that do not open with a
//! read-only keyword are rejected when any write keyword appears anywhere
//! in the text, including inside literals, comments and identifiers.

use crate::error::{SecurityError, SecurityResult};
use tracing::{debug, warn};

/// Leading keywords that mark a statement as read-only.
const READ_ONLY_PREFIXES: &[&str] = &["SELECT", "WITH", "DESCRIBE", "DESC", "EXPLAIN"];

/// Keywords rejected anywhere in a statement without a read-only prefix.
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "TRUNCATE", "ALTER", "CREATE", "INSERT", "UPDATE",
];

pub const POLICY_VIOLATION_MESSAGE: &str =
    "Only SELECT, DESCRIBE, and EXPLAIN statements are allowed";

/// Default row limit appended to unbounded SELECT statements.
pub const DEFAULT_QUERY_LIMIT: u32 = 100;

/// Keyword gate and row-limit injector.
#[derive(Debug, Clone, Copy)]
pub struct SqlGate {
    limit: u32,
}

impl Default for SqlGate {
    fn default() -> Self {
        Self {
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl SqlGate {
    pub fn new(limit: u32) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    fn normalize(sql: &str) -> String {
        sql.trim().to_uppercase()
    }

    /// Rejects statements that fail the read-only policy.
    pub fn check(&self, sql: &str) -> SecurityResult<()> {
        let normalized = Self::normalize(sql);

        if READ_ONLY_PREFIXES.iter().any(|p| normalized.starts_with(*p)) {
            return Ok(());
        }

        if let Some(keyword) = FORBIDDEN_KEYWORDS.iter().find(|k| normalized.contains(**k)) {
            warn!("Rejected statement containing {}", keyword);
            return Err(SecurityError::PolicyViolation(POLICY_VIOLATION_MESSAGE.into()));
        }

        Ok(())
    }

    /// Appends `LIMIT n` to the original text of an unbounded SELECT.
    ///
    /// Statements that already mention `LIMIT` or start with `EXPLAIN` are
    /// returned unchanged.
    pub fn apply_row_limit(&self, sql: &str) -> String {
        let normalized = Self::normalize(sql);

        if normalized.contains("SELECT")
            && !normalized.contains("LIMIT")
            && !normalized.starts_with("EXPLAIN")
        {
            debug!("Appending LIMIT {}", self.limit);
            format!("{} LIMIT {}", sql, self.limit)
        } else {
            sql.to_string()
        }
    }
}
