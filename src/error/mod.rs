//! Error types for the MCP server.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `From` conversions.

use std::borrow::Cow;
use thiserror::Error;

/// Main error type for the Vertica MCP server.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{0}")]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Security(#[from] SecurityError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Tool(#[from] ToolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal { message: Cow<'static, str> },
}

/// JSON-RPC 2.0 and MCP protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Parse error: invalid JSON")]
    ParseError,

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(Cow<'static, str>),

    #[error("Internal error: {0}")]
    InternalError(Cow<'static, str>),
}

impl ProtocolError {
    /// Returns the JSON-RPC 2.0 error code.
    pub fn code(&self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::MethodNotFound(_) => -32601,
            Self::InvalidParams(_) => -32602,
            Self::InternalError(_) => -32603,
        }
    }
}

/// Database-related errors.
///
/// `ConnectionFailed` is raised only while opening a connection; every
/// other driver failure surfaces as `QueryFailed` with the driver's text.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),
}

/// SQL policy errors.
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("{0}")]
    PolicyViolation(Cow<'static, str>),
}

/// Configuration errors. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    MissingField(Cow<'static, str>),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    #[error("{0}")]
    InvalidConnectionString(Cow<'static, str>),
}

/// Tool execution errors.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    ExecutionFailed(String),
}

/// Result type alias for McpError.
pub type Result<T> = std::result::Result<T, McpError>;

/// Result type alias for DatabaseError.
pub type DbResult<T> = std::result::Result<T, DatabaseError>;

/// Result type alias for ProtocolError.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

/// Result type alias for SecurityError.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;

/// Result type alias for ConfigError.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_codes() {
        assert_eq!(ProtocolError::ParseError.code(), -32700);
        assert_eq!(ProtocolError::MethodNotFound("test".into()).code(), -32601);
        assert_eq!(ProtocolError::InvalidParams("test".into()).code(), -32602);
        assert_eq!(ProtocolError::InternalError("test".into()).code(), -32603);
    }

    #[test]
    fn test_error_conversion() {
        let db_error = DatabaseError::ConnectionFailed("refused".into());
        let mcp_error: McpError = db_error.into();
        assert!(matches!(mcp_error, McpError::Database(_)));
        assert_eq!(mcp_error.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_policy_violation_message_is_verbatim() {
        let err: McpError = SecurityError::PolicyViolation(
            "Only SELECT, DESCRIBE, and EXPLAIN statements are allowed".into(),
        )
        .into();
        assert_eq!(
            err.to_string(),
            "Only SELECT, DESCRIBE, and EXPLAIN statements are allowed"
        );
    }
}
