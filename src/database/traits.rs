//! Database driver traits.

use crate::database::connection_string::ConnectionParameters;
use crate::database::result::RowSet;
use crate::error::DbResult;
use async_trait::async_trait;

/// Async database driver trait.
///
/// Implementations: [`VerticaDriver`](crate::database::VerticaDriver),
/// `MockDriver` (tests).
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Returns the driver name (e.g., "vertica").
    fn name(&self) -> &'static str;

    /// Opens a fresh connection. Connections are never pooled or shared.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::ConnectionFailed`](crate::error::DatabaseError::ConnectionFailed)
    /// when the server cannot be reached or rejects the credentials.
    async fn connect(&self, params: &ConnectionParameters) -> DbResult<Box<dyn Connection>>;
}

/// A live connection owned by exactly one operation.
#[async_trait]
pub trait Connection: Send {
    /// Executes SQL text as-is and materializes the whole result.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::QueryFailed`](crate::error::DatabaseError::QueryFailed)
    /// carrying the driver's message.
    async fn query(&mut self, sql: &str) -> DbResult<RowSet>;

    /// Closes the connection. Failures while closing are logged, not returned.
    async fn close(self: Box<Self>);
}
