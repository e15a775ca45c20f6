//! Per-operation connection gateway.
//!
//! Every operation opens its own connection and releases it before the
//! result or error is handed back. Nothing is pooled or retried.

use crate::database::connection_string::ConnectionParameters;
use crate::database::result::RowSet;
use crate::database::traits::{Connection, DatabaseDriver};
use crate::error::{DatabaseError, DbResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error};

pub struct Gateway {
    params: ConnectionParameters,
    driver: Arc<dyn DatabaseDriver>,
}

impl Gateway {
    pub fn new(params: ConnectionParameters, driver: Arc<dyn DatabaseDriver>) -> Self {
        Self { params, driver }
    }

    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    /// Opens a fresh connection.
    pub async fn open_connection(&self) -> DbResult<Box<dyn Connection>> {
        match self.driver.connect(&self.params).await {
            Ok(connection) => {
                debug!("{} connection established to {}", self.driver.name(), self.params);
                Ok(connection)
            }
            Err(e) => {
                error!("Failed to connect to {}: {}", self.params, e);
                let (DatabaseError::ConnectionFailed(message) | DatabaseError::QueryFailed(message)) =
                    e;
                Err(DatabaseError::ConnectionFailed(message))
            }
        }
    }

    /// Runs one statement on a connection that lives only for this call.
    ///
    /// The connection is closed before the query outcome is inspected, so it
    /// is released on success and on error alike.
    pub async fn run(&self, sql: &str) -> DbResult<RowSet> {
        self.run_timed(sql).await.map(|(rows, _)| rows)
    }

    /// Same as [`run`](Self::run), also returning how long the query took.
    /// Connecting and closing are not part of the measured time.
    pub async fn run_timed(&self, sql: &str) -> DbResult<(RowSet, Duration)> {
        let mut connection = self.open_connection().await?;
        let started = Instant::now();
        let outcome = connection.query(sql).await;
        let elapsed = started.elapsed();
        connection.close().await;
        outcome.map(|rows| (rows, elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::mock::MockDriver;

    fn params() -> ConnectionParameters {
        ConnectionParameters {
            host: "localhost".into(),
            port: 5433,
            user: Some("dbadmin".into()),
            password: None,
            database: Some("analytics".into()),
        }
    }

    #[tokio::test]
    async fn test_run_closes_on_success() {
        let driver = MockDriver::returning(RowSet::new(vec!["one".into()], vec![]));
        let gateway = Gateway::new(params(), Arc::new(driver.clone()));

        let rows = gateway.run("SELECT 1").await.unwrap();
        assert_eq!(rows.columns, Some(vec!["one".to_string()]));
        assert_eq!(driver.opened(), 1);
        assert_eq!(driver.closed(), 1);
    }

    #[tokio::test]
    async fn test_run_closes_on_error() {
        let driver = MockDriver::failing("relation does not exist");
        let gateway = Gateway::new(params(), Arc::new(driver.clone()));

        let err = gateway.run("SELECT * FROM missing").await.unwrap_err();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
        assert_eq!(driver.opened(), 1);
        assert_eq!(driver.closed(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_is_connectivity_error() {
        let driver = MockDriver::unreachable("connection refused");
        let gateway = Gateway::new(params(), Arc::new(driver.clone()));

        let err = gateway.run("SELECT 1").await.unwrap_err();
        assert!(matches!(err, DatabaseError::ConnectionFailed(ref m) if m == "connection refused"));
        assert!(driver.queries().is_empty());
    }

    #[tokio::test]
    async fn test_run_timed_excludes_connect_and_close() {
        let driver = MockDriver::returning(RowSet::no_description())
            .with_latency(Duration::from_millis(150), Duration::from_millis(150));
        let gateway = Gateway::new(params(), Arc::new(driver.clone()));

        let started = Instant::now();
        let (_, elapsed) = gateway.run_timed("SELECT 1").await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(100), "{elapsed:?}");
        assert_eq!(driver.closed(), 1);
    }

    #[tokio::test]
    async fn test_each_run_opens_a_new_connection() {
        let driver = MockDriver::returning(RowSet::no_description());
        let gateway = Gateway::new(params(), Arc::new(driver.clone()));

        gateway.run("SELECT 1").await.unwrap();
        gateway.run("SELECT 2").await.unwrap();
        assert_eq!(driver.opened(), 2);
        assert_eq!(driver.closed(), 2);
    }
}
