//! Scripted in-memory driver for tests.
//!
//! Answers each query through a responder closure and records every SQL
//! text it receives along with connection open/close counts.

use crate::database::connection_string::ConnectionParameters;
use crate::database::result::RowSet;
use crate::database::traits::{Connection, DatabaseDriver};
use crate::error::{DatabaseError, DbResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type Responder = dyn Fn(&str) -> DbResult<RowSet> + Send + Sync;

#[derive(Default)]
struct MockLog {
    queries: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// A driver whose connections answer from a closure.
#[derive(Clone)]
pub struct MockDriver {
    responder: Arc<Responder>,
    connect_error: Option<String>,
    connect_delay: Duration,
    close_delay: Duration,
    log: Arc<MockLog>,
}

impl MockDriver {
    /// Every query is answered by `responder`.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> DbResult<RowSet> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            connect_error: None,
            connect_delay: Duration::ZERO,
            close_delay: Duration::ZERO,
            log: Arc::new(MockLog::default()),
        }
    }

    /// Every query returns the same row set.
    pub fn returning(rows: RowSet) -> Self {
        Self::new(move |_| Ok(rows.clone()))
    }

    /// Every query fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| Err(DatabaseError::QueryFailed(message.clone())))
    }

    /// Connecting fails with `message`.
    pub fn unreachable(message: impl Into<String>) -> Self {
        let mut driver = Self::returning(RowSet::no_description());
        driver.connect_error = Some(message.into());
        driver
    }

    /// Connecting and closing each sleep for the given time.
    pub fn with_latency(mut self, connect: Duration, close: Duration) -> Self {
        self.connect_delay = connect;
        self.close_delay = close;
        self
    }

    /// SQL texts received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.log.queries.lock().clone()
    }

    pub fn last_query(&self) -> Option<String> {
        self.log.queries.lock().last().cloned()
    }

    pub fn opened(&self) -> usize {
        self.log.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.log.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseDriver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn connect(&self, _params: &ConnectionParameters) -> DbResult<Box<dyn Connection>> {
        tokio::time::sleep(self.connect_delay).await;
        if let Some(message) = &self.connect_error {
            return Err(DatabaseError::ConnectionFailed(message.clone()));
        }
        self.log.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            responder: Arc::clone(&self.responder),
            close_delay: self.close_delay,
            log: Arc::clone(&self.log),
        }))
    }
}

struct MockConnection {
    responder: Arc<Responder>,
    close_delay: Duration,
    log: Arc<MockLog>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn query(&mut self, sql: &str) -> DbResult<RowSet> {
        self.log.queries.lock().push(sql.to_string());
        (self.responder)(sql)
    }

    async fn close(self: Box<Self>) {
        tokio::time::sleep(self.close_delay).await;
        self.log.closed.fetch_add(1, Ordering::SeqCst);
    }
}
