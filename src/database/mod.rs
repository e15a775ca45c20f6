//! Database access layer.
//!
//! Every operation runs on its own connection, opened and closed by the
//! [`Gateway`]. The [`SchemaInspector`] reads catalog metadata and the
//! [`QueryExecutor`] runs caller-supplied statements behind the SQL gate.

pub mod bind;
pub mod catalog;
pub mod connection_string;
pub mod executor;
pub mod gateway;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod result;
pub mod traits;
pub mod vertica;

pub use catalog::SchemaInspector;
pub use connection_string::{ConnectionParameters, ConnectionStringParser, DefaultCredentials};
pub use executor::QueryExecutor;
pub use gateway::Gateway;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockDriver;
pub use result::*;
pub use traits::{Connection, DatabaseDriver};
pub use vertica::VerticaDriver;
