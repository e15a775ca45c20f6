//! SQL safety gate.

pub mod validator;

pub use validator::{DEFAULT_QUERY_LIMIT, POLICY_VIOLATION_MESSAGE, SqlGate};
