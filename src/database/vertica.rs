//! Vertica driver.
//!
//! Vertica's client protocol is framed like PostgreSQL v3, but result
//! columns carry Vertica's own type codes. Messages are encoded and parsed
//! with `postgres-protocol`; cells are typed from those codes. Only the
//! simple-query flow is used.

use crate::database::connection_string::{ConnectionParameters, DEFAULT_USER};
use crate::database::result::{CellValue, Row, RowSet};
use crate::database::traits::{Connection, DatabaseDriver};
use crate::error::{DatabaseError, DbResult};
use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use chrono::{DateTime, NaiveDateTime};
use fallible_iterator::FallibleIterator;
use postgres_protocol::authentication::md5_hash;
use postgres_protocol::message::backend::{
    DataRowBody, ErrorResponseBody, Message, RowDescriptionBody,
};
use postgres_protocol::message::frontend;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, instrument, warn};

/// Protocol 3.0, as sent in the startup packet.
const PROTOCOL_VERSION: i32 = 196_608;

/// Vertica column type codes reported in row descriptions.
pub mod type_code {
    pub const BOOL: u32 = 5;
    pub const INT8: u32 = 6;
    pub const FLOAT8: u32 = 7;
    pub const VARCHAR: u32 = 9;
    pub const DATE: u32 = 10;
    pub const TIMESTAMP: u32 = 12;
    pub const TIMESTAMPTZ: u32 = 13;
    pub const NUMERIC: u32 = 16;
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIMESTAMPTZ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%#z";

/// Builds a typed cell from the text form of a value.
///
/// Booleans, integers, floats and timestamps are typed. Everything else,
/// including NUMERIC and DATE, stays text. Text that does not parse as its
/// declared type is kept as text.
pub fn decode_cell(type_code: u32, text: &str) -> CellValue {
    let typed = match type_code {
        type_code::BOOL => match text {
            "t" | "true" | "1" => Some(CellValue::Bool(true)),
            "f" | "false" | "0" => Some(CellValue::Bool(false)),
            _ => None,
        },
        type_code::INT8 => text.parse().ok().map(CellValue::Int),
        type_code::FLOAT8 => text.parse().ok().map(CellValue::Float),
        type_code::TIMESTAMP => NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
            .ok()
            .map(CellValue::Timestamp),
        type_code::TIMESTAMPTZ => DateTime::parse_from_str(text, TIMESTAMPTZ_FORMAT)
            .ok()
            .map(CellValue::TimestampTz),
        _ => None,
    };

    typed.unwrap_or_else(|| CellValue::String(text.to_string()))
}

#[derive(Debug, Error)]
enum WireError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Server(String),

    #[error("Unexpected message during {0}")]
    Unexpected(&'static str),

    #[error("Server closed the connection")]
    Closed,
}

/// Renders an error response as `SEVERITY: message`.
fn server_message(body: &ErrorResponseBody) -> io::Result<String> {
    let mut severity = None;
    let mut message = None;
    let mut fields = body.fields();
    while let Some(field) = fields.next()? {
        match field.type_() {
            b'S' => severity = Some(field.value().to_string()),
            b'M' => message = Some(field.value().to_string()),
            _ => {}
        }
    }

    let message = message.unwrap_or_else(|| "unknown server error".into());
    Ok(match severity {
        Some(severity) => format!("{}: {}", severity, message),
        None => message,
    })
}

fn startup_message(params: &ConnectionParameters, buf: &mut BytesMut) {
    let mut body = BytesMut::new();
    body.put_i32(PROTOCOL_VERSION);
    let user = params.user.as_deref().unwrap_or(DEFAULT_USER);
    let mut pairs = vec![("user", user), ("client_label", env!("CARGO_PKG_NAME"))];
    if let Some(database) = &params.database {
        pairs.push(("database", database.as_str()));
    }
    for (key, value) in pairs {
        body.put_slice(key.as_bytes());
        body.put_u8(0);
        body.put_slice(value.as_bytes());
        body.put_u8(0);
    }
    body.put_u8(0);

    buf.put_i32(body.len() as i32 + 4);
    buf.put_slice(&body);
}

/// Vertica database driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct VerticaDriver;

impl VerticaDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatabaseDriver for VerticaDriver {
    fn name(&self) -> &'static str {
        "vertica"
    }

    #[instrument(skip(self, params), fields(db = "vertica", host = %params.host))]
    async fn connect(&self, params: &ConnectionParameters) -> DbResult<Box<dyn Connection>> {
        let stream = TcpStream::connect((params.host.as_str(), params.port))
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let mut connection = VerticaConnection {
            stream,
            buf: BytesMut::with_capacity(8 * 1024),
        };
        connection
            .startup(params)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        Ok(Box::new(connection))
    }
}

/// A single Vertica session.
pub struct VerticaConnection {
    stream: TcpStream,
    buf: BytesMut,
}

impl VerticaConnection {
    async fn send(&mut self, message: &[u8]) -> io::Result<()> {
        self.stream.write_all(message).await?;
        self.stream.flush().await
    }

    async fn receive(&mut self) -> Result<Message, WireError> {
        loop {
            if let Some(message) = Message::parse(&mut self.buf)? {
                return Ok(message);
            }
            if self.stream.read_buf(&mut self.buf).await? == 0 {
                return Err(WireError::Closed);
            }
        }
    }

    async fn startup(&mut self, params: &ConnectionParameters) -> Result<(), WireError> {
        let user = params.user.as_deref().unwrap_or(DEFAULT_USER);
        let password = params.password.as_deref().unwrap_or_default();

        let mut buf = BytesMut::new();
        startup_message(params, &mut buf);
        self.send(&buf).await?;

        loop {
            match self.receive().await? {
                Message::AuthenticationOk => debug!("Authenticated as {}", user),
                Message::AuthenticationCleartextPassword => {
                    buf.clear();
                    frontend::password_message(password.as_bytes(), &mut buf)?;
                    self.send(&buf).await?;
                }
                Message::AuthenticationMd5Password(body) => {
                    let hash = md5_hash(user.as_bytes(), password.as_bytes(), body.salt());
                    buf.clear();
                    frontend::password_message(hash.as_bytes(), &mut buf)?;
                    self.send(&buf).await?;
                }
                Message::ErrorResponse(body) => {
                    return Err(WireError::Server(server_message(&body)?));
                }
                Message::ReadyForQuery(_) => return Ok(()),
                Message::ParameterStatus(_)
                | Message::BackendKeyData(_)
                | Message::NoticeResponse(_) => {}
                _ => return Err(WireError::Unexpected("startup")),
            }
        }
    }

    async fn simple_query(&mut self, sql: &str) -> Result<RowSet, WireError> {
        let mut buf = BytesMut::new();
        frontend::query(sql, &mut buf)?;
        self.send(&buf).await?;

        let mut collector = ResultCollector::default();
        let mut failure = None;

        // Read through ReadyForQuery even after an error so the session stays in sync.
        loop {
            match self.receive().await? {
                Message::RowDescription(body) => collector.describe(&body)?,
                Message::DataRow(body) => collector.push(&body)?,
                Message::CommandComplete(_) | Message::EmptyQueryResponse => collector.complete(),
                Message::ErrorResponse(body) => {
                    if failure.is_none() {
                        failure = Some(server_message(&body)?);
                    }
                }
                Message::ReadyForQuery(_) => break,
                _ => {}
            }
        }

        match failure {
            Some(message) => Err(WireError::Server(message)),
            None => Ok(collector.finish()),
        }
    }
}

/// Accumulates the first result set of a simple-query response.
#[derive(Debug, Default)]
struct ResultCollector {
    columns: Option<Vec<String>>,
    types: Vec<u32>,
    rows: Vec<Row>,
    done: bool,
}

impl ResultCollector {
    fn describe(&mut self, body: &RowDescriptionBody) -> io::Result<()> {
        if self.done || self.columns.is_some() {
            return Ok(());
        }
        let fields = body
            .fields()
            .map(|f| Ok((f.name().to_string(), f.type_oid())))
            .collect::<Vec<(String, u32)>>()?;
        let (columns, types) = fields.into_iter().unzip();
        self.columns = Some(columns);
        self.types = types;
        Ok(())
    }

    fn push(&mut self, body: &DataRowBody) -> io::Result<()> {
        if self.done {
            return Ok(());
        }
        let buffer = body.buffer();
        let mut ranges = body.ranges();
        let mut row = Vec::with_capacity(self.types.len());
        while let Some(range) = ranges.next()? {
            let cell = match range {
                None => CellValue::Null,
                Some(range) => {
                    let type_code = self.types.get(row.len()).copied().unwrap_or_default();
                    decode_cell(type_code, &String::from_utf8_lossy(&buffer[range]))
                }
            };
            row.push(cell);
        }
        self.rows.push(row);
        Ok(())
    }

    fn complete(&mut self) {
        self.done = self.columns.is_some();
    }

    fn finish(self) -> RowSet {
        RowSet {
            columns: self.columns,
            rows: self.rows,
        }
    }
}

#[async_trait]
impl Connection for VerticaConnection {
    async fn query(&mut self, sql: &str) -> DbResult<RowSet> {
        debug!("Executing query: {}", sql);

        self.simple_query(sql)
            .await
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }

    async fn close(mut self: Box<Self>) {
        let mut buf = BytesMut::new();
        frontend::terminate(&mut buf);
        if let Err(e) = self.send(&buf).await {
            warn!("Failed to send terminate to Vertica: {}", e);
        }
        if let Err(e) = self.stream.shutdown().await {
            debug!("Vertica socket shutdown failed: {}", e);
        }
        debug!("Vertica connection closed");
    }
}
