//! Line-delimited transport for JSON-RPC messages.

use crate::error::{McpError, ProtocolError, Result};
use crate::protocol::types::{JsonRpcRequest, JsonRpcResponse, Message};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout,
};
use tokio::sync::Mutex;
use tracing::{debug, error, trace};

/// Transport trait for MCP communication.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn read_message(&self) -> Result<Option<Message>>;
    async fn write_response(&self, response: &JsonRpcResponse) -> Result<()>;
}

/// One JSON message per line over any async reader/writer pair.
pub struct LineTransport<R, W> {
    reader: Mutex<R>,
    writer: Mutex<W>,
}

/// Transport over the process's stdin and stdout.
pub type StdioTransport = LineTransport<BufReader<Stdin>, Stdout>;

impl StdioTransport {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        }
    }

    /// Reads the next non-blank line. `None` at end of input.
    async fn read_line(&self) -> Result<Option<String>> {
        let mut reader = self.reader.lock().await;
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    trace!("Received line: {}", trimmed);
                    return Ok(Some(trimmed.to_string()));
                }
                Err(e) => {
                    error!("Error reading input: {}", e);
                    return Err(McpError::Io(e));
                }
            }
        }
    }

    async fn write_line(&self, content: &str) -> Result<()> {
        let mut writer = self.writer.lock().await;
        trace!("Sending line: {}", content);
        writer.write_all(content.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn read_message(&self) -> Result<Option<Message>> {
        let Some(line) = self.read_line().await? else {
            return Ok(None);
        };

        // Try to parse as request first, then as response
        match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(request) => {
                debug!("Received request: method={}", request.method);
                Ok(Some(Message::Request(request)))
            }
            Err(_) => match serde_json::from_str::<JsonRpcResponse>(&line) {
                Ok(response) => {
                    debug!("Received response: id={:?}", response.id);
                    Ok(Some(Message::Response(response)))
                }
                Err(e) => {
                    error!("Failed to parse message: {}", e);
                    Err(McpError::Protocol(ProtocolError::ParseError))
                }
            },
        }
    }

    async fn write_response(&self, response: &JsonRpcResponse) -> Result<()> {
        let json = serde_json::to_string(response)?;
        debug!("Sending response: id={:?}", response.id);
        self.write_line(&json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::RequestId;

    fn transport(input: &str) -> LineTransport<&[u8], Vec<u8>> {
        LineTransport::new(input.as_bytes(), Vec::new())
    }

    #[test]
    fn test_request_parsing() {
        let json = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
        let request: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.method, "initialize");
        assert_eq!(request.id, Some(RequestId::Number(1)));
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped() {
        let t = transport("\n   \n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n");

        match t.read_message().await.unwrap() {
            Some(Message::Request(request)) => assert_eq!(request.method, "ping"),
            other => panic!("expected request, got {other:?}"),
        }
        assert!(t.read_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_line_is_parse_error() {
        let t = transport("{not json\n");
        assert!(matches!(
            t.read_message().await,
            Err(McpError::Protocol(ProtocolError::ParseError))
        ));
    }

    #[tokio::test]
    async fn test_response_written_as_one_line() {
        let t = transport("");
        let response = JsonRpcResponse::success(Some(1.into()), serde_json::json!({}));
        t.write_response(&response).await.unwrap();

        let written = t.writer.into_inner();
        let text = String::from_utf8(written).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);
    }
}
