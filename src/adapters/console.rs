//! Console transport - line-delimited JSON over stdin/stdout.
//!
//! Each input line is one `InboundMessage`; each reply is written as one
//! `OutboundReply` line. Blank lines are ignored.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::Mutex;

use crate::ports::{InboundMessage, OutboundReply, Transport, TransportError};

/// [`Transport`] reading JSON lines from `R` and writing JSON lines to `W`.
pub struct ConsoleTransport<R, W> {
    lines: Mutex<Lines<BufReader<R>>>,
    writer: Mutex<W>,
}

impl ConsoleTransport<tokio::io::Stdin, tokio::io::Stdout> {
    /// Transport over the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> ConsoleTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: Mutex::new(BufReader::new(reader).lines()),
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the transport, returning the writer.
    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<R, W> Transport for ConsoleTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn receive(&self) -> Result<Option<InboundMessage>, TransportError> {
        let mut lines = self.lines.lock().await;
        loop {
            match lines.next_line().await? {
                None => return Ok(None),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    return serde_json::from_str(&line)
                        .map(Some)
                        .map_err(|e| TransportError::Malformed(e.to_string()));
                }
            }
        }
    }

    async fn send(&self, reply: &OutboundReply) -> Result<(), TransportError> {
        let mut line =
            serde_json::to_string(reply).map_err(|e| TransportError::Malformed(e.to_string()))?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}
