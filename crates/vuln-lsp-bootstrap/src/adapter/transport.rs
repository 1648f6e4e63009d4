//! Stdio transport layer with LSP header framing.
//!
//! LSP uses a simple framing protocol over stdio:
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <payload>
//! ```

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::process::{ChildStdin, ChildStdout};

use super::error::TransportError;

/// Largest payload accepted from a backend.
pub const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// Transport bound to a spawned backend's stdio.
pub type StdioTransport = FramedTransport<BufReader<ChildStdout>, BufWriter<ChildStdin>>;

/// Reads and writes LSP-framed messages over a byte stream pair.
pub struct FramedTransport<R, W> {
    reader: R,
    writer: W,
}

impl StdioTransport {
    /// Creates a transport from process handles.
    #[must_use]
    pub fn from_child(stdout: ChildStdout, stdin: ChildStdin) -> Self {
        Self::new(BufReader::new(stdout), BufWriter::new(stdin))
    }
}

impl<R: BufRead, W: Write> FramedTransport<R, W> {
    /// Wraps an existing reader and writer.
    #[must_use]
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Sends an LSP-framed message.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Io` if writing fails.
    pub fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        let header = format!("Content-Length: {}\r\n\r\n", message.len());
        self.writer.write_all(header.as_bytes())?;
        self.writer.write_all(message)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Receives one framed payload, blocking until it is complete.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::MissingContentLength` if no Content-Length
    /// header is found, `TransportError::MessageTooLarge` if the declared
    /// length exceeds [`MAX_MESSAGE_BYTES`] and `TransportError::Io` if
    /// reading fails.
    pub fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        let content_length = self.read_headers()?;
        if content_length > MAX_MESSAGE_BYTES {
            return Err(TransportError::MessageTooLarge {
                length: content_length,
                limit: MAX_MESSAGE_BYTES,
            });
        }
        let mut content = vec![0u8; content_length];
        self.reader.read_exact(&mut content)?;
        Ok(content)
    }

    /// Consumes the transport, returning the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn read_headers(&mut self) -> Result<usize, TransportError> {
        let mut content_length: Option<usize> = None;

        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(TransportError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed while reading headers",
                )));
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }

            if let Some(value) = trimmed.strip_prefix("Content-Length:") {
                content_length = Some(
                    value
                        .trim()
                        .parse()
                        .map_err(|_| TransportError::InvalidHeader)?,
                );
            }
            // Other headers such as Content-Type are ignored.
        }

        content_length.ok_or(TransportError::MissingContentLength)
    }
}
