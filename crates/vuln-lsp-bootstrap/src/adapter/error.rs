//! Failures of the process transport.

use std::io;
use std::str::Utf8Error;
use std::time::Duration;

use thiserror::Error;

use super::jsonrpc::JsonRpcError;

/// Why a backend process could not be started or driven.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The executable is not on `PATH` and is not a valid path.
    #[error("backend executable '{command}' was not found")]
    BinaryNotFound {
        /// Executable named by the launch specification.
        command: String,
        /// OS error reported by the spawn.
        #[source]
        source: io::Error,
    },

    /// The OS refused to start the process or a helper thread.
    #[error("could not start backend: {message}")]
    SpawnFailed {
        /// What was being started.
        message: String,
        /// OS error reported by the spawn.
        #[source]
        source: io::Error,
    },

    /// Reading or writing a frame failed.
    #[error("backend stdio failed: {0}")]
    Transport(#[from] TransportError),

    /// A payload was not valid JSON-RPC.
    #[error("malformed JSON-RPC payload: {0}")]
    Codec(#[from] serde_json::Error),

    /// Backend output did not match the declared encoding.
    #[error("backend output is not valid {encoding}: {source}")]
    Encoding {
        /// Label of the expected encoding.
        encoding: &'static str,
        /// Decoder error.
        #[source]
        source: Utf8Error,
    },

    /// The backend answered a request with a JSON-RPC error object.
    #[error("backend rejected the request: {message} (code {code})")]
    ServerError {
        /// JSON-RPC error code.
        code: i64,
        /// Message supplied by the backend.
        message: String,
    },

    /// The `initialize` exchange produced an unusable answer.
    #[error("initialize exchange failed: {message}")]
    InitializationFailed {
        /// What was wrong with the answer.
        message: String,
    },

    /// No matching response arrived within the iteration budget.
    #[error("no response to request {request_id} after {max_iterations} messages")]
    MaxResponseIterations {
        /// Request that went unanswered.
        request_id: i64,
        /// Number of messages inspected.
        max_iterations: usize,
    },

    /// The backend did not finish the handshake before the deadline.
    #[error("backend did not complete the handshake within {}ms", timeout.as_millis())]
    Timeout {
        /// Deadline that elapsed.
        timeout: Duration,
    },

    /// The thread running the handshake panicked.
    #[error("handshake thread for the backend panicked")]
    HandshakeThread,
}

impl AdapterError {
    /// Converts a JSON-RPC error object into [`AdapterError::ServerError`].
    #[must_use]
    pub fn from_jsonrpc(error: JsonRpcError) -> Self {
        Self::ServerError {
            code: error.code,
            message: error.message,
        }
    }
}

/// Framing failures on the backend's stdio.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The pipe failed or closed.
    #[error("pipe I/O failed: {0}")]
    Io(#[from] io::Error),

    /// A header block ended without `Content-Length`.
    #[error("frame has no Content-Length header")]
    MissingContentLength,

    /// `Content-Length` was not a number.
    #[error("frame header is malformed")]
    InvalidHeader,

    /// `Content-Length` exceeded the accepted payload size.
    #[error("frame of {length} bytes exceeds the {limit} byte limit")]
    MessageTooLarge {
        /// Declared payload length.
        length: usize,
        /// Largest accepted payload.
        limit: usize,
    },
}
