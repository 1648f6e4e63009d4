//! Process-backed session transport.
//!
//! [`ProcessTransport`] spawns the backend described by a
//! [`LaunchSpec`](crate::LaunchSpec), frames JSON-RPC 2.0 over the child's
//! stdio with `Content-Length` headers and completes the `initialize`
//! handshake using the session's capability declaration. The handshake runs
//! off the caller's thread: starts report
//! [`StartOutcome::Pending`](crate::StartOutcome::Pending) and settle when the
//! host calls [`Integration::poll_starts`](crate::Integration::poll_starts).
//!
//! - [`AdapterError`] and [`TransportError`]: failures while running a backend
//! - [`JsonRpcRequest`], [`JsonRpcResponse`], [`JsonRpcMessage`]: wire messages
//! - [`FramedTransport`]: header framing over any reader and writer pair
//! - [`ProcessTransport`]: the [`SessionTransport`](crate::SessionTransport)
//!   implementation
//!
//! ```ignore
//! use vuln_lsp_bootstrap::adapter::ProcessTransport;
//! use vuln_lsp_bootstrap::Integration;
//! use vuln_lsp_config::{IntegrationConfig, LaunchMode};
//!
//! let integration = Integration::from_config(
//!     &IntegrationConfig::vuln_lsp(),
//!     LaunchMode::Run,
//!     ProcessTransport::new(),
//! );
//! ```

mod error;
mod handshake;
mod jsonrpc;
mod lifecycle;
mod messaging;
mod process;
mod transport;

pub use error::{AdapterError, TransportError};
pub use jsonrpc::{
    JsonRpcError, JsonRpcIncoming, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestIds,
};
pub use process::{DEFAULT_HANDSHAKE_TIMEOUT, ProcessTransport};
pub use transport::{FramedTransport, MAX_MESSAGE_BYTES, StdioTransport};
