//! Seam between the session manager and the LSP client runtime.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::capability::CapabilityDeclaration;
use crate::launch::LaunchSpec;
use crate::scope::ProjectScope;
use crate::session::SessionId;

/// Parameters for starting one backend session.
#[derive(Debug, Clone)]
pub struct StartRequest {
    /// Session being started.
    pub session: SessionId,
    /// Scope the session is bound to.
    pub scope: ProjectScope,
    /// How to launch the backend.
    pub launch: LaunchSpec,
    /// Capabilities that parameterise the handshake.
    pub capabilities: Arc<CapabilityDeclaration>,
}

/// Progress reported by a transport once a start has been initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The process is up and the handshake has completed.
    Running,
    /// The handshake is still in flight; the host reports the result later.
    Pending,
}

/// Settled result of a start that was reported as [`StartOutcome::Pending`].
#[derive(Debug)]
pub struct StartCompletion {
    /// Session whose handshake settled.
    pub session: SessionId,
    /// `Ok` once the handshake completed, otherwise why it did not.
    pub result: Result<(), BackendError>,
}

impl StartCompletion {
    /// The handshake completed.
    #[must_use]
    pub fn running(session: SessionId) -> Self {
        Self {
            session,
            result: Ok(()),
        }
    }

    /// The handshake failed or timed out.
    #[must_use]
    pub fn failed(session: SessionId, error: BackendError) -> Self {
        Self {
            session,
            result: Err(error),
        }
    }
}

/// Errors reported by transports while starting a backend.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl BackendError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-friendly description without the optional source.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Behaviour required from the LSP client runtime that owns backend processes.
///
/// The transport starts the process and performs the `initialize` handshake
/// using the supplied launch specification and capability declaration. The
/// session manager never talks to the process directly.
///
/// `start` must not wait on the backend. Transports whose handshake takes a
/// round trip report [`StartOutcome::Pending`] and hand the result back later
/// through [`SessionTransport::poll_completions`].
pub trait SessionTransport {
    /// Initiates a backend start.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the executable cannot be located,
    /// fails to start, or exits before completing the handshake.
    fn start(&mut self, request: &StartRequest) -> Result<StartOutcome, BackendError>;

    /// Drains pending starts that settled since the last call.
    ///
    /// Never blocks. Transports that only report [`StartOutcome::Running`]
    /// have nothing to drain.
    fn poll_completions(&mut self) -> Vec<StartCompletion> {
        Vec::new()
    }

    /// Stops a session whose project scope closed.
    fn stop(&mut self, session: SessionId);
}

impl fmt::Debug for dyn SessionTransport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("SessionTransport")
    }
}
