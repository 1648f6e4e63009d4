//! Error types surfaced by the bootstrap layer.

use thiserror::Error;

use crate::backend::BackendError;
use crate::capability::{CapabilityKind, CapabilitySource};
use crate::scope::ProjectScope;
use crate::session::{SessionId, SessionState};

/// Errors returned by [`crate::SessionManager`] and [`crate::Integration`].
///
/// None of these are fatal to the host editor: a failed start leaves the
/// scope without the integration until the next activation retries.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backend could not be started for a scope.
    #[error("failed to start {integration} backend '{executable}' for scope {scope}: {source}")]
    StartFailed {
        /// Integration whose backend failed.
        integration: String,
        /// Scope left without a session.
        scope: ProjectScope,
        /// Executable that was launched.
        executable: String,
        /// Underlying transport error.
        #[source]
        source: BackendError,
    },

    /// The handle no longer names the current session for its scope.
    #[error("session {session} is not the current session for scope {scope}")]
    StaleSession {
        /// Scope named by the handle.
        scope: ProjectScope,
        /// Session named by the handle.
        session: SessionId,
    },

    /// A lifecycle transition was requested from an incompatible state.
    #[error("session {session} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Session being transitioned.
        session: SessionId,
        /// Current state.
        from: SessionState,
        /// Requested state.
        to: SessionState,
    },

    /// The host requested a capability the integration declared disabled.
    #[error("capability {capability} of {integration} is unavailable: {reason}")]
    CapabilityDisabled {
        /// Integration that declared the capability.
        integration: String,
        /// Capability that was requested.
        capability: CapabilityKind,
        /// Why the capability is not available.
        reason: CapabilitySource,
    },
}

impl SessionError {
    /// Wraps a transport failure for a scope.
    pub(crate) fn start_failed(
        integration: impl Into<String>,
        scope: ProjectScope,
        executable: impl Into<String>,
        source: BackendError,
    ) -> Self {
        Self::StartFailed {
            integration: integration.into(),
            scope,
            executable: executable.into(),
            source,
        }
    }

    /// Builds a `StaleSession` error.
    pub(crate) fn stale(scope: ProjectScope, session: SessionId) -> Self {
        Self::StaleSession { scope, session }
    }

    /// Builds an `InvalidTransition` error.
    pub(crate) fn invalid_transition(
        session: SessionId,
        from: SessionState,
        to: SessionState,
    ) -> Self {
        Self::InvalidTransition { session, from, to }
    }

    /// Builds a `CapabilityDisabled` error.
    pub(crate) fn capability_disabled(
        integration: String,
        capability: CapabilityKind,
        reason: CapabilitySource,
    ) -> Self {
        Self::CapabilityDisabled {
            integration,
            capability,
            reason,
        }
    }
}
