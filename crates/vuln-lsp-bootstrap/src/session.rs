//! Session identities, handles and lifecycle states.

use std::fmt;
use std::sync::Arc;

use crate::capability::{CapabilityDeclaration, CapabilityKind};
use crate::errors::SessionError;
use crate::scope::ProjectScope;

/// Identity of one backend session, unique within a session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Numeric value of the identity.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lifecycle state of the session bound to a project scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session has been started for the scope.
    Unstarted,
    /// A start was initiated and the handshake has not finished.
    Starting,
    /// The backend is up with its declared capabilities.
    Running,
    /// The last start failed; the next activation retries from scratch.
    Failed,
    /// The owning project scope closed.
    Terminated,
}

impl SessionState {
    /// Whether the state blocks a new start for the scope.
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unstarted => "unstarted",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Terminated => "terminated",
        };
        formatter.write_str(label)
    }
}

/// Handle the host editor associates with a project scope.
///
/// Two handles are the same session iff their [`SessionId`]s are equal.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    scope: ProjectScope,
    capabilities: Arc<CapabilityDeclaration>,
}

impl SessionHandle {
    pub(crate) fn new(
        id: SessionId,
        scope: ProjectScope,
        capabilities: Arc<CapabilityDeclaration>,
    ) -> Self {
        Self {
            id,
            scope,
            capabilities,
        }
    }

    /// Identity of the session.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Scope the session is bound to.
    #[must_use]
    pub fn scope(&self) -> &ProjectScope {
        &self.scope
    }

    /// Capabilities declared when the session was constructed.
    #[must_use]
    pub fn capabilities(&self) -> &CapabilityDeclaration {
        self.capabilities.as_ref()
    }

    /// Guard consulted before issuing a request for `capability`.
    pub fn require(&self, capability: CapabilityKind) -> Result<(), SessionError> {
        self.capabilities.require(capability)
    }

    pub(crate) fn shared_capabilities(&self) -> Arc<CapabilityDeclaration> {
        Arc::clone(&self.capabilities)
    }
}

impl PartialEq for SessionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SessionHandle {}
