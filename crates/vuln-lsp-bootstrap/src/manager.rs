//! Server session manager enforcing one live session per project scope.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use vuln_lsp_config::{IntegrationConfig, LaunchMode};

use crate::backend::{BackendError, SessionTransport, StartOutcome, StartRequest};
use crate::capability::CapabilityDeclaration;
use crate::errors::SessionError;
use crate::launch::LaunchSpec;
use crate::scope::ProjectScope;
use crate::session::{SessionHandle, SessionId, SessionState};

const MANAGER_TARGET: &str = "vuln_lsp_bootstrap::manager";

struct SessionEntry {
    handle: SessionHandle,
    state: SessionState,
}

/// Owns the backend sessions of one integration, keyed by project scope.
///
/// The manager guarantees at most one live session per scope: repeated
/// activations while a session is starting or running return the existing
/// handle without touching the transport. Sessions that failed to start are
/// retried from scratch on the next activation. Entries are removed when the
/// host closes the scope.
pub struct SessionManager<T> {
    launch: LaunchSpec,
    capabilities: Arc<CapabilityDeclaration>,
    transport: T,
    sessions: HashMap<ProjectScope, SessionEntry>,
    last_session: u64,
}

impl<T: SessionTransport> SessionManager<T> {
    /// Builds an empty manager.
    #[must_use]
    pub fn new(launch: LaunchSpec, capabilities: CapabilityDeclaration, transport: T) -> Self {
        Self {
            launch,
            capabilities: Arc::new(capabilities),
            transport,
            sessions: HashMap::new(),
            last_session: 0,
        }
    }

    /// Builds an empty manager for an integration and launch mode.
    #[must_use]
    pub fn from_config(config: &IntegrationConfig, mode: LaunchMode, transport: T) -> Self {
        Self::new(
            LaunchSpec::from_config(config, mode),
            CapabilityDeclaration::declare(config.id.clone(), config.capabilities),
            transport,
        )
    }

    /// Ensures a session exists for `scope` and returns its handle.
    ///
    /// Returns the existing handle unchanged while a session is starting or
    /// running. Otherwise a new session is allocated and handed to the
    /// transport; on return the start has been initiated, not necessarily
    /// completed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::StartFailed`] when the transport cannot start
    /// the backend. The scope is left in [`SessionState::Failed`].
    pub fn ensure_started(&mut self, scope: &ProjectScope) -> Result<SessionHandle, SessionError> {
        if let Some(entry) = self.sessions.get(scope)
            && entry.state.is_live()
        {
            debug!(
                target: MANAGER_TARGET,
                integration = %self.launch.integration,
                scope = %scope,
                session = %entry.handle.id(),
                state = %entry.state,
                "reusing live session"
            );
            return Ok(entry.handle.clone());
        }

        let handle = self.begin_start(scope);
        let request = StartRequest {
            session: handle.id(),
            scope: scope.clone(),
            launch: self.launch.clone(),
            capabilities: handle.shared_capabilities(),
        };

        match self.transport.start(&request) {
            Ok(StartOutcome::Running) => {
                self.set_state(scope, SessionState::Running);
                info!(
                    target: MANAGER_TARGET,
                    integration = %self.launch.integration,
                    scope = %scope,
                    session = %handle.id(),
                    "session running"
                );
                Ok(handle)
            }
            Ok(StartOutcome::Pending) => Ok(handle),
            Err(source) => {
                self.set_state(scope, SessionState::Failed);
                warn!(
                    target: MANAGER_TARGET,
                    integration = %self.launch.integration,
                    scope = %scope,
                    session = %handle.id(),
                    executable = %self.launch.executable,
                    error = %source,
                    "session failed to start"
                );
                Err(SessionError::start_failed(
                    self.launch.integration.clone(),
                    scope.clone(),
                    self.launch.executable.clone(),
                    source,
                ))
            }
        }
    }

    /// Records that a pending start completed its handshake.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::StaleSession`] when the handle is no longer
    /// current, or [`SessionError::InvalidTransition`] when the session is not
    /// starting.
    pub fn mark_running(&mut self, handle: &SessionHandle) -> Result<(), SessionError> {
        let entry = self.current_entry_mut(handle)?;
        if entry.state != SessionState::Starting {
            return Err(SessionError::invalid_transition(
                handle.id(),
                entry.state,
                SessionState::Running,
            ));
        }
        entry.state = SessionState::Running;
        info!(
            target: MANAGER_TARGET,
            scope = %handle.scope(),
            session = %handle.id(),
            "session running"
        );
        Ok(())
    }

    /// Records that a pending start failed and returns the failure to report.
    ///
    /// Stale handles and sessions that are not starting are left untouched and
    /// yield [`SessionError::StaleSession`] or
    /// [`SessionError::InvalidTransition`] instead.
    pub fn mark_failed(&mut self, handle: &SessionHandle, source: BackendError) -> SessionError {
        let integration = self.launch.integration.clone();
        let executable = self.launch.executable.clone();
        let entry = match self.current_entry_mut(handle) {
            Ok(entry) => entry,
            Err(error) => return error,
        };
        if entry.state != SessionState::Starting {
            return SessionError::invalid_transition(
                handle.id(),
                entry.state,
                SessionState::Failed,
            );
        }
        entry.state = SessionState::Failed;
        warn!(
            target: MANAGER_TARGET,
            scope = %handle.scope(),
            session = %handle.id(),
            error = %source,
            "session handshake failed"
        );
        SessionError::start_failed(integration, handle.scope().clone(), executable, source)
    }

    /// Applies handshakes the transport has settled since the last poll.
    ///
    /// Each settled session moves to [`SessionState::Running`] or
    /// [`SessionState::Failed`]; failures come back as
    /// [`SessionError::StartFailed`] so the host can report them. Completions
    /// for sessions whose scope has since closed are dropped. Never blocks.
    pub fn poll_pending(&mut self) -> Vec<Result<SessionHandle, SessionError>> {
        let completions = self.transport.poll_completions();
        let mut settled = Vec::with_capacity(completions.len());
        for completion in completions {
            let Some(handle) = self.handle_for(completion.session) else {
                debug!(
                    target: MANAGER_TARGET,
                    session = %completion.session,
                    "completion for a closed session dropped"
                );
                continue;
            };
            settled.push(match completion.result {
                Ok(()) => self.mark_running(&handle).map(|()| handle),
                Err(source) => Err(self.mark_failed(&handle, source)),
            });
        }
        settled
    }

    /// Number of scopes whose session is still [`SessionState::Starting`].
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|entry| entry.state == SessionState::Starting)
            .count()
    }

    /// Handles a scope-close notification from the host editor.
    ///
    /// Live sessions are stopped through the transport. Returns the handle of
    /// the session that was bound to the scope, if any.
    pub fn close_scope(&mut self, scope: &ProjectScope) -> Option<SessionHandle> {
        let entry = self.sessions.remove(scope)?;
        if entry.state.is_live() {
            self.transport.stop(entry.handle.id());
        }
        info!(
            target: MANAGER_TARGET,
            scope = %scope,
            session = %entry.handle.id(),
            from = %entry.state,
            to = %SessionState::Terminated,
            "session terminated"
        );
        Some(entry.handle)
    }

    /// State of the session bound to `scope`.
    #[must_use]
    pub fn state(&self, scope: &ProjectScope) -> SessionState {
        self.sessions
            .get(scope)
            .map_or(SessionState::Unstarted, |entry| entry.state)
    }

    /// State of the session named by `handle`.
    ///
    /// Handles that no longer name the current session of their scope report
    /// [`SessionState::Terminated`].
    #[must_use]
    pub fn state_of(&self, handle: &SessionHandle) -> SessionState {
        match self.sessions.get(handle.scope()) {
            Some(entry) if entry.handle.id() == handle.id() => entry.state,
            Some(_) | None => SessionState::Terminated,
        }
    }

    /// Handle of the live session bound to `scope`, if any.
    #[must_use]
    pub fn session(&self, scope: &ProjectScope) -> Option<&SessionHandle> {
        self.sessions
            .get(scope)
            .filter(|entry| entry.state.is_live())
            .map(|entry| &entry.handle)
    }

    /// Launch specification shared by every session.
    #[must_use]
    pub fn launch_spec(&self) -> &LaunchSpec {
        &self.launch
    }

    /// Capability declaration shared by every session.
    #[must_use]
    pub fn capabilities(&self) -> &CapabilityDeclaration {
        self.capabilities.as_ref()
    }

    /// Transport used to start sessions.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn begin_start(&mut self, scope: &ProjectScope) -> SessionHandle {
        self.last_session += 1;
        let handle = SessionHandle::new(
            SessionId::new(self.last_session),
            scope.clone(),
            Arc::clone(&self.capabilities),
        );
        let previous = self.sessions.insert(
            scope.clone(),
            SessionEntry {
                handle: handle.clone(),
                state: SessionState::Starting,
            },
        );
        debug!(
            target: MANAGER_TARGET,
            integration = %self.launch.integration,
            scope = %scope,
            session = %handle.id(),
            previous = ?previous.map(|entry| entry.state),
            "starting session"
        );
        handle
    }

    fn handle_for(&self, session: SessionId) -> Option<SessionHandle> {
        self.sessions
            .values()
            .find(|entry| entry.handle.id() == session)
            .map(|entry| entry.handle.clone())
    }

    fn set_state(&mut self, scope: &ProjectScope, state: SessionState) {
        if let Some(entry) = self.sessions.get_mut(scope) {
            entry.state = state;
        }
    }

    fn current_entry_mut(
        &mut self,
        handle: &SessionHandle,
    ) -> Result<&mut SessionEntry, SessionError> {
        self.sessions
            .get_mut(handle.scope())
            .filter(|entry| entry.handle.id() == handle.id())
            .ok_or_else(|| SessionError::stale(handle.scope().clone(), handle.id()))
    }
}

impl<T> std::fmt::Debug for SessionManager<T> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SessionManager")
            .field("integration", &self.launch.integration)
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}
