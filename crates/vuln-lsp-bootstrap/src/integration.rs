//! Entry point for host-editor events.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tracing::debug;
use vuln_lsp_config::{IntegrationConfig, LaunchMode};

use crate::activation::ActivationGate;
use crate::backend::SessionTransport;
use crate::document::DocumentReference;
use crate::errors::SessionError;
use crate::manager::SessionManager;
use crate::scope::ProjectScope;
use crate::session::SessionHandle;

const INTEGRATION_TARGET: &str = "vuln_lsp_bootstrap::integration";

/// Activated documents of one scope and the session they share.
#[derive(Debug)]
struct ScopeDocuments {
    handle: SessionHandle,
    paths: BTreeSet<PathBuf>,
}

/// Composes the activation gate and session manager of one integration.
///
/// The host editor forwards document-open and scope-close events here, and
/// calls [`Integration::poll_starts`] from its event loop to settle pending
/// handshakes. Each activated document is associated with the current session
/// handle of its scope for the lifetime of that scope; when a failed session
/// is replaced, every document of the scope follows the new handle.
#[derive(Debug)]
pub struct Integration<T> {
    gate: ActivationGate,
    manager: SessionManager<T>,
    documents: HashMap<ProjectScope, ScopeDocuments>,
}

impl<T: SessionTransport> Integration<T> {
    /// Builds an integration from its parts.
    #[must_use]
    pub fn new(gate: ActivationGate, manager: SessionManager<T>) -> Self {
        Self {
            gate,
            manager,
            documents: HashMap::new(),
        }
    }

    /// Builds an integration from configuration.
    #[must_use]
    pub fn from_config(config: &IntegrationConfig, mode: LaunchMode, transport: T) -> Self {
        Self::new(
            ActivationGate::new(config.target_extension.clone()),
            SessionManager::from_config(config, mode, transport),
        )
    }

    /// Handles a document-open event.
    ///
    /// Returns `Ok(None)` without touching the session manager when the
    /// document does not activate the integration.
    ///
    /// # Errors
    ///
    /// Propagates [`SessionError::StartFailed`] when a session had to be
    /// started and the backend could not be launched.
    pub fn on_document_opened(
        &mut self,
        scope: &ProjectScope,
        document: &DocumentReference,
    ) -> Result<Option<SessionHandle>, SessionError> {
        if !self.gate.should_activate(document) {
            return Ok(None);
        }

        let handle = self.manager.ensure_started(scope)?;
        debug!(
            target: INTEGRATION_TARGET,
            scope = %scope,
            session = %handle.id(),
            path = %document.path().display(),
            "document associated with session"
        );
        let linked = self
            .documents
            .entry(scope.clone())
            .or_insert_with(|| ScopeDocuments {
                handle: handle.clone(),
                paths: BTreeSet::new(),
            });
        if linked.handle.id() != handle.id() {
            debug!(
                target: INTEGRATION_TARGET,
                scope = %scope,
                from = %linked.handle.id(),
                to = %handle.id(),
                documents = linked.paths.len(),
                "documents moved to replacement session"
            );
            linked.handle = handle.clone();
        }
        linked.paths.insert(document.path().to_path_buf());
        Ok(Some(handle))
    }

    /// Settles pending handshakes reported by the transport.
    ///
    /// Returns one entry per settled session: the handle once it is running,
    /// or the start failure to show the user. Never blocks.
    pub fn poll_starts(&mut self) -> Vec<Result<SessionHandle, SessionError>> {
        self.manager.poll_pending()
    }

    /// Handles a project-scope-close event.
    pub fn on_scope_closed(&mut self, scope: &ProjectScope) -> Option<SessionHandle> {
        self.documents.remove(scope);
        self.manager.close_scope(scope)
    }

    /// Session handle associated with a document opened in `scope`.
    #[must_use]
    pub fn session_for(&self, scope: &ProjectScope, path: &Path) -> Option<&SessionHandle> {
        self.documents
            .get(scope)
            .filter(|linked| linked.paths.contains(path))
            .map(|linked| &linked.handle)
    }

    /// Activation gate of the integration.
    #[must_use]
    pub fn gate(&self) -> &ActivationGate {
        &self.gate
    }

    /// Session manager of the integration.
    #[must_use]
    pub fn manager(&self) -> &SessionManager<T> {
        &self.manager
    }

    /// Mutable access to the session manager.
    pub fn manager_mut(&mut self) -> &mut SessionManager<T> {
        &mut self.manager
    }
}
