//! BDD test world wrapping an integration and its recording transport.

use std::path::Path;

use vuln_lsp_config::{IntegrationConfig, LaunchMode};

use crate::backend::{BackendError, StartCompletion};
use crate::errors::SessionError;
use crate::integration::Integration;
use crate::scope::ProjectScope;
use crate::session::{SessionHandle, SessionState};

use super::document;
use super::recording_transport::{RecordingTransport, StartBehaviour};

/// Shared state exercised by BDD step implementations.
#[derive(Debug)]
pub struct TestWorld {
    /// Transport clone used for inspection.
    pub transport: RecordingTransport,
    /// Integration under test.
    pub integration: Integration<RecordingTransport>,
    /// Results of every document-open event, in order.
    pub opened: Vec<Option<SessionHandle>>,
    /// Last error observed while exercising the integration.
    pub last_error: Option<SessionError>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new(IntegrationConfig::vuln_lsp(), StartBehaviour::Running)
    }
}

impl TestWorld {
    /// Builds a world for `config` whose transport answers with `behaviour`.
    pub fn new(config: IntegrationConfig, behaviour: StartBehaviour) -> Self {
        let transport = RecordingTransport::new(behaviour);
        let integration = Integration::from_config(&config, LaunchMode::Run, transport.clone());
        Self {
            transport,
            integration,
            opened: Vec::new(),
            last_error: None,
        }
    }

    /// Delivers a document-open event.
    pub fn open(&mut self, scope: &str, path: &str) {
        match self
            .integration
            .on_document_opened(&ProjectScope::new(scope), &document(path))
        {
            Ok(handle) => self.opened.push(handle),
            Err(error) => {
                self.opened.push(None);
                self.last_error = Some(error);
            }
        }
    }

    /// Fails the pending handshake of `scope` and polls the integration.
    pub fn fail_handshake(&mut self, scope: &str) {
        let session = self
            .integration
            .manager()
            .session(&ProjectScope::new(scope))
            .expect("scope has a pending session")
            .id();
        self.transport.settle(StartCompletion::failed(
            session,
            BackendError::new("backend closed its output during initialize"),
        ));
        for settled in self.integration.poll_starts() {
            if let Err(error) = settled {
                self.last_error = Some(error);
            }
        }
    }

    /// Delivers a scope-close event.
    pub fn close(&mut self, scope: &str) {
        self.integration.on_scope_closed(&ProjectScope::new(scope));
    }

    /// State of the session bound to `scope`.
    pub fn state(&self, scope: &str) -> SessionState {
        self.integration
            .manager()
            .state(&ProjectScope::new(scope))
    }

    /// Handle associated with a document opened in `scope`.
    pub fn session_for(&self, scope: &str, path: &str) -> Option<&SessionHandle> {
        self.integration
            .session_for(&ProjectScope::new(scope), Path::new(path))
    }
}
