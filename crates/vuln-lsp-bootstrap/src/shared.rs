//! Thread-safe wrapper for hosts that deliver events on several threads.

use std::sync::{Mutex, MutexGuard};

use crate::backend::SessionTransport;
use crate::document::DocumentReference;
use crate::errors::SessionError;
use crate::integration::Integration;
use crate::scope::ProjectScope;
use crate::session::SessionHandle;

/// Serialises events so the `Unstarted -> Starting` transition of a scope can
/// never race with another activation of the same scope.
#[derive(Debug)]
pub struct SharedIntegration<T> {
    inner: Mutex<Integration<T>>,
}

impl<T: SessionTransport> SharedIntegration<T> {
    /// Wraps an integration.
    #[must_use]
    pub fn new(integration: Integration<T>) -> Self {
        Self {
            inner: Mutex::new(integration),
        }
    }

    /// Handles a document-open event under the lock.
    ///
    /// # Errors
    ///
    /// See [`Integration::on_document_opened`].
    pub fn on_document_opened(
        &self,
        scope: &ProjectScope,
        document: &DocumentReference,
    ) -> Result<Option<SessionHandle>, SessionError> {
        self.lock().on_document_opened(scope, document)
    }

    /// Settles pending handshakes under the lock.
    pub fn poll_starts(&self) -> Vec<Result<SessionHandle, SessionError>> {
        self.lock().poll_starts()
    }

    /// Handles a project-scope-close event under the lock.
    pub fn on_scope_closed(&self, scope: &ProjectScope) -> Option<SessionHandle> {
        self.lock().on_scope_closed(scope)
    }

    /// Runs `f` with exclusive access to the integration.
    pub fn with_integration<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Integration<T>) -> R,
    {
        f(&mut self.lock())
    }

    /// Unwraps the integration.
    pub fn into_inner(self) -> Integration<T> {
        self.inner
            .into_inner()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    fn lock(&self) -> MutexGuard<'_, Integration<T>> {
        // A panic in another event handler must not wedge the integration.
        self.inner
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}
