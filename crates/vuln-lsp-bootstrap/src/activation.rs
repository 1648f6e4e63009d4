//! Cheap predicate deciding whether an opened document concerns an integration.

use tracing::trace;

use crate::document::DocumentReference;

const ACTIVATION_TARGET: &str = "vuln_lsp_bootstrap::activation";

/// Decides, per document-open event, whether the integration applies.
///
/// The check is a case-sensitive comparison of the document's extension with
/// a single configured literal. It has no side effects and never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationGate {
    target_extension: String,
}

impl ActivationGate {
    /// Builds a gate matching documents whose extension equals `target_extension`.
    #[must_use]
    pub fn new(target_extension: impl Into<String>) -> Self {
        Self {
            target_extension: target_extension.into(),
        }
    }

    /// Extension the gate matches.
    #[must_use]
    pub fn target_extension(&self) -> &str {
        self.target_extension.as_str()
    }

    /// Returns `true` iff the document's extension equals the target exactly.
    ///
    /// Documents without a resolvable extension never match.
    #[must_use]
    pub fn should_activate(&self, document: &DocumentReference) -> bool {
        let matched = document
            .extension()
            .is_some_and(|extension| extension == self.target_extension);
        trace!(
            target: ACTIVATION_TARGET,
            path = %document.path().display(),
            target_extension = %self.target_extension,
            matched,
            "evaluated activation predicate"
        );
        matched
    }
}
