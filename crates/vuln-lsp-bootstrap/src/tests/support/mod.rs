//! Shared fixtures and helpers for bootstrap tests.

mod recording_transport;
mod world;

use rstest::fixture;
use vuln_lsp_config::{IntegrationConfig, LaunchMode};

use crate::document::DocumentReference;
use crate::integration::Integration;
use crate::scope::ProjectScope;

pub use recording_transport::{RecordingTransport, StartBehaviour};
pub use world::TestWorld;

/// Scope used by most tests.
#[fixture]
pub fn workspace() -> ProjectScope {
    ProjectScope::new("workspace-a")
}

/// Builds a document reference for `path`.
#[must_use]
pub fn document(path: &str) -> DocumentReference {
    DocumentReference::new(path)
}

/// Builds a vulnerability integration over a recording transport.
#[must_use]
pub fn vuln_integration(transport: &RecordingTransport) -> Integration<RecordingTransport> {
    Integration::from_config(&IntegrationConfig::vuln_lsp(), LaunchMode::Run, transport.clone())
}
