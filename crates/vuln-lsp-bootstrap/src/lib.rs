//! Editor-side bootstrap for vulnerability language-server integrations.
#![deny(missing_docs)]
//!
//! The crate decides when an opened document should activate an integration,
//! keeps at most one backend session per project scope, and fixes the
//! capabilities each session advertises before it starts. Process handling is
//! kept behind the [`SessionTransport`] trait so tests and hosts can inject
//! lightweight transports; [`adapter::ProcessTransport`] is the stdio-backed
//! implementation.

mod activation;
pub mod adapter;
mod backend;
mod capability;
mod document;
mod errors;
mod integration;
mod launch;
mod manager;
mod scope;
mod session;
mod shared;

pub use activation::ActivationGate;
pub use backend::{BackendError, SessionTransport, StartCompletion, StartOutcome, StartRequest};
pub use capability::{CapabilityDeclaration, CapabilityKind, CapabilitySource, CapabilityState};
pub use document::DocumentReference;
pub use errors::SessionError;
pub use integration::Integration;
pub use launch::{DocumentSelector, LaunchSpec, OutputEncoding};
pub use manager::SessionManager;
pub use scope::ProjectScope;
pub use session::{SessionHandle, SessionId, SessionState};
pub use shared::SharedIntegration;

#[cfg(test)]
mod tests;
