//! Capability declaration fixed when a session is constructed.

use std::collections::BTreeMap;
use std::fmt;

use lsp_types::{
    ClientCapabilities, CompletionClientCapabilities, GotoCapability,
    PublishDiagnosticsClientCapabilities, ServerCapabilities, TextDocumentClientCapabilities,
};
use vuln_lsp_config::{CapabilityToggles, OptionalCapability};

use crate::errors::SessionError;

/// Editor feature an integration may surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CapabilityKind {
    /// Diagnostics published by the backend.
    Diagnostics,
    /// `textDocument/completion`.
    Completion,
    /// `textDocument/definition`.
    GoToDefinition,
}

impl CapabilityKind {
    /// Every capability, in declaration order.
    pub const ALL: [Self; 3] = [Self::Diagnostics, Self::Completion, Self::GoToDefinition];

    /// Returns the key the host editor consults before issuing requests.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Diagnostics => "diagnostics-support",
            Self::Completion => "completion-support",
            Self::GoToDefinition => "go-to-definition-support",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.key())
    }
}

/// Why a capability is in its declared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilitySource {
    /// Diagnostics are the integration's purpose and cannot be switched off.
    AlwaysOn,
    /// The integration opted into the capability.
    EnabledByIntegration,
    /// The integration left the capability at its default of off.
    DisabledByIntegration,
}

impl fmt::Display for CapabilitySource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AlwaysOn => "always on",
            Self::EnabledByIntegration => "enabled by integration",
            Self::DisabledByIntegration => "disabled by integration",
        };
        formatter.write_str(label)
    }
}

/// Declared state for a single capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityState {
    /// Capability kind being described.
    pub kind: CapabilityKind,
    /// Whether the host editor may use the capability.
    pub enabled: bool,
    /// Why the capability is (un)available.
    pub source: CapabilitySource,
}

impl CapabilityState {
    /// Constructs a new capability state.
    #[must_use]
    pub fn new(kind: CapabilityKind, enabled: bool, source: CapabilitySource) -> Self {
        Self {
            kind,
            enabled,
            source,
        }
    }
}

/// Immutable set of capability toggles for one integration's sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityDeclaration {
    integration: String,
    states: BTreeMap<CapabilityKind, CapabilityState>,
}

impl CapabilityDeclaration {
    /// Builds the declaration from an integration's opt-in toggles.
    #[must_use]
    pub fn declare(integration: impl Into<String>, toggles: CapabilityToggles) -> Self {
        let states = CapabilityKind::ALL
            .into_iter()
            .map(|kind| (kind, declared_state(kind, toggles)))
            .collect();
        Self {
            integration: integration.into(),
            states,
        }
    }

    /// Integration the declaration belongs to.
    #[must_use]
    pub fn integration(&self) -> &str {
        self.integration.as_str()
    }

    /// Returns the state for the requested capability.
    #[must_use]
    pub fn state(&self, capability: CapabilityKind) -> CapabilityState {
        match self.states.get(&capability) {
            Some(state) => *state,
            None => CapabilityState::new(
                capability,
                false,
                CapabilitySource::DisabledByIntegration,
            ),
        }
    }

    /// Whether the host editor may use the capability.
    #[must_use]
    pub fn is_enabled(&self, capability: CapabilityKind) -> bool {
        self.state(capability).enabled
    }

    /// Returns an iterator over all declared capability states.
    pub fn states(&self) -> impl Iterator<Item = CapabilityState> + '_ {
        self.states.values().copied()
    }

    /// Guard consulted before issuing a request for `capability`.
    pub fn require(&self, capability: CapabilityKind) -> Result<(), SessionError> {
        let state = self.state(capability);
        if state.enabled {
            return Ok(());
        }
        Err(SessionError::capability_disabled(
            self.integration.clone(),
            capability,
            state.source,
        ))
    }

    /// Client capabilities advertised during the `initialize` handshake.
    #[must_use]
    pub fn client_capabilities(&self) -> ClientCapabilities {
        ClientCapabilities {
            text_document: Some(TextDocumentClientCapabilities {
                publish_diagnostics: Some(PublishDiagnosticsClientCapabilities::default()),
                completion: self
                    .is_enabled(CapabilityKind::Completion)
                    .then(CompletionClientCapabilities::default),
                definition: self
                    .is_enabled(CapabilityKind::GoToDefinition)
                    .then(GotoCapability::default),
                ..TextDocumentClientCapabilities::default()
            }),
            ..ClientCapabilities::default()
        }
    }

    /// Declared capabilities the server did not advertise.
    ///
    /// Diagnostics are pushed by the server and need no advertisement.
    #[must_use]
    pub fn unsupported_by(&self, server: &ServerCapabilities) -> Vec<CapabilityKind> {
        self.states()
            .filter(|state| state.enabled)
            .filter(|state| match state.kind {
                CapabilityKind::Diagnostics => false,
                CapabilityKind::Completion => server.completion_provider.is_none(),
                CapabilityKind::GoToDefinition => server.definition_provider.is_none(),
            })
            .map(|state| state.kind)
            .collect()
    }
}

fn declared_state(kind: CapabilityKind, toggles: CapabilityToggles) -> CapabilityState {
    let optional = match kind {
        CapabilityKind::Diagnostics => {
            return CapabilityState::new(kind, true, CapabilitySource::AlwaysOn);
        }
        CapabilityKind::Completion => OptionalCapability::Completion,
        CapabilityKind::GoToDefinition => OptionalCapability::GoToDefinition,
    };

    if toggles.is_enabled(optional) {
        CapabilityState::new(kind, true, CapabilitySource::EnabledByIntegration)
    } else {
        CapabilityState::new(kind, false, CapabilitySource::DisabledByIntegration)
    }
}
