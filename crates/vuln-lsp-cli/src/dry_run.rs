//! Transport that records starts without spawning anything.

use serde::Serialize;
use tracing::info;
use vuln_lsp_bootstrap::{
    BackendError, CapabilityDeclaration, LaunchSpec, SessionId, SessionTransport, StartOutcome,
    StartRequest,
};

const DRY_RUN_TARGET: &str = "vuln_lsp_cli::dry_run";

/// Records every start as immediately running.
#[derive(Debug, Default)]
pub(crate) struct DryRunTransport {
    started: Vec<SessionId>,
    stopped: Vec<SessionId>,
}

impl DryRunTransport {
    pub(crate) fn started(&self) -> &[SessionId] {
        &self.started
    }

    pub(crate) fn stopped(&self) -> &[SessionId] {
        &self.stopped
    }
}

impl SessionTransport for DryRunTransport {
    fn start(&mut self, request: &StartRequest) -> Result<StartOutcome, BackendError> {
        info!(
            target: DRY_RUN_TARGET,
            session = %request.session,
            scope = %request.scope,
            executable = %request.launch.executable,
            "dry run: backend not spawned"
        );
        self.started.push(request.session);
        Ok(StartOutcome::Running)
    }

    fn stop(&mut self, session: SessionId) {
        self.stopped.push(session);
    }
}

#[derive(Debug, Serialize)]
struct CapabilityEntry {
    key: &'static str,
    enabled: bool,
    source: String,
}

/// JSON document printed before a dry run replays its documents.
#[derive(Debug, Serialize)]
pub(crate) struct DryRunReport<'a> {
    integration: &'a str,
    launch: &'a LaunchSpec,
    capabilities: Vec<CapabilityEntry>,
}

impl<'a> DryRunReport<'a> {
    pub(crate) fn new(launch: &'a LaunchSpec, declaration: &'a CapabilityDeclaration) -> Self {
        let capabilities = declaration
            .states()
            .map(|state| CapabilityEntry {
                key: state.kind.key(),
                enabled: state.enabled,
                source: state.source.to_string(),
            })
            .collect();
        Self {
            integration: declaration.integration(),
            launch,
            capabilities,
        }
    }
}
