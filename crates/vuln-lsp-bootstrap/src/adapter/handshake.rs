//! `initialize` / `shutdown` exchanges with a backend.

use std::io::{BufRead, Write};

use lsp_types::{ClientInfo, InitializeParams, InitializeResult, InitializedParams};
use serde_json::Value;
use tracing::{debug, warn};

use super::error::AdapterError;
use super::lifecycle::ADAPTER_TARGET;
use super::messaging::Channel;
use crate::backend::StartRequest;

/// Builds the `initialize` parameters for a start request.
pub(super) fn initialize_params(request: &StartRequest) -> InitializeParams {
    InitializeParams {
        process_id: Some(std::process::id()),
        capabilities: request.capabilities.client_capabilities(),
        client_info: Some(ClientInfo {
            name: request.launch.integration.clone(),
            version: Some(env!("CARGO_PKG_VERSION").to_owned()),
        }),
        ..InitializeParams::default()
    }
}

/// Runs `initialize` followed by `initialized`.
pub(super) fn initialize<R: BufRead, W: Write>(
    channel: &mut Channel<R, W>,
    request: &StartRequest,
) -> Result<InitializeResult, AdapterError> {
    let result: InitializeResult = channel.request("initialize", initialize_params(request))?;
    channel.notify("initialized", InitializedParams {})?;

    let unsupported = request.capabilities.unsupported_by(&result.capabilities);
    if !unsupported.is_empty() {
        warn!(
            target: ADAPTER_TARGET,
            session = %request.session,
            integration = %request.launch.integration,
            capabilities = ?unsupported,
            "backend does not advertise declared capabilities"
        );
    }

    debug!(
        target: ADAPTER_TARGET,
        session = %request.session,
        server = ?result.server_info.as_ref().map(|info| info.name.as_str()),
        "handshake complete"
    );
    Ok(result)
}

/// Sends `shutdown` then `exit`, logging rather than failing.
pub(super) fn shutdown<R: BufRead, W: Write>(channel: &mut Channel<R, W>) {
    if let Err(error) = channel.request_raw("shutdown", Value::Null) {
        debug!(
            target: ADAPTER_TARGET,
            operation = "shutdown",
            %error,
            "shutdown request failed"
        );
    }
    if let Err(error) = channel.notify("exit", Value::Null) {
        debug!(
            target: ADAPTER_TARGET,
            operation = "exit",
            %error,
            "exit notification failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::{fixture, rstest};
    use vuln_lsp_config::{IntegrationConfig, LaunchMode};

    use super::super::messaging::test_support::{channel, written};
    use super::*;
    use crate::capability::CapabilityDeclaration;
    use crate::launch::LaunchSpec;
    use crate::scope::ProjectScope;
    use crate::session::SessionId;

    #[fixture]
    fn iq_request() -> StartRequest {
        let config = IntegrationConfig::iq_lsp();
        StartRequest {
            session: SessionId::new(1),
            scope: ProjectScope::new("workspace"),
            launch: LaunchSpec::from_config(&config, LaunchMode::Run),
            capabilities: Arc::new(CapabilityDeclaration::declare(
                config.id.clone(),
                config.capabilities,
            )),
        }
    }

    #[rstest]
    fn params_carry_integration_identity_and_capabilities(iq_request: StartRequest) {
        let params = initialize_params(&iq_request);

        let client = params.client_info.expect("client info");
        assert_eq!(client.name, "iq-lsp");
        let text_document = params
            .capabilities
            .text_document
            .expect("text document capabilities");
        assert!(text_document.completion.is_some());
        assert!(text_document.definition.is_none());
    }

    #[rstest]
    fn completes_handshake_and_sends_initialized(iq_request: StartRequest) {
        let mut channel = channel(&[
            r#"{"jsonrpc":"2.0","method":"window/logMessage","params":{"type":4,"message":"booting"}}"#,
            r#"{"jsonrpc":"2.0","id":1,"result":{"capabilities":{"completionProvider":{}},"serverInfo":{"name":"iq-lsp"}}}"#,
        ]);

        let result = initialize(&mut channel, &iq_request).expect("handshake");

        assert!(result.capabilities.completion_provider.is_some());
        let sent = written(channel);
        assert_eq!(sent.len(), 2);
        assert!(sent[0].contains(r#""method":"initialize""#));
        assert!(sent[0].contains(r#""clientInfo":{"name":"iq-lsp""#));
        assert!(sent[1].contains(r#""method":"initialized""#));
    }

    #[rstest]
    fn missing_capability_does_not_fail_the_handshake(iq_request: StartRequest) {
        let mut channel = channel(&[r#"{"jsonrpc":"2.0","id":1,"result":{"capabilities":{}}}"#]);

        let result = initialize(&mut channel, &iq_request).expect("handshake");

        assert!(result.capabilities.completion_provider.is_none());
        assert!(
            iq_request
                .capabilities
                .is_enabled(crate::capability::CapabilityKind::Completion)
        );
    }

    #[rstest]
    fn rejected_initialize_is_an_error(iq_request: StartRequest) {
        let mut channel = channel(&[
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32002,"message":"not ready"}}"#,
        ]);

        let error = initialize(&mut channel, &iq_request).expect_err("rejected");

        assert!(matches!(error, AdapterError::ServerError { code: -32002, .. }));
        assert_eq!(written(channel).len(), 1);
    }

    #[rstest]
    fn shutdown_sends_request_then_exit() {
        let mut channel = channel(&[r#"{"jsonrpc":"2.0","id":1,"result":null}"#]);

        shutdown(&mut channel);

        let sent = written(channel);
        assert!(sent[0].contains(r#""method":"shutdown""#));
        assert!(sent[1].contains(r#""method":"exit""#));
    }

    #[rstest]
    fn shutdown_tolerates_a_closed_backend() {
        let mut channel = channel(&[]);

        shutdown(&mut channel);

        assert_eq!(written(channel).len(), 2);
    }
}
