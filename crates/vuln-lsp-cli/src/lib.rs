//! Command-line runtime for the vulnerability language-server bootstrap.
//!
//! Each positional document is replayed as a document-open event in one
//! project scope, exercising the activation gate and session manager exactly
//! as an editor host would. Pending handshakes are then polled until they
//! settle and the scope is closed. `--dry-run` swaps the process transport
//! for one that records starts, which makes the launch specification
//! inspectable without the backend installed.

use std::error::Error;
use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::debug;
use vuln_lsp_bootstrap::adapter::ProcessTransport;
use vuln_lsp_bootstrap::{DocumentReference, Integration, ProjectScope, SessionTransport};
use vuln_lsp_config::IntegrationConfig;

mod cli;
mod dry_run;
mod errors;
pub mod telemetry;

use cli::Cli;
use dry_run::{DryRunReport, DryRunTransport};
use errors::AppError;

const CLI_TARGET: &str = "vuln_lsp_cli";

const SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs the CLI with the supplied arguments and output streams.
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    match try_run(args, stdout, stderr) {
        Ok(Outcome::Completed) => ExitCode::SUCCESS,
        Ok(Outcome::StartFailures) => ExitCode::FAILURE,
        Err(AppError::CliUsage(error)) => {
            let exit = if error.use_stderr() { 2 } else { 0 };
            let rendered = error.render().to_string();
            let stream: &mut dyn Write = if error.use_stderr() { stderr } else { stdout };
            let _ = stream.write_all(rendered.as_bytes());
            ExitCode::from(exit)
        }
        Err(error) => {
            let _ = writeln!(stderr, "vuln-lsp-bootstrap: {}", render_chain(&error));
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Completed,
    StartFailures,
}

fn try_run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> Result<Outcome, AppError>
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = Cli::try_parse_from(args).map_err(AppError::CliUsage)?;
    let config = resolve_config(&cli)?;
    telemetry::initialise(&config.log_filter, config.log_format)?;

    if cli.dry_run {
        let mut integration = Integration::from_config(&config, cli.mode, DryRunTransport::default());
        let manager = integration.manager();
        let report = DryRunReport::new(manager.launch_spec(), manager.capabilities());
        serde_json::to_writer_pretty(&mut *stdout, &report).map_err(AppError::SerialiseReport)?;
        writeln!(stdout)?;

        let outcome = replay(&mut integration, &cli, stdout, stderr)?;
        let transport = integration.manager().transport();
        debug!(
            target: CLI_TARGET,
            started = transport.started().len(),
            stopped = transport.stopped().len(),
            "dry run complete"
        );
        Ok(outcome)
    } else {
        let mut integration = Integration::from_config(&config, cli.mode, ProcessTransport::new());
        replay(&mut integration, &cli, stdout, stderr)
    }
}

/// Builds the integration from a file or preset, then applies flag overrides.
fn resolve_config(cli: &Cli) -> Result<IntegrationConfig, AppError> {
    let mut config = match &cli.config {
        Some(path) => IntegrationConfig::load_from_path(path)?,
        None => IntegrationConfig::preset(&cli.integration)?,
    };
    if let Some(filter) = &cli.log_filter {
        config.log_filter.clone_from(filter);
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    for capability in &cli.enable {
        config.capabilities.enable(*capability);
    }
    config.validate()?;
    Ok(config)
}

fn replay<T, W, E>(
    integration: &mut Integration<T>,
    cli: &Cli,
    stdout: &mut W,
    stderr: &mut E,
) -> Result<Outcome, AppError>
where
    T: SessionTransport,
    W: Write,
    E: Write,
{
    let scope = ProjectScope::new(cli.scope.as_str());
    let mut outcome = Outcome::Completed;

    for path in &cli.documents {
        let document = DocumentReference::new(path);
        match integration.on_document_opened(&scope, &document) {
            Ok(None) => writeln!(stdout, "skipped {path}")?,
            Ok(Some(handle)) => {
                let state = integration.manager().state_of(&handle);
                writeln!(stdout, "session {} {state} {path}", handle.id())?;
            }
            Err(error) => {
                writeln!(stderr, "error: {path}: {}", render_chain(&error))?;
                outcome = Outcome::StartFailures;
            }
        }
    }

    if settle(integration, &scope, stdout, stderr)? == Outcome::StartFailures {
        outcome = Outcome::StartFailures;
    }
    integration.on_scope_closed(&scope);
    Ok(outcome)
}

/// Polls until no session is starting.
///
/// Terminates because the process transport fails handshakes that miss their
/// deadline.
fn settle<T, W, E>(
    integration: &mut Integration<T>,
    scope: &ProjectScope,
    stdout: &mut W,
    stderr: &mut E,
) -> Result<Outcome, AppError>
where
    T: SessionTransport,
    W: Write,
    E: Write,
{
    let mut outcome = Outcome::Completed;
    while integration.manager().pending_count() > 0 {
        for settled in integration.poll_starts() {
            match settled {
                Ok(handle) => writeln!(stdout, "session {} running", handle.id())?,
                Err(error) => {
                    writeln!(stderr, "error: scope {scope}: {}", render_chain(&error))?;
                    outcome = Outcome::StartFailures;
                }
            }
        }
        if integration.manager().pending_count() > 0 {
            thread::sleep(SETTLE_POLL_INTERVAL);
        }
    }
    Ok(outcome)
}

fn render_chain(error: &dyn Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !rendered.contains(&message) {
            rendered.push_str(": ");
            rendered.push_str(&message);
        }
        source = cause.source();
    }
    rendered
}
