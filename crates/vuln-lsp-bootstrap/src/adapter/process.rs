//! Process-backed implementation of [`SessionTransport`].

use std::collections::HashMap;
use std::fmt;
use std::io::{self, BufReader, BufWriter};
use std::process::{Child, ChildStdin, ChildStdout};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::error::AdapterError;
use super::handshake;
use super::lifecycle::{ADAPTER_TARGET, Retiring, kill_child};
use super::messaging::Channel;
use super::transport::StdioTransport;
use crate::backend::{BackendError, SessionTransport, StartCompletion, StartOutcome, StartRequest};
use crate::launch::LaunchSpec;
use crate::session::SessionId;

/// Default deadline for a backend to answer `initialize`.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

type BackendChannel = Channel<BufReader<ChildStdout>, BufWriter<ChildStdin>>;

/// Backend whose `initialize` exchange runs on a worker thread.
struct Handshake {
    integration: String,
    child: Child,
    worker: JoinHandle<Result<BackendChannel, AdapterError>>,
    deadline: Instant,
}

struct Connection {
    child: Child,
    channel: BackendChannel,
}

enum Slot {
    Handshaking(Handshake),
    Ready(Connection),
}

impl Slot {
    fn child_mut(&mut self) -> &mut Child {
        match self {
            Self::Handshaking(handshake) => &mut handshake.child,
            Self::Ready(connection) => &mut connection.child,
        }
    }

    fn pid(&self) -> u32 {
        match self {
            Self::Handshaking(handshake) => handshake.child.id(),
            Self::Ready(connection) => connection.child.id(),
        }
    }
}

/// Spawns one backend process per session and speaks LSP over its stdio.
///
/// [`SessionTransport::start`] only spawns the process and reports
/// [`StartOutcome::Pending`]. The `initialize` handshake runs on a worker
/// thread and settles through [`SessionTransport::poll_completions`], which
/// also kills backends that miss the handshake deadline. Stopping a session
/// sends `shutdown` and `exit` from a worker thread; the process is reaped on
/// later polls and killed if it outlives the exit grace period.
pub struct ProcessTransport {
    slots: HashMap<SessionId, Slot>,
    retiring: Vec<Retiring>,
    handshake_timeout: Duration,
}

impl Default for ProcessTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTransport {
    /// Creates a transport with no running backends.
    #[must_use]
    pub fn new() -> Self {
        Self::with_handshake_timeout(DEFAULT_HANDSHAKE_TIMEOUT)
    }

    /// Creates a transport that gives each backend `timeout` to finish
    /// `initialize`.
    #[must_use]
    pub fn with_handshake_timeout(timeout: Duration) -> Self {
        Self {
            slots: HashMap::new(),
            retiring: Vec::new(),
            handshake_timeout: timeout,
        }
    }

    /// Deadline applied to each `initialize` exchange.
    #[must_use]
    pub fn handshake_timeout(&self) -> Duration {
        self.handshake_timeout
    }

    /// Whether a backend has completed its handshake for the session.
    #[must_use]
    pub fn is_connected(&self, session: SessionId) -> bool {
        matches!(self.slots.get(&session), Some(Slot::Ready(_)))
    }

    /// Number of backends that completed their handshake.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    /// Number of backends still running their handshake.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.slots.len() - self.connection_count()
    }

    /// Number of stopped backends that have not exited yet.
    #[must_use]
    pub fn retiring_count(&self) -> usize {
        self.retiring.len()
    }

    fn begin_handshake(&self, request: &StartRequest) -> Result<Handshake, AdapterError> {
        let (mut child, transport) = spawn(&request.launch)?;
        let mut channel = Channel::new(transport, request.launch.encoding, request.session);
        let worker_request = request.clone();

        let worker = thread::Builder::new()
            .name(format!("vuln-lsp-handshake-{}", request.session))
            .spawn(move || {
                handshake::initialize(&mut channel, &worker_request).map(|_| channel)
            })
            .map_err(|source| {
                kill_child(&mut child, request.session);
                AdapterError::SpawnFailed {
                    message: String::from("handshake thread"),
                    source,
                }
            })?;

        Ok(Handshake {
            integration: request.launch.integration.clone(),
            child,
            worker,
            deadline: Instant::now() + self.handshake_timeout,
        })
    }

    /// Moves a handshake that finished or expired out of its slot.
    fn settle(&mut self, session: SessionId) -> Option<StartCompletion> {
        let Some(Slot::Handshaking(handshake)) = self.slots.remove(&session) else {
            return None;
        };
        let Handshake {
            integration,
            mut child,
            worker,
            ..
        } = handshake;

        let result = if worker.is_finished() {
            worker
                .join()
                .unwrap_or_else(|_| Err(AdapterError::HandshakeThread))
        } else {
            // Killing the child closes its stdout, which ends the worker's read.
            Err(AdapterError::Timeout {
                timeout: self.handshake_timeout,
            })
        };

        match result {
            Ok(channel) => {
                info!(
                    target: ADAPTER_TARGET,
                    %session,
                    pid = child.id(),
                    "backend running"
                );
                self.slots
                    .insert(session, Slot::Ready(Connection { child, channel }));
                Some(StartCompletion::running(session))
            }
            Err(error) => {
                warn!(
                    target: ADAPTER_TARGET,
                    %session,
                    %error,
                    "handshake failed, killing backend"
                );
                kill_child(&mut child, session);
                Some(StartCompletion::failed(
                    session,
                    BackendError::with_source(
                        format!("{integration} backend did not start"),
                        error,
                    ),
                ))
            }
        }
    }

    fn reap_retiring(&mut self, now: Instant) {
        self.retiring.retain_mut(|retiring| !retiring.reap(now));
    }
}

fn spawn(launch: &LaunchSpec) -> Result<(Child, StdioTransport), AdapterError> {
    debug!(
        target: ADAPTER_TARGET,
        integration = %launch.integration,
        command = %launch.executable,
        args = ?launch.args,
        "spawning backend process"
    );

    let mut child = launch.command().spawn().map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            AdapterError::BinaryNotFound {
                command: launch.executable.clone(),
                source,
            }
        } else {
            AdapterError::SpawnFailed {
                message: launch.executable.clone(),
                source,
            }
        }
    })?;

    let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(AdapterError::SpawnFailed {
            message: format!("{} without piped stdio", launch.executable),
            source: io::Error::other("stdio not piped"),
        });
    };

    debug!(
        target: ADAPTER_TARGET,
        integration = %launch.integration,
        pid = child.id(),
        "backend process spawned"
    );
    Ok((child, StdioTransport::from_child(stdout, stdin)))
}

impl SessionTransport for ProcessTransport {
    fn start(&mut self, request: &StartRequest) -> Result<StartOutcome, BackendError> {
        let handshake = self.begin_handshake(request).map_err(|error| {
            BackendError::with_source(
                format!("{} backend did not start", request.launch.integration),
                error,
            )
        })?;

        debug!(
            target: ADAPTER_TARGET,
            session = %request.session,
            scope = %request.scope,
            pid = handshake.child.id(),
            "handshake pending"
        );
        if let Some(mut previous) = self
            .slots
            .insert(request.session, Slot::Handshaking(handshake))
        {
            kill_child(previous.child_mut(), request.session);
        }
        Ok(StartOutcome::Pending)
    }

    fn poll_completions(&mut self) -> Vec<StartCompletion> {
        let now = Instant::now();
        self.reap_retiring(now);

        let due: Vec<SessionId> = self
            .slots
            .iter()
            .filter_map(|(session, slot)| match slot {
                Slot::Handshaking(handshake)
                    if handshake.worker.is_finished() || now >= handshake.deadline =>
                {
                    Some(*session)
                }
                _ => None,
            })
            .collect();
        due.into_iter()
            .filter_map(|session| self.settle(session))
            .collect()
    }

    fn stop(&mut self, session: SessionId) {
        match self.slots.remove(&session) {
            None => debug!(target: ADAPTER_TARGET, %session, "no backend to stop"),
            Some(Slot::Handshaking(mut handshake)) => {
                debug!(target: ADAPTER_TARGET, %session, "stopping backend mid-handshake");
                kill_child(&mut handshake.child, session);
            }
            Some(Slot::Ready(Connection { child, mut channel })) => {
                let spawned = thread::Builder::new()
                    .name(format!("vuln-lsp-shutdown-{session}"))
                    .spawn(move || {
                        handshake::shutdown(&mut channel);
                        // Dropping the channel closes stdin for backends that ignore `exit`.
                    });
                if let Err(error) = spawned {
                    warn!(
                        target: ADAPTER_TARGET,
                        %session,
                        %error,
                        "could not send shutdown, killing backend"
                    );
                }
                self.retiring.push(Retiring::new(session, child));
            }
        }
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        for (session, mut slot) in self.slots.drain() {
            kill_child(slot.child_mut(), session);
        }
        for retiring in self.retiring.drain(..) {
            retiring.finish();
        }
    }
}

impl fmt::Debug for ProcessTransport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pids: Vec<(SessionId, u32)> = self
            .slots
            .iter()
            .map(|(session, slot)| (*session, slot.pid()))
            .collect();
        formatter
            .debug_struct("ProcessTransport")
            .field("backends", &pids)
            .field("retiring", &self.retiring.len())
            .field("handshake_timeout", &self.handshake_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use std::sync::Arc;
    #[cfg(unix)]
    use std::sync::mpsc;

    use rstest::rstest;
    use vuln_lsp_config::{CapabilityToggles, IntegrationConfig, LaunchMode};

    use super::*;
    use crate::capability::CapabilityDeclaration;
    use crate::scope::ProjectScope;

    fn request_for(launch: LaunchSpec) -> StartRequest {
        StartRequest {
            session: SessionId::new(1),
            scope: ProjectScope::new("workspace"),
            capabilities: Arc::new(CapabilityDeclaration::declare(
                launch.integration.clone(),
                CapabilityToggles::default(),
            )),
            launch,
        }
    }

    fn adapter_source(error: &BackendError) -> &AdapterError {
        error
            .source()
            .and_then(|source| source.downcast_ref::<AdapterError>())
            .expect("adapter error source")
    }

    #[rstest]
    fn missing_binary_is_reported_as_not_found() {
        let mut config = IntegrationConfig::vuln_lsp();
        config.server.executable = String::from("vuln-lsp-definitely-not-installed");
        let request = request_for(LaunchSpec::from_config(&config, LaunchMode::Run));
        let mut transport = ProcessTransport::new();

        let error = transport.start(&request).expect_err("binary is missing");

        assert!(matches!(
            adapter_source(&error),
            AdapterError::BinaryNotFound { command, .. }
                if command == "vuln-lsp-definitely-not-installed"
        ));
        assert_eq!(transport.connection_count(), 0);
        assert_eq!(transport.pending_count(), 0);
    }

    #[rstest]
    fn stopping_an_unknown_session_is_a_no_op() {
        let mut transport = ProcessTransport::new();

        transport.stop(SessionId::new(9));

        assert_eq!(transport.connection_count(), 0);
        assert_eq!(transport.retiring_count(), 0);
    }

    #[cfg(unix)]
    fn shell_backend(script: &str) -> LaunchSpec {
        let mut launch =
            LaunchSpec::from_config(&IntegrationConfig::vuln_lsp(), LaunchMode::Run);
        launch.executable = String::from("sh");
        launch.args = vec![String::from("-c"), script.to_owned()];
        launch
    }

    #[cfg(unix)]
    fn scripted_backend(payloads: &[&str]) -> LaunchSpec {
        let mut script = String::new();
        for payload in payloads {
            script.push_str(&format!(
                "printf 'Content-Length: {}\\r\\n\\r\\n%s' '{payload}'; ",
                payload.len()
            ));
        }
        script.push_str("cat > /dev/null");
        shell_backend(&script)
    }

    /// Polls until a completion arrives, failing after five seconds.
    #[cfg(unix)]
    fn next_completion(transport: &mut ProcessTransport) -> StartCompletion {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(completion) = transport.poll_completions().pop() {
                return completion;
            }
            assert!(Instant::now() < deadline, "handshake never settled");
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[cfg(unix)]
    #[rstest]
    fn starts_and_stops_a_scripted_backend() {
        let launch = scripted_backend(&[
            r#"{"jsonrpc":"2.0","id":1,"result":{"capabilities":{}}}"#,
            r#"{"jsonrpc":"2.0","id":2,"result":null}"#,
        ]);
        let request = request_for(launch);
        let mut transport = ProcessTransport::new();

        let outcome = transport.start(&request).expect("backend should spawn");
        assert_eq!(outcome, StartOutcome::Pending);
        assert_eq!(transport.pending_count(), 1);

        let completion = next_completion(&mut transport);
        assert_eq!(completion.session, request.session);
        assert!(completion.result.is_ok());
        assert!(transport.is_connected(request.session));

        transport.stop(request.session);
        assert!(!transport.is_connected(request.session));
        assert_eq!(transport.retiring_count(), 1);

        let deadline = Instant::now() + Duration::from_secs(5);
        while transport.retiring_count() > 0 {
            assert!(Instant::now() < deadline, "backend was never reaped");
            transport.poll_completions();
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[cfg(unix)]
    #[rstest]
    fn backend_that_exits_before_handshake_fails_to_start() {
        let mut transport = ProcessTransport::new();

        let outcome = transport
            .start(&request_for(shell_backend("exit 0")))
            .expect("process spawns");
        assert_eq!(outcome, StartOutcome::Pending);

        let completion = next_completion(&mut transport);
        let error = completion.result.expect_err("handshake cannot complete");
        assert!(error.message().contains("vuln-lsp"));
        assert!(matches!(adapter_source(&error), AdapterError::Transport(_)));
        assert_eq!(transport.connection_count(), 0);
        assert_eq!(transport.pending_count(), 0);
    }

    #[cfg(unix)]
    #[rstest]
    fn silent_backend_does_not_block_start_and_times_out() {
        let (sender, receiver) = mpsc::channel();
        let starter = thread::spawn(move || {
            let timeout = Duration::from_millis(200);
            let mut transport = ProcessTransport::with_handshake_timeout(timeout);
            let outcome = transport.start(&request_for(shell_backend("cat > /dev/null")));
            let _ = sender.send(outcome.map_err(|error| error.to_string()));
            transport
        });

        let outcome = receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("start returned without waiting on the backend");
        assert_eq!(outcome, Ok(StartOutcome::Pending));
        let mut transport = starter.join().expect("starter thread");

        let completion = next_completion(&mut transport);
        let error = completion.result.expect_err("backend never answers");
        assert!(matches!(
            adapter_source(&error),
            AdapterError::Timeout { timeout } if *timeout == Duration::from_millis(200)
        ));
        assert_eq!(transport.pending_count(), 0);
        assert_eq!(transport.connection_count(), 0);
    }

    #[cfg(unix)]
    #[rstest]
    fn stopping_mid_handshake_kills_the_backend() {
        let request = request_for(shell_backend("cat > /dev/null"));
        let mut transport = ProcessTransport::new();

        transport.start(&request).expect("process spawns");
        transport.stop(request.session);

        assert_eq!(transport.pending_count(), 0);
        assert_eq!(transport.retiring_count(), 0);
        assert!(transport.poll_completions().is_empty());
    }
}
