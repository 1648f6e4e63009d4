//! Recording session transport used in tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::{
    BackendError, SessionTransport, StartCompletion, StartOutcome, StartRequest,
};
use crate::session::SessionId;

/// How the transport answers the next start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartBehaviour {
    /// Report the handshake as complete.
    Running,
    /// Leave the handshake in flight.
    Pending,
    /// Fail as if the executable were missing.
    Fail,
}

#[derive(Debug)]
struct RecordingState {
    default: StartBehaviour,
    queued: VecDeque<StartBehaviour>,
    starts: Vec<StartRequest>,
    stops: Vec<SessionId>,
    settled: Vec<StartCompletion>,
}

/// Test double that records every start and stop routed through it.
///
/// Clones share state, so a test can keep one clone for inspection while the
/// session manager owns another.
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    shared: Arc<Mutex<RecordingState>>,
}

impl RecordingTransport {
    /// Creates a transport answering every start with `behaviour`.
    pub fn new(behaviour: StartBehaviour) -> Self {
        Self {
            shared: Arc::new(Mutex::new(RecordingState {
                default: behaviour,
                queued: VecDeque::new(),
                starts: Vec::new(),
                stops: Vec::new(),
                settled: Vec::new(),
            })),
        }
    }

    /// Creates a transport whose starts complete immediately.
    pub fn running() -> Self {
        Self::new(StartBehaviour::Running)
    }

    /// Overrides the answer for the next start only.
    pub fn queue(&self, behaviour: StartBehaviour) {
        self.state().queued.push_back(behaviour);
    }

    /// Changes the answer for all later starts.
    pub fn set_default(&self, behaviour: StartBehaviour) {
        self.state().default = behaviour;
    }

    /// Settles a pending handshake on the next poll.
    pub fn settle(&self, completion: StartCompletion) {
        self.state().settled.push(completion);
    }

    /// Start requests received so far.
    pub fn starts(&self) -> Vec<StartRequest> {
        self.state().starts.clone()
    }

    /// Number of start requests received so far.
    pub fn start_count(&self) -> usize {
        self.state().starts.len()
    }

    /// Sessions stopped so far.
    pub fn stops(&self) -> Vec<SessionId> {
        self.state().stops.clone()
    }

    fn state(&self) -> MutexGuard<'_, RecordingState> {
        self.shared
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl SessionTransport for RecordingTransport {
    fn start(&mut self, request: &StartRequest) -> Result<StartOutcome, BackendError> {
        let mut state = self.state();
        state.starts.push(request.clone());
        let behaviour = state.queued.pop_front().unwrap_or(state.default);
        match behaviour {
            StartBehaviour::Running => Ok(StartOutcome::Running),
            StartBehaviour::Pending => Ok(StartOutcome::Pending),
            StartBehaviour::Fail => Err(BackendError::new(format!(
                "{}: executable not found",
                request.launch.executable
            ))),
        }
    }

    fn poll_completions(&mut self) -> Vec<StartCompletion> {
        std::mem::take(&mut self.state().settled)
    }

    fn stop(&mut self, session: SessionId) {
        self.state().stops.push(session);
    }
}
