//! Process termination for backend sessions.

use std::process::Child;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::session::SessionId;

/// Log target for adapter operations.
pub(crate) const ADAPTER_TARGET: &str = "vuln_lsp_bootstrap::adapter";

/// How long a stopped backend gets to exit on its own before it is killed.
pub(super) const EXIT_GRACE_PERIOD: Duration = Duration::from_secs(2);

const REAP_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A stopped backend waiting to exit after `shutdown` and `exit`.
pub(super) struct Retiring {
    session: SessionId,
    child: Child,
    deadline: Instant,
}

impl Retiring {
    pub(super) fn new(session: SessionId, child: Child) -> Self {
        Self {
            session,
            child,
            deadline: Instant::now() + EXIT_GRACE_PERIOD,
        }
    }

    /// Reaps the child if it exited, killing it once the grace period ends.
    ///
    /// Returns `true` when nothing is left to wait for.
    pub(super) fn reap(&mut self, now: Instant) -> bool {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!(
                    target: ADAPTER_TARGET,
                    session = %self.session,
                    ?status,
                    "backend exited"
                );
                return true;
            }
            Ok(None) => {}
            Err(error) => {
                warn!(
                    target: ADAPTER_TARGET,
                    session = %self.session,
                    %error,
                    "failed to check backend status"
                );
            }
        }

        if now < self.deadline {
            return false;
        }
        debug!(
            target: ADAPTER_TARGET,
            session = %self.session,
            "backend ignored exit, killing"
        );
        kill_child(&mut self.child, self.session);
        true
    }

    /// Blocks until the child is reaped, at most until the grace period ends.
    pub(super) fn finish(mut self) {
        while !self.reap(Instant::now()) {
            thread::sleep(REAP_POLL_INTERVAL);
        }
    }
}

/// Kills the child without waiting for a graceful exit.
pub(super) fn kill_child(child: &mut Child, session: SessionId) {
    if let Err(error) = child.kill() {
        warn!(
            target: ADAPTER_TARGET,
            %session,
            %error,
            "failed to kill backend process"
        );
        return;
    }
    let _ = child.wait();
}
