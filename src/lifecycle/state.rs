//! Server lifecycle states.
//!
//! # State Transitions
//! ```text
//! Created → Starting → Running → Stopping → Stopped
//!              │                    ↑
//!              ↓          Running ──┘ (listener error)
//!            Failed
//! ```
//!
//! `Failed` is only reachable from `Starting`. Errors after `Running` end in
//! `Stopped` and are reported through `RunningServer::wait`.

use std::fmt;

use tokio::sync::watch;

use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Created,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

impl ServerState {
    /// No further transitions happen from this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, ServerState::Stopped | ServerState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServerState::Created => "created",
            ServerState::Starting => "starting",
            ServerState::Running => "running",
            ServerState::Stopping => "stopping",
            ServerState::Stopped => "stopped",
            ServerState::Failed => "failed",
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Move to `next`, logging and recording the change.
pub(crate) fn transition(state: &watch::Sender<ServerState>, next: ServerState) {
    let previous = state.send_replace(next);
    record(previous, next);
}

/// Move to `next` only when currently in `from`. Returns whether it moved.
pub(crate) fn transition_from(
    state: &watch::Sender<ServerState>,
    from: ServerState,
    next: ServerState,
) -> bool {
    let moved = state.send_if_modified(|current| {
        if *current == from {
            *current = next;
            true
        } else {
            false
        }
    });
    if moved {
        record(from, next);
    }
    moved
}

fn record(previous: ServerState, next: ServerState) {
    tracing::debug!(from = %previous, to = %next, "Server state changed");
    metrics::record_server_state(next);
}
