//! The running HTTPS listener.
//!
//! # Responsibilities
//! - Supervise the request handler's server task
//! - Stop it gracefully, with a hard deadline
//! - Report how it ended, as often as asked
//!
//! # Design Decisions
//! - `stop()` and `wait()` may be called from any task, any number of times
//! - The supervisor records the outcome before publishing `Stopped`, so a
//!   waiter that sees `Stopped` always sees the outcome too
//! - An aborted server task counts as a clean stop

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::AbortHandle;

use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::startup::{BootstrapError, ServerFuture};
use crate::lifecycle::state::{self, ServerState};

/// Handle to a listener that reached `Running`.
#[derive(Debug, Clone)]
pub struct RunningServer {
    local_addr: SocketAddr,
    state: Arc<watch::Sender<ServerState>>,
    shutdown: Arc<Shutdown>,
    grace: Duration,
    abort: AbortHandle,
    outcome: Arc<Mutex<Option<(io::ErrorKind, String)>>>,
    handshake_failures: Arc<AtomicU64>,
}

impl RunningServer {
    pub(crate) fn spawn(
        server: ServerFuture,
        local_addr: SocketAddr,
        state: Arc<watch::Sender<ServerState>>,
        shutdown: Shutdown,
        grace: Duration,
        handshake_failures: Arc<AtomicU64>,
    ) -> Self {
        // Published before the task exists so an immediate failure cannot be
        // overwritten by a late `Running`.
        state::transition(&state, ServerState::Running);

        let task = tokio::spawn(server);
        let abort = task.abort_handle();
        let outcome = Arc::new(Mutex::new(None));

        let supervisor_state = Arc::clone(&state);
        let supervisor_outcome = Arc::clone(&outcome);
        tokio::spawn(async move {
            let result = match task.await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => Ok(()),
                Err(e) => Err(io::Error::other(format!("server task panicked: {}", e))),
            };

            match result {
                Ok(()) => {
                    tracing::info!(address = %local_addr, "Listener stopped");
                }
                Err(e) => {
                    tracing::error!(address = %local_addr, error = %e, "Listener failed");
                    *supervisor_outcome.lock() = Some((e.kind(), e.to_string()));
                    state::transition_from(
                        &supervisor_state,
                        ServerState::Running,
                        ServerState::Stopping,
                    );
                }
            }

            state::transition(&supervisor_state, ServerState::Stopped);
        });

        Self {
            local_addr,
            state,
            shutdown: Arc::new(shutdown),
            grace,
            abort,
            outcome,
            handshake_failures,
        }
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// TLS negotiations that failed since the listener started.
    pub fn handshake_failures(&self) -> u64 {
        self.handshake_failures.load(Ordering::Relaxed)
    }

    /// Stop accepting, drain, and release the port.
    ///
    /// Only the first call does the work; later calls return immediately.
    pub async fn stop(&self) {
        if !state::transition_from(&self.state, ServerState::Running, ServerState::Stopping) {
            return;
        }

        tracing::info!(
            address = %self.local_addr,
            grace_secs = self.grace.as_secs_f64(),
            "Stopping listener"
        );
        self.shutdown.trigger();

        let drained = tokio::time::timeout(self.grace, self.stopped()).await.is_ok();
        if !drained {
            tracing::warn!(address = %self.local_addr, "Grace period elapsed, aborting listener");
            self.abort.abort();
            self.stopped().await;
        }
    }

    /// Resolve once the listener has stopped, with the reason it stopped.
    pub async fn wait(&self) -> Result<(), BootstrapError> {
        self.stopped().await;

        match self.outcome.lock().as_ref() {
            Some((kind, message)) => Err(BootstrapError::ListenerIo(io::Error::new(
                *kind,
                message.clone(),
            ))),
            None => Ok(()),
        }
    }

    async fn stopped(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so this only returns on `Stopped`.
        let _ = rx.wait_for(|state| *state == ServerState::Stopped).await;
    }
}
