//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate endpoint → Resolve certificate → Bind → Wrap TLS → Hand off to handler
//!
//! Running (running.rs):
//!     Supervise the handler's server task → report its outcome through wait()
//!
//! Shutdown (shutdown.rs):
//!     stop() → signal handler → close listener, drain → abort after grace period
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop()
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and nothing stays bound
//! - Single start attempt, no retries; the orchestrator decides about restarts
//! - Shutdown has a deadline: forced abort after the grace period

pub mod running;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use running::RunningServer;
pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{
    BootstrapError, EndpointConfig, HandlerError, ListenerBootstrap, RequestHandlerFactory,
    ServerFuture,
};
pub use state::ServerState;
