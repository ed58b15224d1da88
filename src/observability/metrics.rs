//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Count failed TLS negotiations
//! - Publish the listener's lifecycle state
//! - Expose a Prometheus-compatible metrics endpoint when enabled
//!
//! # Metrics
//! - `https_tls_handshake_failures_total` (counter): failed TLS negotiations
//! - `https_listener_state` (gauge, label `state`): 1 for the current state, 0 otherwise

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::lifecycle::ServerState;

pub const HANDSHAKE_FAILURES: &str = "https_tls_handshake_failures_total";
pub const LISTENER_STATE: &str = "https_listener_state";

const STATES: [ServerState; 6] = [
    ServerState::Created,
    ServerState::Starting,
    ServerState::Running,
    ServerState::Stopping,
    ServerState::Stopped,
    ServerState::Failed,
];

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_handshake_failure() {
    metrics::counter!(HANDSHAKE_FAILURES).increment(1);
}

pub fn record_server_state(current: ServerState) {
    for state in STATES {
        let value = if state == current { 1.0 } else { 0.0 };
        metrics::gauge!(LISTENER_STATE, "state" => state.as_str()).set(value);
    }
}
