//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Bootstrap, listener and handler produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (collected by the orchestrator)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event (address, thumbprint, state)
//! - `RUST_LOG` overrides the configured level
//! - Metrics are cheap (atomic increments) and no-ops without an exporter

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
