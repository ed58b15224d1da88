//! HTTPS listener bootstrap for an orchestrated web front-end.
//!
//! # Architecture Overview
//!
//! ```text
//!   Orchestration runtime
//!          │  endpoint port, identity
//!          ▼
//!   ┌──────────────┐   thumbprint   ┌─────────────────────┐
//!   │ orchestration│──────────────▶ │ trust               │
//!   │ + config     │                │ CertificateResolver │──▶ machine trust store
//!   └──────┬───────┘                └──────────┬──────────┘
//!          │ EndpointConfig                    │ Certificate
//!          ▼                                   ▼
//!   ┌──────────────────────────────────────────────────┐
//!   │ lifecycle::ListenerBootstrap                      │
//!   │   bind (net::listener) → TLS (net::tls)           │
//!   └──────────────────────┬───────────────────────────┘
//!                          │ BoundListener + ServiceContext
//!                          ▼
//!   ┌──────────────────────────────────────────────────┐
//!   │ RequestHandlerFactory (http::AxumHandlerFactory)  │
//!   └──────────────────────┬───────────────────────────┘
//!                          ▼
//!                  lifecycle::RunningServer (stop / wait)
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod trust;

// Host integration
pub mod lifecycle;
pub mod orchestration;

// Cross-cutting concerns
pub mod observability;

pub use config::HostConfig;
pub use http::AxumHandlerFactory;
pub use lifecycle::{
    BootstrapError, EndpointConfig, ListenerBootstrap, RequestHandlerFactory, RunningServer,
    ServerState,
};
pub use orchestration::ServiceContext;
pub use trust::{CertificateResolver, Thumbprint};
