//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! EndpointConfig (bind address + assigned port)
//!     → listener.rs (bind TCP, wrap into BoundListener)
//!     → tls.rs (rustls config from the resolved certificate)
//!     → BoundListener handed to the request handler factory
//!     → per connection: TLS handshake (observed) → HTTP layer
//! ```
//!
//! # Design Decisions
//! - TLS is mandatory; a BoundListener can only be served through TLS
//! - Each handshake runs on its own connection task, failures never reach the listener
//! - Handshakes are bounded by a timeout so stalled clients cannot pin a task

pub mod listener;
pub mod tls;

pub use listener::{bind, BoundListener};
pub use tls::{server_config, HandshakeObserver};
