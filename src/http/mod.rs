//! Default request handling.
//!
//! # Data Flow
//! ```text
//! BoundListener (TLS)
//!     → server.rs (axum-server with rustls acceptor, graceful drain)
//!     → request.rs (request ID, tracing span)
//!     → /instance (ServiceContext as JSON) or static content root
//! ```
//!
//! The host itself does not route. This handler stands in for the web
//! front-end that a deployment plugs in through `RequestHandlerFactory`.

pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{build_router, AxumHandlerFactory};
