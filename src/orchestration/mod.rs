//! Orchestration runtime integration.
//!
//! # Data Flow
//! ```text
//! Runtime starts the process with its activation environment
//!     → activation.rs (assigned endpoint ports, instance identity)
//!     → service_context.rs (ServiceContext handed to the request handler)
//! ```
//!
//! # Design Decisions
//! - The host only reads what the runtime assigns; registration, health
//!   reporting and placement stay with the runtime
//! - The context is an explicit value passed to the handler factory, not a
//!   global the handler has to look up

pub mod activation;
pub mod service_context;

pub use activation::{
    ActivationContext, EndpointResource, EnvActivationContext, OrchestrationError,
    StaticActivationContext,
};
pub use service_context::ServiceContext;
