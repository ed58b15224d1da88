//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! Settings.toml (the service's configuration package)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HostConfig (validated, immutable)
//!     → read once by main.rs, never reloaded
//! ```
//!
//! # Design Decisions
//! - Read once at startup; a changed certificate thumbprint needs a restart
//! - All sections have defaults so a settings file may carry only `[Https]`
//! - Validation separates syntactic (serde) from semantic checks
//! - Port and bind address come from the orchestration runtime, not this file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    EndpointSettings, HostConfig, HttpsConfig, ObservabilityConfig, ServerConfig,
    TrustStoreConfig,
};
pub use validation::{validate_config, ValidationError};
