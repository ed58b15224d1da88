//! Activation context: what the orchestration runtime assigned to this process.
//!
//! # Responsibilities
//! - Look up the port assigned to a named endpoint resource
//! - Describe the running instance (application, service, node)
//!
//! # Design Decisions
//! - `EnvActivationContext` snapshots the process environment once, the way
//!   the runtime publishes assignments (`Fabric_Endpoint_<name>`, ...)
//! - `StaticActivationContext` stands in outside a cluster and in tests
//! - Ports are returned unvalidated; range checks belong to the bootstrap

use std::collections::HashMap;

use thiserror::Error;

use crate::orchestration::service_context::ServiceContext;

const ENDPOINT_PREFIX: &str = "Fabric_Endpoint_";
const APPLICATION_NAME: &str = "Fabric_ApplicationName";
const CODE_PACKAGE_NAME: &str = "Fabric_CodePackageName";
const NODE_NAME: &str = "Fabric_NodeName";

/// Errors raised while reading the activation context.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("endpoint resource {0} has no port assigned by the runtime")]
    MissingEndpoint(String),
    #[error("endpoint resource {name} has a non-numeric port {value:?}")]
    InvalidPort { name: String, value: String },
}

/// An endpoint resource with the port the runtime assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResource {
    pub name: String,
    pub port: u32,
}

/// Source of runtime-assigned settings for this process.
pub trait ActivationContext: Send + Sync {
    /// Port assigned to the named endpoint resource.
    fn endpoint(&self, name: &str) -> Result<EndpointResource, OrchestrationError>;

    /// Identity of this instance, for the given endpoint.
    fn service_context(&self, endpoint_name: &str) -> ServiceContext;
}

/// Activation context read from the environment the runtime sets up.
#[derive(Debug, Clone, Default)]
pub struct EnvActivationContext {
    vars: HashMap<String, String>,
}

impl EnvActivationContext {
    /// Snapshot the current process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build from explicit variables.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    fn var_or(&self, key: &str, fallback: &str) -> String {
        self.vars
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl ActivationContext for EnvActivationContext {
    fn endpoint(&self, name: &str) -> Result<EndpointResource, OrchestrationError> {
        let key = format!("{}{}", ENDPOINT_PREFIX, name);
        let value = self
            .vars
            .get(&key)
            .ok_or_else(|| OrchestrationError::MissingEndpoint(name.to_string()))?;
        let port = value
            .trim()
            .parse::<u32>()
            .map_err(|_| OrchestrationError::InvalidPort {
                name: name.to_string(),
                value: value.clone(),
            })?;
        Ok(EndpointResource {
            name: name.to_string(),
            port,
        })
    }

    fn service_context(&self, endpoint_name: &str) -> ServiceContext {
        let node = self.var_or("HOSTNAME", "localhost");
        ServiceContext::new(
            self.var_or(APPLICATION_NAME, "standalone"),
            self.var_or(CODE_PACKAGE_NAME, env!("CARGO_PKG_NAME")),
            self.var_or(NODE_NAME, &node),
            endpoint_name,
        )
    }
}

/// Fixed activation context.
#[derive(Debug, Clone)]
pub struct StaticActivationContext {
    ports: HashMap<String, u32>,
    application_name: String,
    service_name: String,
    node_name: String,
}

impl StaticActivationContext {
    pub fn new(application_name: impl Into<String>, service_name: impl Into<String>, node_name: impl Into<String>) -> Self {
        Self {
            ports: HashMap::new(),
            application_name: application_name.into(),
            service_name: service_name.into(),
            node_name: node_name.into(),
        }
    }

    /// Assign a port to an endpoint resource.
    pub fn with_endpoint(mut self, name: impl Into<String>, port: u32) -> Self {
        self.ports.insert(name.into(), port);
        self
    }
}

impl Default for StaticActivationContext {
    fn default() -> Self {
        Self::new("standalone", env!("CARGO_PKG_NAME"), "localhost")
    }
}

impl ActivationContext for StaticActivationContext {
    fn endpoint(&self, name: &str) -> Result<EndpointResource, OrchestrationError> {
        self.ports
            .get(name)
            .map(|port| EndpointResource {
                name: name.to_string(),
                port: *port,
            })
            .ok_or_else(|| OrchestrationError::MissingEndpoint(name.to_string()))
    }

    fn service_context(&self, endpoint_name: &str) -> ServiceContext {
        ServiceContext::new(
            self.application_name.clone(),
            self.service_name.clone(),
            self.node_name.clone(),
            endpoint_name,
        )
    }
}
