//! Identity of the running service instance.

use serde::Serialize;
use uuid::Uuid;

/// Process-scoped description of this service instance.
///
/// Created once at startup and shared with the request handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceContext {
    /// Application the service belongs to.
    pub application_name: String,
    /// Service (code package) name.
    pub service_name: String,
    /// Node the instance was placed on.
    pub node_name: String,
    /// Endpoint resource the listener serves.
    pub endpoint_name: String,
    /// Unique per process start.
    pub instance_id: Uuid,
}

impl ServiceContext {
    pub fn new(
        application_name: impl Into<String>,
        service_name: impl Into<String>,
        node_name: impl Into<String>,
        endpoint_name: impl Into<String>,
    ) -> Self {
        Self {
            application_name: application_name.into(),
            service_name: service_name.into(),
            node_name: node_name.into(),
            endpoint_name: endpoint_name.into(),
            instance_id: Uuid::new_v4(),
        }
    }
}
