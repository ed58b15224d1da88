//! Configuration schema definitions.
//!
//! The `[Https]` section keeps the key names of the configuration package the
//! service has always shipped with (`CertificateThumbprint`); the remaining
//! sections are host settings with snake_case keys.

use std::net::IpAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the service host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// HTTPS settings (certificate selection).
    #[serde(rename = "Https")]
    pub https: HttpsConfig,

    /// Location of the machine-level certificate store.
    pub trust_store: TrustStoreConfig,

    /// Endpoint resource to listen on.
    pub endpoint: EndpointSettings,

    /// Behaviour of the running server.
    pub server: ServerConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// The `[Https]` section.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HttpsConfig {
    /// Hex thumbprint of the server certificate. Required.
    #[serde(rename = "CertificateThumbprint")]
    pub certificate_thumbprint: String,
}

/// Trust store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrustStoreConfig {
    /// Directory holding one PEM bundle (chain + private key) per certificate.
    pub path: PathBuf,
}

impl Default for TrustStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/etc/blazorfront/certs"),
        }
    }
}

/// Endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointSettings {
    /// Name of the endpoint resource the orchestrator assigns a port to.
    pub name: String,

    /// Address to bind on; all interfaces unless overridden.
    pub bind_address: IpAddr,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            name: "EndpointHttps".to_string(),
            bind_address: IpAddr::from([0, 0, 0, 0]),
        }
    }
}

/// Running server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory served as static content by the default request handler.
    /// Defaults to the working directory.
    pub content_root: PathBuf,

    /// How long `stop()` waits for in-flight work before aborting, in seconds.
    pub shutdown_grace_secs: u64,

    /// Upper bound on a single TLS handshake, in seconds.
    pub handshake_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            content_root: PathBuf::from("."),
            shutdown_grace_secs: 10,
            handshake_timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_section_uses_configuration_package_names() {
        let config: HostConfig = toml::from_str(
            r#"
            [Https]
            CertificateThumbprint = "AB:CD"
            "#,
        )
        .unwrap();

        assert_eq!(config.https.certificate_thumbprint, "AB:CD");
        assert_eq!(config.endpoint.name, "EndpointHttps");
        assert!(config.endpoint.bind_address.is_unspecified());
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config: HostConfig = toml::from_str("").unwrap();
        assert!(config.https.certificate_thumbprint.is_empty());
        assert_eq!(config.server.shutdown_grace_secs, 10);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn content_root_defaults_to_working_directory() {
        let config: HostConfig = toml::from_str("[server]\nshutdown_grace_secs = 5\n").unwrap();
        assert_eq!(config.server.content_root, PathBuf::from("."));
        assert_eq!(config.server.shutdown_grace_secs, 5);
    }
}
