//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the certificate thumbprint is present (its shape is left to the
//!   trust store lookup)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HostConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::HostConfig;
use crate::trust::Thumbprint;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Https.CertificateThumbprint is required")]
    MissingThumbprint,
    #[error("endpoint.name must not be empty")]
    EmptyEndpointName,
    #[error("trust_store.path must not be empty")]
    EmptyTrustStorePath,
    #[error("server.{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),
    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &HostConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if Thumbprint::parse(&config.https.certificate_thumbprint).is_err() {
        errors.push(ValidationError::MissingThumbprint);
    }

    if config.endpoint.name.trim().is_empty() {
        errors.push(ValidationError::EmptyEndpointName);
    }

    if config.trust_store.path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyTrustStorePath);
    }

    if config.server.shutdown_grace_secs == 0 {
        errors.push(ValidationError::ZeroDuration("shutdown_grace_secs"));
    }
    if config.server.handshake_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("handshake_timeout_secs"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> HostConfig {
        let mut config = HostConfig::default();
        config.https.certificate_thumbprint = "aa bb cc dd ee ff 00 11 22 33 44 55 66 77 88 99 aa bb cc dd".into();
        config
    }

    #[test]
    fn accepts_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let mut config = valid_config();
        config.https.certificate_thumbprint = " : ".into();
        config.endpoint.name = " ".into();
        config.server.handshake_timeout_secs = 0;
        config.observability.log_level = "loud".into();
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(matches!(errors[0], ValidationError::MissingThumbprint));
        assert!(matches!(errors[1], ValidationError::EmptyEndpointName));
        assert!(matches!(errors[2], ValidationError::ZeroDuration("handshake_timeout_secs")));
        assert!(matches!(errors[3], ValidationError::UnknownLogLevel(_)));
        assert!(matches!(errors[4], ValidationError::InvalidMetricsAddress(_)));
    }

    #[test]
    fn missing_thumbprint_is_reported() {
        let errors = validate_config(&HostConfig::default()).unwrap_err();
        assert!(matches!(errors[0], ValidationError::MissingThumbprint));
    }

    #[test]
    fn short_thumbprint_is_left_to_the_lookup() {
        let mut config = valid_config();
        config.https.certificate_thumbprint = "DEADBEEF".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn metrics_address_ignored_when_disabled() {
        let mut config = valid_config();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());
    }
}
