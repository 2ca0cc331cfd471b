//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses parse and timeouts are non-zero
//! - Check static directory records are complete
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{DirectoryKind, ProxyConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_target().is_none() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a host:port address", config.listener.bind_address),
        ));
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() || tls.key_path.is_empty() {
            errors.push(ValidationError::new(
                "listener.tls",
                "cert_path and key_path are both required",
            ));
        }
    }

    let directory = &config.directory;
    match directory.kind {
        DirectoryKind::Mongo => {
            if directory.uri.is_empty() {
                errors.push(ValidationError::new("directory.uri", "must not be empty"));
            }
            if directory.database.is_empty() {
                errors.push(ValidationError::new("directory.database", "must not be empty"));
            }
            if directory.collection.is_empty() {
                errors.push(ValidationError::new("directory.collection", "must not be empty"));
            }
        }
        DirectoryKind::Static => {
            for (i, record) in directory.records.iter().enumerate() {
                if record.id.is_empty() || record.local_addr.is_empty() {
                    errors.push(ValidationError::new(
                        format!("directory.records[{}]", i),
                        "id and local_addr must not be empty",
                    ));
                }
            }
        }
    }
    if directory.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("directory.connect_timeout_secs", "must be > 0"));
    }
    if directory.query_timeout_secs == 0 {
        errors.push(ValidationError::new("directory.query_timeout_secs", "must be > 0"));
    }

    if config.routing.tunnel_type.is_empty() {
        errors.push(ValidationError::new("routing.tunnel_type", "must not be empty"));
    }

    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.connect_timeout_secs", "must be > 0"));
    }
    if config.upstream.response_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.response_timeout_secs", "must be > 0"));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
