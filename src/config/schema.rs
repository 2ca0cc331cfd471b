//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::directory::BackendRecord;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Directory service the backends are resolved from.
    pub directory: DirectoryConfig,

    /// Identifier and query shaping.
    pub routing: RoutingConfig,

    /// Outbound connection settings.
    pub upstream: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address. A bare `:port` binds every interface.
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: ":8081".to_string(),
            tls: None,
        }
    }
}

impl ListenerConfig {
    /// The `host:port` to bind. Hostnames are resolved at bind time.
    ///
    /// Returns `None` unless the address ends in a numeric port.
    pub fn bind_target(&self) -> Option<String> {
        let (host, port) = self.bind_address.rsplit_once(':')?;
        port.parse::<u16>().ok()?;

        let host = if host.is_empty() { "0.0.0.0" } else { host };
        Some(format!("{}:{}", host, port))
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Which directory implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryKind {
    #[default]
    Mongo,
    /// Records listed under `directory.records`.
    Static,
}

/// Directory service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub kind: DirectoryKind,

    /// MongoDB host or connection string.
    pub uri: String,

    pub database: String,

    pub collection: String,

    /// Connect and server selection timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Upper bound on a single lookup in seconds.
    pub query_timeout_secs: u64,

    /// Records served when `kind = "static"`.
    pub records: Vec<StaticRecord>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            kind: DirectoryKind::Mongo,
            uri: "db".to_string(),
            database: "cpe".to_string(),
            collection: "cpes".to_string(),
            connect_timeout_secs: 120,
            query_timeout_secs: 10,
            records: Vec::new(),
        }
    }
}

impl DirectoryConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// A directory record declared inline in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticRecord {
    pub id: String,
    pub tunnel_type: String,
    pub local_addr: String,
}

impl From<&StaticRecord> for BackendRecord {
    fn from(record: &StaticRecord) -> Self {
        BackendRecord::new(&record.id, &record.tunnel_type, &record.local_addr)
    }
}

/// Query shaping for backend resolution.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Substring the record's tunnel type must contain.
    pub tunnel_type: String,

    /// Require the record id to equal the identifier. When off, any id
    /// containing the identifier matches.
    pub exact_identifier: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            tunnel_type: "ipsec".to_string(),
            exact_identifier: true,
        }
    }
}

/// Outbound (proxy → backend) settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Time allowed for the backend to send response headers, in seconds.
    pub response_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            response_timeout_secs: 60,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
