//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file from CPE_PROXY_CONFIG)
//!     → loader.rs (SERVE_ADDR / MONGO_ADDR / LOG_LEVEL overrides)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → passed by value into startup
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; there is no reload
//! - All fields have defaults to allow an empty environment
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_from_env, read_config_file, ConfigError};
pub use schema::{
    DirectoryConfig, DirectoryKind, ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig,
    RoutingConfig, StaticRecord, TlsConfig, UpstreamConfig,
};
