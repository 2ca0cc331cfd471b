//! Subdomain-routed reverse proxy for CPE tunnels.
//!
//! A request to `<identifier>.<domain>` is resolved through the directory
//! to the identifier's tunnel address and forwarded there over HTTPS.

pub mod config;
pub mod directory;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::RouteError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
