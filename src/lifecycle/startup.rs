//! Startup orchestration.
//!
//! # Responsibilities
//! - Connect the configured directory
//! - Build the outbound TLS transport
//! - Assemble the HTTP server with injected state
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener is bound by the caller, after this succeeds

use std::sync::Arc;

use crate::config::{DirectoryConfig, DirectoryKind, ProxyConfig};
use crate::directory::{BackendRecord, Directory, DirectoryError, InMemoryDirectory, MongoDirectory};
use crate::http::server::{AppState, HttpServer};
use crate::proxy::Transport;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("directory: {0}")]
    Directory(#[from] DirectoryError),

    #[error("tls: {0}")]
    Tls(#[from] rustls::Error),
}

/// Build the directory client selected by `config.kind`.
pub async fn connect_directory(config: &DirectoryConfig) -> Result<Arc<dyn Directory>, DirectoryError> {
    match config.kind {
        DirectoryKind::Mongo => Ok(Arc::new(MongoDirectory::connect(config).await?)),
        DirectoryKind::Static => {
            let directory =
                InMemoryDirectory::from_records(config.records.iter().map(BackendRecord::from));
            tracing::info!(records = directory.len(), "Static directory loaded");
            Ok(Arc::new(directory))
        }
    }
}

/// Construct the server and all state it owns.
pub async fn build_server(config: ProxyConfig) -> Result<HttpServer, StartupError> {
    let directory = connect_directory(&config.directory).await?;
    let transport = Transport::insecure(&config.upstream)?;
    let state = AppState::new(&config, directory, transport);

    tracing::info!(
        tunnel_type = %config.routing.tunnel_type,
        exact_identifier = config.routing.exact_identifier,
        "Routing configured"
    );

    Ok(HttpServer::new(state))
}
