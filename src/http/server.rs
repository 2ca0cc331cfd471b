//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the routing handler on every path
//! - Wire up middleware (request ID, tracing)
//! - Serve over plain TCP or TLS
//! - Drain in-flight requests on shutdown

use axum::{body::Body, http::Request, routing::any, Router};
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::directory::Directory;
use crate::http::handler::route_request;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::proxy::{PipelineCache, Transport};
use crate::routing::BackendResolver;

/// Grace period for in-flight TLS connections after shutdown is signalled.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<BackendResolver>,
    pub pipelines: Arc<PipelineCache>,
}

impl AppState {
    /// Wire a resolver over `directory` and an empty pipeline cache.
    pub fn new(
        config: &ProxyConfig,
        directory: Arc<dyn Directory>,
        transport: Transport,
    ) -> Self {
        Self {
            resolver: Arc::new(BackendResolver::new(
                directory,
                &config.routing,
                &config.directory,
            )),
            pipelines: Arc::new(PipelineCache::new(transport)),
        }
    }
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(route_request))
            .route("/{*path}", any(route_request))
            .with_state(state)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id(req),
                )
            }))
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!(pipelines = self.state.pipelines.len(), "HTTP server stopped");
        Ok(())
    }

    /// Run the server terminating TLS on `listener`.
    pub async fn run_tls(
        self,
        listener: std::net::TcpListener,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::from_tcp_rustls(listener, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!(pipelines = self.state.pipelines.len(), "HTTPS server stopped");
        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}
