//! Routing handler.
//!
//! # Responsibilities
//! - Extract the client identifier from the host
//! - Resolve it to a backend address
//! - Fetch or build the identifier's pipeline and forward through it
//! - Turn every failure into a minimal response, logging the detail
//!
//! # Design Decisions
//! - An empty address is a resolution failure; nothing is forwarded
//! - No retries at any layer
//! - Client disconnects drop this future and with it the backend exchange

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::time::Instant;

use crate::error::RouteError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::{extract_identifier, request_host};

/// Entry point for every proxied request.
pub async fn route_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let identifier = extract_identifier(request_host(&request).unwrap_or_default()).to_string();
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    tracing::debug!(identifier = %identifier, method = %method, path = %path, "Routing request");

    match dispatch(&state, &identifier, client, request).await {
        Ok(response) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), "forwarded", start);
            response
        }
        Err(err) => {
            match &err {
                RouteError::Backend { address, source } => tracing::error!(
                    identifier = %identifier,
                    path = %path,
                    backend = %address,
                    error = %source,
                    "Backend unreachable"
                ),
                RouteError::EmptyAddress(_) => tracing::warn!(
                    identifier = %identifier,
                    path = %path,
                    "No backend address published"
                ),
                RouteError::Resolve(resolve) => tracing::warn!(
                    identifier = %identifier,
                    path = %path,
                    error = %resolve,
                    "Backend resolution failed"
                ),
            }
            let outcome = err.outcome();
            let response = err.into_response();
            metrics::record_request(method.as_str(), response.status().as_u16(), outcome, start);
            response
        }
    }
}

async fn dispatch(
    state: &AppState,
    identifier: &str,
    client: Option<SocketAddr>,
    request: Request<Body>,
) -> Result<Response, RouteError> {
    let address = state.resolver.resolve(identifier).await?;
    if address.is_empty() {
        return Err(RouteError::EmptyAddress(identifier.to_string()));
    }

    let pipeline = state
        .pipelines
        .get_or_create(identifier, &address)
        .map_err(|source| RouteError::Backend {
            address: address.clone(),
            source,
        })?;

    tracing::info!(
        identifier = %identifier,
        path = %request.uri().path(),
        backend = %pipeline.target(),
        "Forwarding request"
    );

    pipeline
        .forward(request, client)
        .await
        .map_err(|source| RouteError::Backend {
            address: pipeline.target().to_string(),
            source,
        })
}
