//! Request-level failures and their HTTP mapping.
//!
//! Callers only ever see a status and a one-line body naming the backend
//! host (or `empty`); the underlying error goes to the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::proxy::ForwardError;
use crate::routing::ResolveError;

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("backend record for '{0}' has no tunnel address")]
    EmptyAddress(String),

    #[error("forwarding to {address} failed: {source}")]
    Backend {
        address: String,
        #[source]
        source: ForwardError,
    },
}

impl RouteError {
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::Resolve(_) | RouteError::EmptyAddress(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RouteError::Backend {
                source: ForwardError::Timeout(_),
                ..
            } => StatusCode::GATEWAY_TIMEOUT,
            RouteError::Backend { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            RouteError::Resolve(ResolveError::Directory { .. }) => "directory_error",
            RouteError::Resolve(ResolveError::NotFound { .. }) => "not_found",
            RouteError::EmptyAddress(_) => "no_backend",
            RouteError::Backend { .. } => "backend_error",
        }
    }

    /// Diagnostic body: `<code>: Error with <host> host`.
    ///
    /// Resolution failures report code 502 under a 500 status, as existing
    /// clients expect.
    pub fn body(&self) -> String {
        match self {
            RouteError::Resolve(_) | RouteError::EmptyAddress(_) => {
                "502: Error with empty host".to_string()
            }
            RouteError::Backend { address, .. } => {
                format!("{}: Error with {} host", self.status().as_u16(), address)
            }
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        (self.status(), self.body()).into_response()
    }
}
