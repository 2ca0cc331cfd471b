//! Forwarding pipeline.
//!
//! # Responsibilities
//! - Hold the fixed `https://<address>` target for one identifier
//! - Own the HTTP client (connection pool) used to reach it
//! - Relay one request/response exchange, streaming both bodies
//!
//! # Design Decisions
//! - The target never changes once built
//! - Method, path, query, headers and body are preserved; only the URI
//!   scheme/authority and hop-by-hop headers are rewritten
//! - Dropping the `forward` future aborts the backend exchange
//!
//! # Limitations
//! - Protocol upgrades are not relayed. `Upgrade` and `Connection` are
//!   stripped, so a WebSocket handshake reaches the backend as a plain
//!   request and the client never gets a `101 Switching Protocols`

use axum::body::Body;
use axum::http::uri::{Authority, InvalidUri, Scheme};
use axum::http::{Request, Response, Uri, Version};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::routing::identifier::host_of;
use crate::security::headers;

pub type HttpsClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Errors from relaying a request to a backend.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid backend address '{address}': {source}")]
    InvalidTarget {
        address: String,
        #[source]
        source: InvalidUri,
    },

    #[error("failed to build upstream request: {0}")]
    Uri(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("backend did not respond within {0:?}")]
    Timeout(Duration),
}

/// Transport settings shared by every pipeline.
#[derive(Debug, Clone)]
pub struct Transport {
    tls: Arc<rustls::ClientConfig>,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl Transport {
    pub fn new(tls: rustls::ClientConfig, upstream: &UpstreamConfig) -> Self {
        Self {
            tls: Arc::new(tls),
            connect_timeout: Duration::from_secs(upstream.connect_timeout_secs),
            response_timeout: Duration::from_secs(upstream.response_timeout_secs),
        }
    }

    /// Transport that accepts any backend certificate.
    pub fn insecure(upstream: &UpstreamConfig) -> Result<Self, rustls::Error> {
        Ok(Self::new(super::tls::insecure_client_config()?, upstream))
    }

    fn client(&self) -> HttpsClient {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_nodelay(true);
        http.set_connect_timeout(Some(self.connect_timeout));

        let https = HttpsConnectorBuilder::new()
            .with_tls_config((*self.tls).clone())
            .https_only()
            .enable_http1()
            .wrap_connector(http);

        Client::builder(TokioExecutor::new()).build(https)
    }
}

/// A configured route to one backend.
pub struct Pipeline {
    identifier: String,
    target: Authority,
    client: HttpsClient,
    response_timeout: Duration,
}

impl Pipeline {
    pub fn new(identifier: &str, address: &str, transport: &Transport) -> Result<Self, ForwardError> {
        let target = Authority::from_str(address).map_err(|source| ForwardError::InvalidTarget {
            address: address.to_string(),
            source,
        })?;

        Ok(Self {
            identifier: identifier.to_string(),
            target,
            client: transport.client(),
            response_timeout: transport.response_timeout,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn target(&self) -> &Authority {
        &self.target
    }

    /// The upstream URI for a request path.
    pub fn upstream_uri(&self, original: &Uri) -> Result<Uri, axum::http::Error> {
        let path_and_query = original.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        Uri::builder()
            .scheme(Scheme::HTTPS)
            .authority(self.target.clone())
            .path_and_query(path_and_query)
            .build()
    }

    /// Relay `request` to the backend and return its streamed response.
    pub async fn forward(
        &self,
        request: Request<Body>,
        client: Option<SocketAddr>,
    ) -> Result<Response<Body>, ForwardError> {
        let (mut parts, body) = request.into_parts();

        let host = host_of(&parts.headers, &parts.uri).map(str::to_string);
        headers::prepare_upstream(&mut parts.headers, client, host.as_deref());
        parts.uri = self.upstream_uri(&parts.uri)?;
        parts.version = Version::HTTP_11;

        let request = Request::from_parts(parts, body);
        let response = tokio::time::timeout(self.response_timeout, self.client.request(request))
            .await
            .map_err(|_| ForwardError::Timeout(self.response_timeout))??;

        let (mut parts, body) = response.into_parts();
        headers::strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("identifier", &self.identifier)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> Transport {
        Transport::insecure(&UpstreamConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_upstream_uri_keeps_path_and_query() {
        let pipeline = Pipeline::new("aabbccddeeff", "10.0.5.9:443", &transport()).unwrap();

        let uri = pipeline
            .upstream_uri(&"/status/wan?verbose=1".parse().unwrap())
            .unwrap();
        assert_eq!(uri.to_string(), "https://10.0.5.9:443/status/wan?verbose=1");

        let uri = pipeline.upstream_uri(&"http://x.example.com".parse().unwrap()).unwrap();
        assert_eq!(uri.to_string(), "https://10.0.5.9:443/");
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let err = Pipeline::new("aabbccddeeff", "bad address", &transport()).unwrap_err();
        assert!(matches!(err, ForwardError::InvalidTarget { .. }));
    }
}
