//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use futures_util::future::{self, BoxFuture, FutureExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cpe_proxy::config::ProxyConfig;
use cpe_proxy::directory::{BackendRecord, Directory, DirectoryError, Filter, InMemoryDirectory};
use cpe_proxy::http::AppState;
use cpe_proxy::proxy::Transport;

/// Self-signed rustls server config for 127.0.0.1.
fn self_signed_server_config() -> rustls::ServerConfig {
    let key_pair = rcgen::KeyPair::generate().unwrap();
    let cert = rcgen::CertificateParams::new(vec!["localhost".to_string(), "127.0.0.1".to_string()])
        .unwrap()
        .self_signed(&key_pair)
        .unwrap();

    let cert_der = rustls::pki_types::CertificateDer::from(cert.der().to_vec());
    let key_der = rustls::pki_types::PrivateKeyDer::try_from(key_pair.serialize_der()).unwrap();

    rustls::ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert_der], key_der)
        .unwrap()
}

/// Describe the received request so tests can assert on what was forwarded:
/// `<tag> <method> <uri> host=<host> xff=<x-forwarded-for> body=<body>`.
async fn echo(tag: &'static str, request: Request<Body>) -> String {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string()
    };

    format!(
        "{} {} {} host={} xff={} body={}",
        tag,
        parts.method,
        parts.uri,
        header(header::HOST.as_str()),
        header("x-forwarded-for"),
        String::from_utf8_lossy(&body)
    )
}

/// Start an HTTPS backend with a self-signed certificate on an ephemeral port.
pub async fn start_tls_backend(tag: &'static str) -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(move |request: Request<Body>| echo(tag, request));
    let tls = RustlsConfig::from_config(Arc::new(self_signed_server_config()));

    tokio::spawn(async move {
        let _ = axum_server::from_tcp_rustls(listener, tls)
            .serve(app.into_make_service())
            .await;
    });

    addr
}

/// An address nothing is listening on.
pub fn closed_port() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// In-memory directory that counts lookups.
#[derive(Default)]
pub struct CountingDirectory {
    pub records: InMemoryDirectory,
    queries: AtomicUsize,
}

impl CountingDirectory {
    pub fn with(records: impl IntoIterator<Item = BackendRecord>) -> Arc<Self> {
        Arc::new(Self {
            records: InMemoryDirectory::from_records(records),
            queries: AtomicUsize::new(0),
        })
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl Directory for CountingDirectory {
    fn find_one(
        &self,
        filter: &Filter,
    ) -> BoxFuture<'static, Result<Option<BackendRecord>, DirectoryError>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.records.find_one(filter)
    }
}

/// Directory whose every lookup fails at the transport level.
pub struct UnreachableDirectory;

impl Directory for UnreachableDirectory {
    fn find_one(
        &self,
        _filter: &Filter,
    ) -> BoxFuture<'static, Result<Option<BackendRecord>, DirectoryError>> {
        future::ready(Err(DirectoryError::Unavailable("connection refused".into()))).boxed()
    }
}

pub fn proxy_state(directory: Arc<dyn Directory>) -> AppState {
    let config = ProxyConfig::default();
    let transport = Transport::insecure(&config.upstream).unwrap();
    AppState::new(&config, directory, transport)
}

pub fn request(method: &str, host: &str, path: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::HOST, host)
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
