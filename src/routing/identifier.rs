//! Client identifier extraction.
//!
//! The identifier is the leftmost label of the request host:
//! `aabbccddeeff.example.com:8080` → `aabbccddeeff`. No validation is
//! applied; an empty or odd host yields an empty or odd identifier.

use axum::http::{header, HeaderMap, Request, Uri};

/// The host the client addressed: the `Host` header, or the URI authority
/// for HTTP/2 requests that carry none.
pub fn request_host<B>(req: &Request<B>) -> Option<&str> {
    host_of(req.headers(), req.uri())
}

pub fn host_of<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> Option<&'a str> {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
}

/// First dot-delimited label of `host`, without any port.
pub fn extract_identifier(host: &str) -> &str {
    let label = host.split('.').next().unwrap_or_default();
    label.split(':').next().unwrap_or_default()
}
