//! End-to-end routing through the proxy router and a TLS backend.

mod common;

use axum::http::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use common::{
    body_text, closed_port, proxy_state, request, start_tls_backend, CountingDirectory,
    UnreachableDirectory,
};
use cpe_proxy::directory::BackendRecord;
use cpe_proxy::http::{HttpServer, X_REQUEST_ID};
use cpe_proxy::Shutdown;

const CPE: &str = "aabbccddeeff";
const HOST: &str = "aabbccddeeff.cpe.example.net";

#[tokio::test]
async fn test_forwards_method_path_and_body() {
    let backend = start_tls_backend("primary").await;
    let directory = CountingDirectory::with([BackendRecord::new(
        CPE,
        "ipsec-l2tp",
        backend.to_string(),
    )]);
    let state = proxy_state(directory.clone());

    let response = HttpServer::build_router(state.clone())
        .oneshot(request("POST", HOST, "/cgi-bin/status?verbose=1", "ping"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(X_REQUEST_ID));
    assert_eq!(
        body_text(response).await,
        format!("primary POST /cgi-bin/status?verbose=1 host={} xff=- body=ping", HOST)
    );
    assert_eq!(state.pipelines.len(), 1);
    assert_eq!(directory.queries(), 1);
}

#[tokio::test]
async fn test_unknown_identifier_is_500_without_pipeline() {
    let directory = Arc::new(CountingDirectory::default());
    let state = proxy_state(directory.clone());

    let response = HttpServer::build_router(state.clone())
        .oneshot(request("GET", "deadbeef0001.cpe.example.net", "/", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "502: Error with empty host");
    assert!(state.pipelines.is_empty());
    assert_eq!(directory.queries(), 1);
}

#[tokio::test]
async fn test_wrong_tunnel_type_is_not_routed() {
    let backend = start_tls_backend("primary").await;
    let directory = CountingDirectory::with([BackendRecord::new(CPE, "l2tp", backend.to_string())]);
    let state = proxy_state(directory);

    let response = HttpServer::build_router(state.clone())
        .oneshot(request("GET", HOST, "/", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(state.pipelines.is_empty());
}

#[tokio::test]
async fn test_empty_address_is_not_forwarded() {
    let directory = CountingDirectory::with([BackendRecord::new(CPE, "ipsec-l2tp", "")]);
    let state = proxy_state(directory);

    let response = HttpServer::build_router(state.clone())
        .oneshot(request("GET", HOST, "/", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "502: Error with empty host");
    assert!(state.pipelines.is_empty());
}

async fn assert_not_routed(host: Option<&str>, expected_queries: usize) {
    let backend = start_tls_backend("other").await;
    let directory = CountingDirectory::with([BackendRecord::new(
        CPE,
        "ipsec-l2tp",
        backend.to_string(),
    )]);
    let state = proxy_state(directory.clone());

    let mut req = request("GET", "", "/", "");
    match host {
        Some(host) => {
            req.headers_mut()
                .insert(axum::http::header::HOST, host.parse().unwrap());
        }
        None => {
            req.headers_mut().remove(axum::http::header::HOST);
        }
    }

    let response = HttpServer::build_router(state.clone())
        .oneshot(req)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "host {:?}", host);
    assert_eq!(body_text(response).await, "502: Error with empty host");
    assert!(state.pipelines.is_empty());
    assert_eq!(directory.queries(), expected_queries);
}

#[tokio::test]
async fn test_empty_host_label_is_not_routed() {
    assert_not_routed(Some(".cpe.example.net"), 0).await;
    assert_not_routed(Some(":8081"), 0).await;
    assert_not_routed(None, 0).await;
}

#[tokio::test]
async fn test_partial_host_label_is_not_routed() {
    assert_not_routed(Some("ccdd.cpe.example.net"), 1).await;
    assert_not_routed(Some("aabbcc.cpe.example.net"), 1).await;
    assert_not_routed(Some("203.0.113.7"), 1).await;
}

#[tokio::test]
async fn test_directory_failure_is_500() {
    let state = proxy_state(Arc::new(UnreachableDirectory));

    let response = HttpServer::build_router(state.clone())
        .oneshot(request("GET", HOST, "/", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response).await;
    assert_eq!(body, "502: Error with empty host");
    assert!(!body.contains("connection refused"));
    assert!(state.pipelines.is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_is_502() {
    let dead = closed_port();
    let directory = CountingDirectory::with([BackendRecord::new(CPE, "ipsec-l2tp", dead.to_string())]);
    let state = proxy_state(directory);

    let response = HttpServer::build_router(state.clone())
        .oneshot(request("GET", HOST, "/", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        body_text(response).await,
        format!("502: Error with {} host", dead)
    );
    // The pipeline outlives the failed exchange.
    assert_eq!(state.pipelines.len(), 1);
}

#[tokio::test]
async fn test_repeat_requests_share_pipeline_but_resolve_each_time() {
    let backend = start_tls_backend("primary").await;
    let directory = CountingDirectory::with([BackendRecord::new(
        CPE,
        "ipsec-l2tp",
        backend.to_string(),
    )]);
    let state = proxy_state(directory.clone());
    let router = HttpServer::build_router(state.clone());

    for path in ["/a", "/b", "/c"] {
        let response = router
            .clone()
            .oneshot(request("GET", HOST, path, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(state.pipelines.constructed(), 1);
    assert_eq!(directory.queries(), 3);
}

#[tokio::test]
async fn test_cached_pipeline_keeps_first_backend() {
    let first = start_tls_backend("primary").await;
    let second = start_tls_backend("secondary").await;
    let directory = CountingDirectory::with([BackendRecord::new(
        CPE,
        "ipsec-l2tp",
        first.to_string(),
    )]);
    let state = proxy_state(directory.clone());
    let router = HttpServer::build_router(state.clone());

    let response = router
        .clone()
        .oneshot(request("GET", HOST, "/", ""))
        .await
        .unwrap();
    assert!(body_text(response).await.starts_with("primary "));

    directory
        .records
        .upsert(BackendRecord::new(CPE, "ipsec-l2tp", second.to_string()));

    let response = router
        .oneshot(request("GET", HOST, "/", ""))
        .await
        .unwrap();
    assert!(body_text(response).await.starts_with("primary "));

    let pipeline = state.pipelines.get(CPE).unwrap();
    assert_eq!(pipeline.target().as_str(), first.to_string());
}

#[tokio::test]
async fn test_identifiers_route_independently() {
    let first = start_tls_backend("first").await;
    let second = start_tls_backend("second").await;
    let directory = CountingDirectory::with([
        BackendRecord::new("aabbccddeeff", "ipsec-l2tp", first.to_string()),
        BackendRecord::new("001122334455", "ipsec-l2tp", second.to_string()),
    ]);
    let state = proxy_state(directory);
    let router = HttpServer::build_router(state.clone());

    let response = router
        .clone()
        .oneshot(request("GET", "aabbccddeeff.cpe.example.net", "/", ""))
        .await
        .unwrap();
    assert!(body_text(response).await.starts_with("first "));

    let response = router
        .oneshot(request("GET", "001122334455.cpe.example.net:8081", "/", ""))
        .await
        .unwrap();
    assert!(body_text(response).await.starts_with("second "));

    assert_eq!(state.pipelines.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_requests_build_one_pipeline() {
    let backend = start_tls_backend("primary").await;
    let directory = CountingDirectory::with([BackendRecord::new(
        CPE,
        "ipsec-l2tp",
        backend.to_string(),
    )]);
    let state = proxy_state(directory);
    let router = HttpServer::build_router(state.clone());

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let router = router.clone();
            tokio::spawn(async move {
                router
                    .oneshot(request("GET", HOST, &format!("/req/{}", i), ""))
                    .await
                    .unwrap()
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().status(), StatusCode::OK);
    }

    assert_eq!(state.pipelines.constructed(), 1);
    assert_eq!(state.pipelines.len(), 1);
}

#[tokio::test]
async fn test_served_over_tcp_with_forwarded_for() {
    let backend = start_tls_backend("primary").await;
    let directory = CountingDirectory::with([BackendRecord::new(
        CPE,
        "ipsec-l2tp",
        backend.to_string(),
    )]);
    let state = proxy_state(directory);
    let server = HttpServer::new(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let response = client
        .get(format!("http://{}/health/wan", addr))
        .header("host", HOST)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.text().await.unwrap(),
        format!("primary GET /health/wan host={} xff=127.0.0.1 body=", HOST)
    );

    drop(client);
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
