//! Dev proxy forwarding against an in-process stub backend.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, RawQuery},
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use forensics_viewer::proxy::{self, DevProxy, ProxyConfig};

async fn echo(headers: HeaderMap, RawQuery(query): RawQuery) -> Json<Value> {
    Json(json!({
        "host": headers.get(header::HOST).and_then(|h| h.to_str().ok()),
        "query": query,
        "custom": headers.get("x-request-id").and_then(|h| h.to_str().ok()),
    }))
}

async fn image(Path((_hash, file)): Path<(String, String)>) -> Response {
    if file == "ela.png" {
        (
            [
                (header::CONTENT_TYPE, "image/png"),
                (header::CACHE_CONTROL, "max-age=60"),
            ],
            vec![0x89, b'P', b'N', b'G'],
        )
            .into_response()
    } else {
        (StatusCode::NOT_FOUND, "no such image").into_response()
    }
}

async fn moved() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/elsewhere")])
}

async fn spawn_backend() -> SocketAddr {
    let app = Router::new()
        .route("/mmapi/media/verificationreport/getreport", get(echo))
        .route("/mmapi/echo", post(|body: String| async move { body }))
        .route("/mmapi/moved", get(moved))
        .route("/images/:hash/:file", get(image));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn proxy_app(addr: SocketAddr, change_origin: bool) -> Router {
    let config = ProxyConfig {
        target: format!("http://{}", addr),
        change_origin,
        ..ProxyConfig::default()
    };
    let proxy = DevProxy::new(&config, Duration::from_secs(5)).unwrap();
    proxy::router(Arc::new(proxy))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

#[tokio::test]
async fn test_forwards_path_query_and_headers() {
    let addr = spawn_backend().await;
    let app = proxy_app(addr, true);

    let request = Request::builder()
        .uri("/mmapi/media/verificationreport/getreport?hash=abc123")
        .header(header::HOST, "dashboard.local:3000")
        .header("x-request-id", "r-1")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["query"], "hash=abc123");
    assert_eq!(json["custom"], "r-1");
    // change_origin: the backend sees its own authority.
    assert_eq!(json["host"], addr.to_string());
}

#[tokio::test]
async fn test_preserves_host_without_change_origin() {
    let addr = spawn_backend().await;
    let app = proxy_app(addr, false);

    let request = Request::builder()
        .uri("/mmapi/media/verificationreport/getreport")
        .header(header::HOST, "dashboard.local:3000")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["host"], "dashboard.local:3000");
    assert_eq!(json["query"], Value::Null);
}

#[tokio::test]
async fn test_relays_image_bytes_and_status() {
    let addr = spawn_backend().await;
    let app = proxy_app(addr, true);

    let request = Request::builder()
        .uri("/images/abc123/ela.png")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(headers[header::CACHE_CONTROL], "max-age=60");
    assert_eq!(body, vec![0x89, b'P', b'N', b'G']);

    let request = Request::builder()
        .uri("/images/abc123/missing.png")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, b"no such image");
}

#[tokio::test]
async fn test_forwards_request_body() {
    let addr = spawn_backend().await;
    let app = proxy_app(addr, true);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/mmapi/echo")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("payload"))
        .unwrap();
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"payload");
}

#[tokio::test]
async fn test_redirects_are_not_followed() {
    let addr = spawn_backend().await;
    let app = proxy_app(addr, true);

    let request = Request::builder()
        .uri("/mmapi/moved")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(app, request).await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], "/elsewhere");
}

#[tokio::test]
async fn test_unmatched_paths_are_not_routed() {
    let addr = spawn_backend().await;
    let app = proxy_app(addr, true);

    let request = Request::builder()
        .uri("/reports/abc123")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_backend_down_is_bad_gateway() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let app = proxy_app(addr, true);

    let request = Request::builder()
        .uri("/mmapi/media/verificationreport/getreport?hash=abc123")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(String::from_utf8(body).unwrap().starts_with("Proxy error"));
}
