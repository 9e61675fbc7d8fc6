//! Shared utilities for integration tests.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use oap_gateway::config::GatewayConfig;
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Plain-text body served at `/api/text`
pub const TEXT_BODY: &str = "plain text from the backend\n";

/// Event-stream body served at `/api/sse`
pub const SSE_BODY: &str = "event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":1}\n\n";

/// Counters shared between the spy backend and its handlers
#[derive(Clone, Default)]
struct SpyState {
    hits: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
    last_body_len: Arc<AtomicUsize>,
}

/// Counts handlers dropped before they finished
struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Backend that records how often it is called.
///
/// Unless a special path is requested it answers with a JSON echo of the
/// request it received: method, path, query, headers and body.
pub struct SpyBackend {
    pub addr: SocketAddr,
    state: SpyState,
}

#[allow(dead_code)]
impl SpyBackend {
    pub async fn start() -> Self {
        let state = SpyState::default();
        let app = Router::new().fallback(respond).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Base URL of the backend with the given path, e.g. `http://127.0.0.1:1234/api/`
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Number of requests the backend has received
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Number of `/api/hang` handlers dropped before answering
    pub fn dropped(&self) -> usize {
        self.state.dropped.load(Ordering::SeqCst)
    }

    /// Body length of the last echoed request
    pub fn last_body_len(&self) -> usize {
        self.state.last_body_len.load(Ordering::SeqCst)
    }
}

async fn respond(State(state): State<SpyState>, req: Request<Body>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    match req.uri().path() {
        "/api/text" => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .header(header::SET_COOKIE, "a=1")
            .header(header::SET_COOKIE, "b=2")
            .body(Body::from(TEXT_BODY))
            .unwrap(),
        "/api/sse" => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            SSE_BODY,
        )
            .into_response(),
        "/api/missing" => (
            StatusCode::NOT_FOUND,
            [("x-backend-trace", "t-404")],
            Json(json!({ "error": "missing", "code": 404 })),
        )
            .into_response(),
        "/api/scalar" => (StatusCode::OK, Json(json!(42))).into_response(),
        "/api/slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            (StatusCode::OK, "too late").into_response()
        }
        "/api/hang" => {
            let guard = DropCounter(state.dropped.clone());
            tokio::time::sleep(Duration::from_secs(10)).await;
            std::mem::forget(guard);
            (StatusCode::OK, "finished").into_response()
        }
        _ => echo(&state, req).await.into_response(),
    }
}

async fn echo(state: &SpyState, req: Request<Body>) -> Json<Value> {
    let (parts, body) = req.into_parts();

    let mut headers = Map::new();
    for name in parts.headers.keys() {
        let values: Vec<Value> = parts
            .headers
            .get_all(name)
            .iter()
            .map(|v| Value::String(v.to_str().unwrap_or_default().to_string()))
            .collect();
        headers.insert(name.as_str().to_string(), Value::Array(values));
    }

    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    state.last_body_len.store(bytes.len(), Ordering::SeqCst);

    Json(json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query(),
        "headers": headers,
        "body": String::from_utf8_lossy(&bytes),
        "body_len": bytes.len(),
    }))
}

/// Gateway configuration proxying `/gw` to the given backend URL
#[allow(dead_code)]
pub fn gateway_config(backend_url: Option<String>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.gateway.prefix = "/gw".to_string();
    config.gateway.backend_url = backend_url;
    config.gateway.timeout = 1;
    config
}

/// An address nothing is listening on
#[allow(dead_code)]
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
