//! HTTP server wiring: router, shared state and handlers

use crate::config::GatewayConfig;
use crate::health::HealthChecker;
use crate::metrics::GatewayMetrics;
use crate::proxy::ProxyService;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ProxyService>,
    pub metrics: Arc<GatewayMetrics>,
    pub health: Arc<HealthChecker>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Build the state for a validated configuration
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let metrics = Arc::new(GatewayMetrics::new());
        let proxy = ProxyService::new(&config.gateway, metrics.clone())?;
        Ok(Self::with_proxy(config, proxy, metrics))
    }

    /// Build the state around an already constructed proxy
    pub fn with_proxy(
        config: GatewayConfig,
        proxy: ProxyService,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        let health = Arc::new(HealthChecker::new(proxy.backend().is_some()));
        Self {
            proxy: Arc::new(proxy),
            metrics,
            health,
            config: Arc::new(config),
        }
    }
}

/// Build the gateway router
pub fn router(state: AppState) -> Router {
    let config = state.config.clone();
    let prefix = state.proxy.prefix().to_string();

    let mut app = Router::new();

    if config.health.enabled {
        let live_path = format!("{}/live", config.health.path.trim_end_matches('/'));
        app = app
            .route(&config.health.path, get(health_handler))
            .route(&live_path, get(liveness_handler));
        info!("Health endpoint enabled at {}", config.health.path);
    }
    if config.metrics.enabled {
        app = app.route(&config.metrics.path, get(metrics_handler));
        info!("Metrics endpoint enabled at {}", config.metrics.path);
    }

    app = if prefix == "/" {
        app.fallback(proxy_handler)
    } else {
        app.route(&prefix, any(proxy_handler))
            .route(&format!("{}/", prefix), any(proxy_handler))
            .route(&format!("{}/*rest", prefix), any(proxy_handler))
    };
    info!("Proxying {} to backend", prefix);

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check handler
///
/// A degraded gateway still answers 200: the process is up and will serve
/// again once the backend URL is configured.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.health.readiness()))
}

/// Liveness handler: healthy whenever the process is serving
async fn liveness_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.health.liveness()))
}

/// Metrics handler
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let output = state.metrics.prometheus_output();
    (StatusCode::OK, output)
}

/// Proxy handler - forwards requests to the backend
async fn proxy_handler(State(state): State<AppState>, req: Request<Body>) -> Response {
    state.proxy.forward(req).await
}
