//! Proxy module for forwarding requests to the backend service
//!
//! A request flows through these stages, each of which may short-circuit
//! with a [`GatewayError`]:
//! - target resolution (strip the gateway prefix, join onto the backend URL)
//! - header filtering (drop `host`, force `Accept`)
//! - authorization (bearer key and caller identity, when required)
//! - forwarding (request body streamed, never buffered)
//! - response translation (JSON re-serialized, anything else passed through)

pub mod auth;
pub mod error;
pub mod headers;
pub mod response;
pub mod target;

pub use auth::Authorizer;
pub use error::{ErrorBody, GatewayError};
pub use response::{try_parse_structured, ResponsePayload};

use crate::config::ProxyConfig;
use crate::identity::SharedIdentityResolver;
use crate::metrics::GatewayMetrics;
use axum::body::{Body, HttpBody};
use axum::http::{Method, Request, Response};
use axum::response::IntoResponse;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Proxy service for forwarding requests
#[derive(Clone)]
pub struct ProxyService {
    client: reqwest::Client,
    prefix: String,
    backend: Option<Url>,
    authorizer: Authorizer,
    metrics: Arc<GatewayMetrics>,
}

impl ProxyService {
    /// Create a proxy service from the gateway configuration
    pub fn new(config: &ProxyConfig, metrics: Arc<GatewayMetrics>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        let backend = config
            .backend_url
            .as_deref()
            .map(Url::parse)
            .transpose()?;

        Ok(Self {
            client,
            prefix: config.normalized_prefix().to_string(),
            backend,
            authorizer: Authorizer::from_config(config)?,
            metrics,
        })
    }

    /// Use a custom identity resolver instead of the configured one
    pub fn with_resolver(mut self, resolver: SharedIdentityResolver) -> Self {
        self.authorizer = self.authorizer.with_resolver(resolver);
        self
    }

    /// Inbound path prefix served by this proxy
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Configured backend base URL
    pub fn backend(&self) -> Option<&Url> {
        self.backend.as_ref()
    }

    /// Forward a request to the backend and build the caller's response.
    ///
    /// Never fails: gateway errors become JSON error responses.
    pub async fn forward(&self, req: Request<Body>) -> Response<Body> {
        let start = Instant::now();
        let method = req.method().clone();

        let response = match self.proxy(req).await {
            Ok(response) => response,
            Err(err) => {
                warn!("Gateway request failed ({}): {}", err.kind(), err);
                self.metrics.record_failure(err.kind());
                err.into_response()
            }
        };

        self.metrics
            .record_request(method.as_str(), response.status().as_u16(), start.elapsed());
        response
    }

    async fn proxy(&self, req: Request<Body>) -> Result<Response<Body>, GatewayError> {
        let backend = self.backend.as_ref().ok_or_else(|| {
            GatewayError::Configuration(
                "Backend URL is not configured. Set gateway.backend_url or GATEWAY_BACKEND_URL to the URL of the backend service."
                    .to_string(),
            )
        })?;

        let (parts, body) = req.into_parts();

        let path = parts.uri.path();
        let remainder = target::strip_gateway_prefix(path, &self.prefix).unwrap_or(path);
        let target_url = target::resolve_target(backend, remainder, parts.uri.query());

        let mut outbound_headers = headers::outbound_headers(&parts.headers);
        let identity = self.authorizer.authorize(&parts, &mut outbound_headers)?;

        info!("Forwarding {} request to {}", parts.method, target_url);
        if let Some(identity) = &identity {
            debug!("Request attributed to {}", identity);
        }

        let mut outbound = self.client.request(parts.method.clone(), target_url);
        if carries_body(&parts.method) && !body.is_end_stream() {
            outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        } else {
            headers::strip_body_framing(&mut outbound_headers);
        }
        let outbound = outbound.headers(outbound_headers);

        let _in_flight = self.metrics.track_in_flight();
        let upstream = outbound.send().await?;

        let status = upstream.status();
        debug!("Backend responded with status {}", status);

        let upstream_headers = upstream.headers().clone();
        let body = upstream.bytes().await?;

        Ok(response::translate_response(status, &upstream_headers, body))
    }
}

/// Whether a request body is forwarded for this method
pub fn carries_body(method: &Method) -> bool {
    method != Method::GET && method != Method::HEAD
}
