//! Metrics module for Prometheus
//!
//! This module provides metrics collection for the gateway service:
//! - Proxied request count by method and status
//! - Request latency histogram
//! - In-flight outbound requests gauge
//! - Gateway failures by kind (configuration, unauthenticated, bad gateway)

use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Gateway metrics collector
#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    request_counter: CounterVec,
    request_latency: HistogramVec,
    in_flight: Gauge,
    failure_counter: CounterVec,
    total_requests: Arc<AtomicU64>,
    total_errors: Arc<AtomicU64>,
}

impl GatewayMetrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        let registry = Registry::new();

        let request_counter = CounterVec::new(
            Opts::new("gateway_requests_total", "Total number of proxied requests"),
            &["method", "status"],
        )
        .expect("Failed to create request counter");

        let request_latency = HistogramVec::new(
            HistogramOpts::new(
                "gateway_request_duration_seconds",
                "Proxied request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ]),
            &["method"],
        )
        .expect("Failed to create latency histogram");

        let in_flight = Gauge::new(
            "gateway_upstream_in_flight",
            "Number of outbound requests currently awaiting the backend",
        )
        .expect("Failed to create in-flight gauge");

        let failure_counter = CounterVec::new(
            Opts::new(
                "gateway_upstream_failures_total",
                "Requests answered by the gateway itself instead of the backend",
            ),
            &["kind"],
        )
        .expect("Failed to create failure counter");

        registry
            .register(Box::new(request_counter.clone()))
            .expect("Failed to register request counter");
        registry
            .register(Box::new(request_latency.clone()))
            .expect("Failed to register latency histogram");
        registry
            .register(Box::new(in_flight.clone()))
            .expect("Failed to register in-flight gauge");
        registry
            .register(Box::new(failure_counter.clone()))
            .expect("Failed to register failure counter");

        Self {
            registry,
            request_counter,
            request_latency,
            in_flight,
            failure_counter,
            total_requests: Arc::new(AtomicU64::new(0)),
            total_errors: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record a completed request with its status and latency
    pub fn record_request(&self, method: &str, status: u16, latency: Duration) {
        let status_str = status.to_string();

        self.request_counter
            .with_label_values(&[method, &status_str])
            .inc();

        self.request_latency
            .with_label_values(&[method])
            .observe(latency.as_secs_f64());

        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if status >= 400 {
            self.total_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a request the gateway rejected or could not forward
    pub fn record_failure(&self, kind: &str) {
        self.failure_counter.with_label_values(&[kind]).inc();
    }

    /// Track an outbound request until the returned guard is dropped
    pub fn track_in_flight(&self) -> InFlightGuard {
        self.in_flight.inc();
        InFlightGuard {
            gauge: self.in_flight.clone(),
        }
    }

    /// Number of outbound requests currently in flight
    pub fn in_flight(&self) -> f64 {
        self.in_flight.get()
    }

    /// Get the Prometheus metrics output
    pub fn prometheus_output(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Get total request count
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Get total error count
    pub fn total_errors(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight gauge on drop, including when the request
/// future is cancelled
pub struct InFlightGuard {
    gauge: Gauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}
