//! Health check module
//!
//! Liveness only says the process is up. Readiness additionally reports
//! whether the gateway has a backend to forward to.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Health checker service
#[derive(Debug, Clone)]
pub struct HealthChecker {
    start_time: Instant,
    version: String,
    backend_configured: bool,
}

impl HealthChecker {
    pub fn new(backend_configured: bool) -> Self {
        Self {
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            backend_configured,
        }
    }

    /// Always healthy while the process is serving
    pub fn liveness(&self) -> HealthResponse {
        self.report(HealthStatus::Healthy, None)
    }

    /// Degraded when proxied requests are bound to fail with a configuration error
    pub fn readiness(&self) -> HealthResponse {
        if self.backend_configured {
            self.report(HealthStatus::Healthy, None)
        } else {
            self.report(
                HealthStatus::Degraded,
                Some("Backend URL is not configured".to_string()),
            )
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    fn report(&self, status: HealthStatus, message: Option<String>) -> HealthResponse {
        HealthResponse {
            status,
            version: self.version.clone(),
            uptime_seconds: self.uptime_seconds(),
            message,
        }
    }
}
