//! Configuration module for the gateway service
//!
//! This module handles loading and parsing configuration from TOML files,
//! with a small set of environment variable overrides for secrets and
//! deployment-specific values.

use axum::http::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

/// Environment variable overriding `gateway.backend_url`
pub const ENV_BACKEND_URL: &str = "GATEWAY_BACKEND_URL";
/// Environment variable overriding `gateway.auth_required`
pub const ENV_AUTH_REQUIRED: &str = "GATEWAY_AUTH_REQUIRED";
/// Environment variable overriding `gateway.api_key`
pub const ENV_API_KEY: &str = "GATEWAY_API_KEY";
/// Environment variable overriding `gateway.fallback_identity`
pub const ENV_FALLBACK_IDENTITY: &str = "GATEWAY_FALLBACK_IDENTITY";

fn default_enabled() -> bool {
    true
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Proxy configuration: where requests go and how they are authorized
#[derive(Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Inbound path prefix handled by the gateway, stripped before forwarding
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Absolute URL of the backend service. May be left unset; requests then
    /// fail with a configuration error until it is provided.
    #[serde(default)]
    pub backend_url: Option<String>,
    /// Whether credential headers are injected on every forwarded request
    #[serde(default)]
    pub auth_required: bool,
    /// Secret sent to the backend as a bearer token
    #[serde(default)]
    pub api_key: Option<String>,
    /// Identity used when the caller has no session identity
    #[serde(default)]
    pub fallback_identity: Option<String>,
    /// Trusted inbound header carrying the session identity, set by an
    /// authenticating front proxy. When unset only the fallback identity is used.
    #[serde(default)]
    pub session_header: Option<String>,
    /// Outbound header carrying the resolved identity
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
    /// Outbound request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_prefix() -> String {
    "/api/oap_mcp".to_string()
}

fn default_identity_header() -> String {
    "Arcade-User-ID".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            backend_url: None,
            auth_required: false,
            api_key: None,
            fallback_identity: None,
            session_header: None,
            identity_header: default_identity_header(),
            timeout: default_timeout(),
        }
    }
}

impl ProxyConfig {
    /// Prefix without a trailing slash, so `/gw/` and `/gw` route the same
    pub fn normalized_prefix(&self) -> &str {
        match self.prefix.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        }
    }
}

// Hand-written so the API key never ends up in logs.
impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("prefix", &self.prefix)
            .field("backend_url", &self.backend_url)
            .field("auth_required", &self.auth_required)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("fallback_identity", &self.fallback_identity)
            .field("session_header", &self.session_header)
            .field("identity_header", &self.identity_header)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether metrics are enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Path to expose metrics
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}

/// Health check configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Whether health check is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Path for health check endpoint
    #[serde(default = "default_health_path")]
    pub path: String,
}

fn default_health_path() -> String {
    "/health".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_health_path(),
        }
    }
}

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gateway: ProxyConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

impl GatewayConfig {
    /// Load configuration from a TOML file and apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config: GatewayConfig = toml::from_str(&contents)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let config: GatewayConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Override gateway settings from the environment.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a closure over a map.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.is_empty()) {
            self.gateway.backend_url = Some(url);
        }
        if let Some(flag) = lookup(ENV_AUTH_REQUIRED) {
            self.gateway.auth_required = flag.trim().eq_ignore_ascii_case("true");
        }
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.gateway.api_key = Some(key);
        }
        if let Some(identity) = lookup(ENV_FALLBACK_IDENTITY).filter(|v| !v.is_empty()) {
            self.gateway.fallback_identity = Some(identity);
        }
    }

    /// Validate the configuration
    ///
    /// A missing backend URL or API key is not an error here: both are
    /// reported per request so a partially configured gateway still serves
    /// health checks.
    pub fn validate(&self) -> anyhow::Result<()> {
        let gateway = &self.gateway;

        if !gateway.prefix.starts_with('/') {
            anyhow::bail!("Gateway prefix '{}' must start with '/'", gateway.prefix);
        }

        if let Some(raw) = &gateway.backend_url {
            let url = Url::parse(raw)
                .map_err(|e| anyhow::anyhow!("Invalid backend URL '{}': {}", raw, e))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                anyhow::bail!(
                    "Backend URL '{}' must use http or https, got '{}'",
                    raw,
                    url.scheme()
                );
            }
        }

        if HeaderName::from_bytes(gateway.identity_header.as_bytes()).is_err() {
            anyhow::bail!(
                "Identity header '{}' is not a valid header name",
                gateway.identity_header
            );
        }

        if let Some(header) = &gateway.session_header {
            if HeaderName::from_bytes(header.as_bytes()).is_err() {
                anyhow::bail!("Session header '{}' is not a valid header name", header);
            }
        }

        if let Some(key) = &gateway.api_key {
            if HeaderValue::from_str(&format!("Bearer {}", key)).is_err() {
                anyhow::bail!("API key contains characters not allowed in a header value");
            }
        }

        if gateway.timeout == 0 {
            anyhow::bail!("Gateway timeout must be greater than zero");
        }

        Ok(())
    }

    /// Get server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
