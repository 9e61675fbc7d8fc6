//! OAP Gateway - a reverse proxy in front of an MCP backend
//!
//! The gateway forwards every request under a fixed path prefix to one
//! backend service:
//! - Path rewriting onto the backend base URL
//! - Optional bearer credential and caller identity injection
//! - Streaming request bodies
//! - JSON-or-text response reconstruction
//! - Prometheus metrics and health checks

pub mod config;
pub mod health;
pub mod identity;
pub mod metrics;
pub mod proxy;
pub mod server;

pub use config::GatewayConfig;
pub use identity::{IdentityResolver, Session};
pub use proxy::{GatewayError, ProxyService};
