//! Caller identity resolution
//!
//! The gateway never authenticates callers itself. An authenticating layer in
//! front of it (a session middleware or an auth proxy) tells it who the caller
//! is, and an [`IdentityResolver`] turns that into the identity string sent to
//! the backend.

use crate::config::ProxyConfig;
use axum::http::request::Parts;
use axum::http::HeaderName;
use std::sync::Arc;

/// Authenticated session attached to a request by an upstream layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Stable identifier of the signed-in principal (typically an email)
    pub identity: String,
}

impl Session {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }
}

/// Yields the identity of the caller of a request, if one can be determined
pub trait IdentityResolver: Send + Sync {
    fn resolve_identity(&self, request: &Parts) -> Option<String>;
}

/// Shared identity resolver
pub type SharedIdentityResolver = Arc<dyn IdentityResolver>;

/// Ignores the request and always returns the configured fallback identity
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    fallback: Option<String>,
}

impl StaticIdentity {
    pub fn new(fallback: Option<String>) -> Self {
        Self { fallback }
    }
}

impl IdentityResolver for StaticIdentity {
    fn resolve_identity(&self, _request: &Parts) -> Option<String> {
        self.fallback.clone()
    }
}

/// Prefers the caller's session identity, falling back to a static identity.
///
/// The session is read from the [`Session`] request extension first, then from
/// the trusted session header if one is configured.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    header: Option<HeaderName>,
    fallback: StaticIdentity,
}

impl SessionIdentity {
    pub fn new(header: Option<HeaderName>, fallback: Option<String>) -> Self {
        Self {
            header,
            fallback: StaticIdentity::new(fallback),
        }
    }

    fn session_identity(&self, request: &Parts) -> Option<String> {
        if let Some(session) = request.extensions.get::<Session>() {
            if !session.identity.is_empty() {
                return Some(session.identity.clone());
            }
        }

        let header = self.header.as_ref()?;
        request
            .headers
            .get(header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

impl IdentityResolver for SessionIdentity {
    fn resolve_identity(&self, request: &Parts) -> Option<String> {
        self.session_identity(request)
            .or_else(|| self.fallback.resolve_identity(request))
    }
}

/// Build the resolver matching the proxy configuration.
///
/// A configured session header makes the gateway session-aware; without one
/// only the fallback identity is used.
pub fn create_resolver(config: &ProxyConfig) -> anyhow::Result<SharedIdentityResolver> {
    let fallback = config.fallback_identity.clone();
    match &config.session_header {
        Some(name) => {
            let header = HeaderName::from_bytes(name.as_bytes())?;
            Ok(Arc::new(SessionIdentity::new(Some(header), fallback)))
        }
        None => Ok(Arc::new(StaticIdentity::new(fallback))),
    }
}
