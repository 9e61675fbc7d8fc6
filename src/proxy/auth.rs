//! Credential injection for authorized deployments

use super::error::GatewayError;
use crate::config::ProxyConfig;
use crate::identity::{create_resolver, SharedIdentityResolver};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::request::Parts;

/// Adds the bearer credential and caller identity to outbound requests.
///
/// When authorization is not required this is a no-op and the identity
/// resolver is never consulted.
#[derive(Clone)]
pub struct Authorizer {
    required: bool,
    api_key: Option<String>,
    identity_header: HeaderName,
    resolver: SharedIdentityResolver,
}

impl Authorizer {
    pub fn new(
        required: bool,
        api_key: Option<String>,
        identity_header: HeaderName,
        resolver: SharedIdentityResolver,
    ) -> Self {
        Self {
            required,
            api_key,
            identity_header,
            resolver,
        }
    }

    pub fn from_config(config: &ProxyConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.auth_required,
            config.api_key.clone(),
            HeaderName::from_bytes(config.identity_header.as_bytes())?,
            create_resolver(config)?,
        ))
    }

    /// Swap the identity resolver, e.g. for one backed by a session store
    pub fn with_resolver(mut self, resolver: SharedIdentityResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Inject credentials into `headers` for the request described by `request`.
    ///
    /// Returns the identity the call is attributed to, if any.
    pub fn authorize(
        &self,
        request: &Parts,
        headers: &mut HeaderMap,
    ) -> Result<Option<String>, GatewayError> {
        if !self.required {
            return Ok(None);
        }

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            GatewayError::Configuration(
                "API key is not configured. Set gateway.api_key or GATEWAY_API_KEY.".to_string(),
            )
        })?;

        let identity = self.resolver.resolve_identity(request).ok_or_else(|| {
            GatewayError::Unauthenticated(
                "No identity available for this request. Sign in or configure gateway.fallback_identity."
                    .to_string(),
            )
        })?;

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|_| {
            GatewayError::Configuration(
                "API key contains characters not allowed in a header value.".to_string(),
            )
        })?;
        bearer.set_sensitive(true);

        let identity_value = HeaderValue::from_str(&identity).map_err(|_| {
            GatewayError::Unauthenticated(
                "Resolved identity is not a valid header value.".to_string(),
            )
        })?;

        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert(self.identity_header.clone(), identity_value);

        Ok(Some(identity))
    }
}
