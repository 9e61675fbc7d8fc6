//! Failure taxonomy of the gateway and its JSON error body

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors detected by the gateway before or while talking to the backend.
///
/// Every variant becomes a JSON response; none escapes the proxy handler.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required deployment setting is missing.
    #[error("{0}")]
    Configuration(String),

    /// Authorization is required but no identity could be resolved.
    #[error("{0}")]
    Unauthenticated(String),

    /// The outbound call failed at the transport level.
    #[error("Proxy request failed: {0}")]
    BadGateway(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            GatewayError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Configuration(_) => "configuration",
            GatewayError::Unauthenticated(_) => "unauthenticated",
            GatewayError::BadGateway(_) => "bad_gateway",
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            GatewayError::Configuration(message) | GatewayError::Unauthenticated(message) => {
                ErrorBody {
                    message: message.clone(),
                    error: None,
                }
            }
            GatewayError::BadGateway(detail) => ErrorBody {
                message: "Proxy request failed".to_string(),
                error: Some(detail.clone()),
            },
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::BadGateway(describe_transport_error(&err))
    }
}

/// Flatten a client error and its sources into one diagnostic line
fn describe_transport_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}

/// JSON body of every gateway-generated error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
