//! Reconstruction of the backend response for the original caller

use super::headers::copy_response_headers;
use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Response, StatusCode};
use bytes::Bytes;
use serde_json::Value;

/// Body representation chosen for a backend response
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    /// The body parsed as JSON; it is re-serialized for the caller
    Structured(Value),
    /// Anything else, passed through unchanged
    Opaque(Bytes),
}

/// Attempt to read a body as JSON. Any JSON value, including bare scalars,
/// counts as structured.
pub fn try_parse_structured(bytes: &[u8]) -> Option<Value> {
    serde_json::from_slice(bytes).ok()
}

impl ResponsePayload {
    pub fn from_bytes(bytes: Bytes) -> Self {
        match try_parse_structured(&bytes) {
            Some(value) => ResponsePayload::Structured(value),
            None => ResponsePayload::Opaque(bytes),
        }
    }
}

/// Build the gateway response from the backend's status, headers and body.
pub fn translate_response(status: StatusCode, backend_headers: &HeaderMap, body: Bytes) -> Response<Body> {
    let payload = ResponsePayload::from_bytes(body);

    let mut response = match payload {
        ResponsePayload::Structured(value) => {
            // Value serialization only fails for non-string map keys, which
            // a parsed Value cannot contain.
            let encoded = serde_json::to_vec(&value).unwrap_or_default();
            let mut response = Response::new(Body::from(encoded));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            response
        }
        ResponsePayload::Opaque(bytes) => Response::new(Body::from(bytes)),
    };

    *response.status_mut() = status;
    copy_response_headers(backend_headers, response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_bytes(response: Response<Body>) -> Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    #[test]
    fn test_try_parse_structured() {
        assert_eq!(
            try_parse_structured(br#"{"ok":true}"#),
            Some(serde_json::json!({ "ok": true }))
        );
        assert_eq!(try_parse_structured(b"[1,2]"), Some(serde_json::json!([1, 2])));
        assert_eq!(try_parse_structured(b"42"), Some(serde_json::json!(42)));
        assert_eq!(try_parse_structured(b"\"hi\""), Some(serde_json::json!("hi")));
        assert_eq!(try_parse_structured(b"null"), Some(Value::Null));
        assert_eq!(try_parse_structured(b""), None);
        assert_eq!(try_parse_structured(b"event: message\ndata: {}\n\n"), None);
        assert_eq!(try_parse_structured(b"{\"truncated\":"), None);
    }

    #[test]
    fn test_payload_selection() {
        assert_eq!(
            ResponsePayload::from_bytes(Bytes::from_static(b"{}")),
            ResponsePayload::Structured(serde_json::json!({}))
        );
        assert_eq!(
            ResponsePayload::from_bytes(Bytes::from_static(b"plain")),
            ResponsePayload::Opaque(Bytes::from_static(b"plain"))
        );
    }

    #[tokio::test]
    async fn test_structured_response() {
        let mut backend = HeaderMap::new();
        backend.insert("x-request-id", HeaderValue::from_static("r-1"));
        backend.insert(header::CONTENT_LENGTH, HeaderValue::from_static("40"));

        let response = translate_response(
            StatusCode::CREATED,
            &backend,
            Bytes::from_static(b"{ \"id\" : 7,\n \"name\": \"doc\" }"),
        );

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()["x-request-id"], "r-1");
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());

        let value: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(value, serde_json::json!({ "id": 7, "name": "doc" }));
    }

    #[tokio::test]
    async fn test_opaque_response_is_byte_for_byte() {
        let raw: &'static [u8] = b"event: message\r\ndata: {\"x\":1}\r\n\r\n\xff";
        let mut backend = HeaderMap::new();
        backend.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));

        let response =
            translate_response(StatusCode::OK, &backend, Bytes::from_static(raw));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(body_bytes(response).await.as_ref(), raw);
    }

    #[tokio::test]
    async fn test_error_status_preserved() {
        let response = translate_response(
            StatusCode::NOT_FOUND,
            &HeaderMap::new(),
            Bytes::from_static(b"not here"),
        );
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_bytes(response).await.as_ref(), b"not here");
    }

    #[tokio::test]
    async fn test_backend_content_type_wins() {
        let mut backend = HeaderMap::new();
        backend.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/vnd.api+json"),
        );
        let response = translate_response(StatusCode::OK, &backend, Bytes::from_static(b"{}"));
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/vnd.api+json"
        );
    }
}
