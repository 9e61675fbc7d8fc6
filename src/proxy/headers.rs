//! Header handling for both directions of the proxy hop

use axum::http::header::{self, HeaderMap, HeaderValue};

/// Media types the gateway accepts from the backend
pub const ACCEPT_STRUCTURED_OR_STREAM: &str = "application/json, text/event-stream";

/// Build the outbound header set from the inbound one.
///
/// Everything except `host` is copied, keeping repeated headers as separate
/// values. `Accept` is then forced so the backend may answer with either JSON
/// or an event stream.
pub fn outbound_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 1);
    for (name, value) in inbound.iter() {
        if name != header::HOST {
            headers.append(name.clone(), value.clone());
        }
    }
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(ACCEPT_STRUCTURED_OR_STREAM),
    );
    headers
}

/// Remove headers describing a request body that is not being sent
pub fn strip_body_framing(headers: &mut HeaderMap) {
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::TRANSFER_ENCODING);
}

/// Headers the server recomputes for the re-encoded response body
fn is_framing_header(name: &header::HeaderName) -> bool {
    name == header::CONTENT_LENGTH || name == header::TRANSFER_ENCODING || name == header::CONNECTION
}

/// Copy backend response headers onto the gateway response.
///
/// Each backend header replaces any header of the same name already present;
/// repeated backend headers such as `set-cookie` keep all their values.
pub fn copy_response_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for name in from.keys() {
        if is_framing_header(name) {
            continue;
        }
        to.remove(name);
        for value in from.get_all(name) {
            to.append(name.clone(), value.clone());
        }
    }
}
