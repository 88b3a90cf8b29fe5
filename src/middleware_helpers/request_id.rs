use crate::tracing::{scope_request_id, RequestId};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const HEADER: HeaderName = HeaderName::from_static(REQUEST_ID_HEADER);

/// Caller-supplied id when it is printable, a fresh uuid otherwise.
fn incoming_or_new(headers: &HeaderMap) -> (RequestId, HeaderValue) {
    if let Some(value) = headers.get(&HEADER) {
        if let Ok(text) = value.to_str() {
            return (RequestId::new(text), value.clone());
        }
    }
    let fresh = RequestId::default();
    let value = HeaderValue::from_str(fresh.as_str())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
    (fresh, value)
}

/// Tags the request and its response with `x-request-id` and makes the id
/// visible to error bodies for the lifetime of the handler.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let (id, value) = incoming_or_new(request.headers());
    request.headers_mut().insert(HEADER, value.clone());
    request.extensions_mut().insert(id.clone());

    let mut response = scope_request_id(id, next.run(request)).await;
    response.headers_mut().insert(HEADER, value);
    response
}
